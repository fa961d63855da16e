/// Logging macros that stamp every event with a `domain` field.
///
/// Domains used by this crate:
///
/// | domain | covers                                  |
/// |--------|-----------------------------------------|
/// | `sys`  | process start/stop, run summary         |
/// | `conf` | configuration and category model checks |
/// | `gen`  | task planning and record generation     |
/// | `io`   | archive open/write/read                 |
///
/// ```ignore
/// dd_info!(gen, path = %task.path.display(), messages = task.messages, "writing archive");
/// dd_error!(io, error = %e, "archive write failed");
/// ```

#[doc(hidden)]
macro_rules! dd_log {
    ($level:ident, $domain:ident, $($field:tt)*) => {
        tracing::$level!(domain = stringify!($domain), $($field)*)
    };
}

macro_rules! dd_error {
    ($domain:ident, $($rest:tt)*) => {
        dd_log!(error, $domain, $($rest)*)
    };
}

macro_rules! dd_warn {
    ($domain:ident, $($rest:tt)*) => {
        dd_log!(warn, $domain, $($rest)*)
    };
}

macro_rules! dd_info {
    ($domain:ident, $($rest:tt)*) => {
        dd_log!(info, $domain, $($rest)*)
    };
}

macro_rules! dd_debug {
    ($domain:ident, $($rest:tt)*) => {
        dd_log!(debug, $domain, $($rest)*)
    };
}

#[allow(unused_macros)]
macro_rules! dd_trace {
    ($domain:ident, $($rest:tt)*) => {
        dd_log!(trace, $domain, $($rest)*)
    };
}
