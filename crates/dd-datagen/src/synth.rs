use chrono::{DateTime, SubsecRound, TimeDelta, Utc};
use rand::Rng;
use rand::distr::Alphanumeric;
use serde::{Serialize, Serializer};

use crate::model::CategoryModel;
use crate::sampler::{SampleError, bounded_gaussian, pick};

pub const MESSAGE_ID_LEN: usize = 20;

/// Second-precision UTC, e.g. `2024-03-01T12:00:05Z`.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

// ---------------------------------------------------------------------------
// TimeWindow
// ---------------------------------------------------------------------------

/// The `[start, end]` interval event timestamps are drawn from.
///
/// Built once per task so `end` does not drift while a long archive is
/// being written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TimeWindow {
    /// Window of width `lookback` ending at `end`.
    pub fn ending_at(end: DateTime<Utc>, lookback: TimeDelta) -> Self {
        let start = end
            .checked_sub_signed(lookback)
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        Self { start, end }
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// Uniform instant in the window, truncated to whole seconds.
    pub fn sample<R: Rng>(&self, rng: &mut R) -> DateTime<Utc> {
        let span_secs = (self.end - self.start).num_seconds();
        if span_secs <= 0 {
            return self.start.trunc_subsecs(0);
        }
        let offset = rng.random_range(0.0..span_secs as f64);
        let offset = TimeDelta::microseconds((offset * 1_000_000.0) as i64);
        (self.start + offset).trunc_subsecs(0)
    }
}

// ---------------------------------------------------------------------------
// SyntheticEvent
// ---------------------------------------------------------------------------

/// One generated record. Names borrow from the [`CategoryModel`].
///
/// Serializes with a fixed key order:
/// `app, context{os, version}, latency, messageId, timestamp, type`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyntheticEvent<'a> {
    pub app: &'a str,
    pub context: EventContext<'a>,
    pub latency: f64,
    #[serde(rename = "messageId")]
    pub message_id: String,
    #[serde(serialize_with = "serialize_timestamp")]
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    pub event_type: &'a str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventContext<'a> {
    pub os: &'a str,
    pub version: &'a str,
}

fn serialize_timestamp<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(&ts.format(TIMESTAMP_FORMAT))
}

/// Draw one event by walking the model.
///
/// The app is picked first; the event type and the OS (then its version) are
/// picked independently of each other from that app's lists.
pub fn synthesize<'m, R: Rng>(
    model: &'m CategoryModel,
    window: &TimeWindow,
    rng: &mut R,
) -> Result<SyntheticEvent<'m>, SampleError> {
    let app = pick(&model.apps, rng)?;
    let event_type = pick(&app.event_types, rng)?;
    let os = pick(&app.oses, rng)?;
    let version = pick(&os.versions, rng)?;

    let latency = bounded_gaussian(event_type.latency.mean, event_type.latency.stddev, rng)?;

    Ok(SyntheticEvent {
        app: &app.name,
        context: EventContext {
            os: &os.name,
            version: &version.name,
        },
        latency,
        message_id: message_id(rng),
        timestamp: window.sample(rng),
        event_type: &event_type.name,
    })
}

/// `MESSAGE_ID_LEN` characters drawn uniformly from `[A-Za-z0-9]`.
/// Uniqueness is not checked.
pub fn message_id<R: Rng>(rng: &mut R) -> String {
    (0..MESSAGE_ID_LEN)
        .map(|_| char::from(rng.sample(Alphanumeric)))
        .collect()
}
