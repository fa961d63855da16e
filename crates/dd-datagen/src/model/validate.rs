use super::CategoryModel;

/// Walk the whole tree; the error string names the offending path, e.g.
/// `apps[1].oses[0].versions`.
pub(super) fn validate_model(model: &CategoryModel) -> Result<(), String> {
    check_list("apps", model.apps.iter().map(|a| (a.name.as_str(), a.weight)))?;

    for (i, app) in model.apps.iter().enumerate() {
        let path = format!("apps[{i}]");

        check_list(
            &format!("{path}.event_types"),
            app.event_types.iter().map(|e| (e.name.as_str(), e.weight)),
        )?;
        for (j, et) in app.event_types.iter().enumerate() {
            let latency = et.latency;
            if !latency.mean.is_finite() || latency.mean < 0.0 {
                return Err(format!(
                    "{path}.event_types[{j}].latency.mean must be finite and >= 0, got {}",
                    latency.mean
                ));
            }
            if !latency.stddev.is_finite() || latency.stddev < 0.0 {
                return Err(format!(
                    "{path}.event_types[{j}].latency.stddev must be finite and >= 0, got {}",
                    latency.stddev
                ));
            }
        }

        check_list(
            &format!("{path}.oses"),
            app.oses.iter().map(|o| (o.name.as_str(), o.weight)),
        )?;
        for (k, os) in app.oses.iter().enumerate() {
            check_list(
                &format!("{path}.oses[{k}].versions"),
                os.versions.iter().map(|v| (v.name.as_str(), v.weight)),
            )?;
        }
    }

    Ok(())
}

fn check_list<'a>(path: &str, entries: impl Iterator<Item = (&'a str, f64)>) -> Result<(), String> {
    let mut len = 0;
    let mut total = 0.0;
    for (idx, (name, weight)) in entries.enumerate() {
        if name.trim().is_empty() {
            return Err(format!("{path}[{idx}] has an empty name"));
        }
        if !weight.is_finite() || weight < 0.0 {
            return Err(format!(
                "{path}[{idx}] ({name:?}) weight must be finite and >= 0, got {weight}"
            ));
        }
        total += weight;
        len += 1;
    }
    if len == 0 {
        return Err(format!("{path} must not be empty"));
    }
    if total <= 0.0 {
        return Err(format!("{path} weights must sum to > 0"));
    }
    Ok(())
}
