//! Human-readable error descriptions and structured JSON error formatting.

use vitals_core::error::{BuildError, VitalsError};

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    // Typed matches first
    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::NoReaders => {
                "What happened: The node has no sensors attached.\nLikely causes: Every reader failed to initialize or none was wired into the builder.\nHow to fix: Attach at least one reader (motion_reader, ppg_reader, ...) before build().".to_string()
            }
            BuildError::InvalidSampleRate(hz) => format!(
                "What happened: Invalid sample rate ({hz} Hz).\nLikely causes: sampling.motion_hz is zero or not a number.\nHow to fix: Set [sampling] rates to positive values in the config."
            ),
            BuildError::InvalidConfig(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Missing or out-of-range values in the TOML.\nHow to fix: Edit the config file, then rerun. `vitals self-check` validates it."
            ),
        };
    }

    if let Some(ve) = err.downcast_ref::<VitalsError>() {
        return match ve {
            VitalsError::Timeout => "What happened: Sensor read timed out.\nLikely causes: Sensor not powered, bus wiring loose, or timeout too low.\nHow to fix: Check the sensor connection and consider increasing sampling.sensor_timeout_ms or retry.max_attempts.".to_string(),
            VitalsError::HardwareFault(msg) | VitalsError::Hardware(msg) => format!(
                "What happened: Sensor reported a fault ({msg}).\nLikely causes: Bus arbitration errors, a disconnected part, or a failing sensor.\nHow to fix: Reseat the sensor, then rerun `vitals self-check`."
            ),
            VitalsError::Config(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Out-of-range values in the TOML.\nHow to fix: Edit the config file, then rerun."
            ),
        };
    }

    if let Some(te) = err.downcast_ref::<toml::de::Error>() {
        return format!(
            "What happened: The config file is not valid TOML for this schema.\nLikely causes: A typo in a key, a wrong value type, or a missing quote.\nHow to fix: Fix the reported location and rerun. Parser said: {}",
            te.message()
        );
    }

    // String-based heuristics for errors coming from config validation or CSV loading
    let msg = err.to_string();
    let lower = msg.to_ascii_lowercase();

    if lower.contains("read config") {
        return format!(
            "What happened: Could not read the config file.\nLikely causes: Wrong --config path or missing permissions.\nHow to fix: Pass --config <FILE> pointing to a readable TOML file. Original: {msg}"
        );
    }

    if lower.contains(" must be ") || lower.contains(" must not ") || lower.contains(" must cover ") {
        return format!(
            "What happened: Configuration is invalid ({msg}).\nLikely causes: An out-of-range value in the TOML.\nHow to fix: Edit the named key and try again."
        );
    }

    if lower.contains("recording csv must have headers") {
        return format!("Invalid headers in recording CSV. {msg}");
    }

    if lower.contains("recording csv") || lower.contains("csv row") || lower.contains("timestamps") {
        return format!(
            "What happened: The recording could not be loaded ({msg}).\nLikely causes: Wrong file, unparsable numbers, or rows out of time order.\nHow to fix: Check the CSV against the expected headers and ordering."
        );
    }

    // Generic fallback
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Stable exit codes per error family; usage errors keep clap's 2.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    if err.downcast_ref::<BuildError>().is_some() || err.downcast_ref::<toml::de::Error>().is_some()
    {
        return 3;
    }
    match err.downcast_ref::<VitalsError>() {
        Some(VitalsError::Config(_)) => 3,
        Some(VitalsError::Timeout) => 4,
        Some(VitalsError::Hardware(_) | VitalsError::HardwareFault(_)) => 5,
        None => 1,
    }
}

fn reason_name(err: &eyre::Report) -> &'static str {
    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::NoReaders => "NoReaders",
            BuildError::InvalidSampleRate(_) => "InvalidSampleRate",
            BuildError::InvalidConfig(_) => "InvalidConfig",
        };
    }
    match err.downcast_ref::<VitalsError>() {
        Some(VitalsError::Timeout) => "Timeout",
        Some(VitalsError::Hardware(_)) => "Hardware",
        Some(VitalsError::HardwareFault(_)) => "HardwareFault",
        Some(VitalsError::Config(_)) => "Config",
        None => "Error",
    }
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    use serde_json::json;

    json!({
        "type": "error",
        "reason": reason_name(err),
        "exit_code": exit_code_for_error(err),
        "message": humanize(err),
    })
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_has_fix_hint() {
        let err = eyre::Report::new(VitalsError::Timeout);
        let text = humanize(&err);
        assert!(text.starts_with("What happened: Sensor read timed out"));
        assert_eq!(exit_code_for_error(&err), 4);
    }

    #[test]
    fn validation_message_is_recognized() {
        let err = eyre::eyre!("retry.max_attempts must be >= 1");
        assert!(humanize(&err).contains("Configuration is invalid"));
        assert_eq!(exit_code_for_error(&err), 1);
    }

    #[test]
    fn json_error_carries_reason() {
        let err = eyre::Report::new(BuildError::NoReaders);
        let v: serde_json::Value = serde_json::from_str(&format_error_json(&err)).unwrap();
        assert_eq!(v["reason"], "NoReaders");
        assert_eq!(v["exit_code"], 3);
    }

    #[test]
    fn untyped_errors_fall_back_to_generic_reason() {
        let err = eyre::eyre!("sensor node stalled");
        let v: serde_json::Value = serde_json::from_str(&format_error_json(&err)).unwrap();
        assert_eq!(v["reason"], "Error");
        assert_eq!(v["exit_code"], 1);
        assert!(humanize(&err).starts_with("Something went wrong."));
    }
}
