use crate::level::SeverityLevel;
use crate::record::{FieldValue, LogRecord};
use crate::sink::SinkError;
use crate::telemetry::TraceTelemetry;

/// Reserved key carrying the log message.
pub const MESSAGE_KEY: &str = "msg";
/// Reserved key carrying the rendered severity.
pub const LEVEL_KEY: &str = "level";

/// Translate a decoded record into a [`TraceTelemetry`].
///
/// `msg` must be a string. `level` is looked up in the wire vocabulary;
/// unknown or missing names become [`SeverityLevel::Verbose`]. Every other
/// key is copied into the property map: strings as-is, integers in
/// decimal, floats with six decimals. Values of any other type are
/// dropped.
pub fn build_trace(record: &LogRecord) -> Result<TraceTelemetry, SinkError> {
    let message = record.get_str(MESSAGE_KEY).ok_or(SinkError::MissingMessage)?;
    let severity = SeverityLevel::from_wire_or_default(record.get_str(LEVEL_KEY));

    let mut trace = TraceTelemetry::new(message, severity);
    for (key, value) in &record.fields {
        if key == MESSAGE_KEY || key == LEVEL_KEY {
            continue;
        }
        if let Some(rendered) = render_property(value) {
            trace.properties.insert(key.clone(), rendered);
        }
    }

    Ok(trace)
}

/// The service only indexes string-valued custom dimensions.
fn render_property(value: &FieldValue) -> Option<String> {
    match value {
        FieldValue::Integer(i) => Some(i.to_string()),
        FieldValue::Float(f) => Some(format!("{f:.6}")),
        FieldValue::String(s) => Some(s.clone()),
        FieldValue::Other(_) => None,
    }
}
