use chrono::{SecondsFormat, Utc};
use serde_json::{Map, Value};
use tracing::field::{Field, Visit};
use tracing::Event;

use crate::level::LogLevel;
use crate::translate::{LEVEL_KEY, MESSAGE_KEY};

/// Layout of the JSON records handed to the sink.
///
/// The message always lands at [`MESSAGE_KEY`] and the severity, rendered
/// with the remote vocabulary, at [`LEVEL_KEY`]. The remaining keys are
/// optional metadata; `None` omits the key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncoderConfig {
    /// RFC 3339 UTC timestamp of the event.
    pub time_key: Option<String>,
    /// The event's `tracing` target.
    pub target_key: Option<String>,
    /// `file:line` of the callsite, when known.
    pub caller_key: Option<String>,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            time_key: Some("ts".to_string()),
            target_key: Some("logger".to_string()),
            caller_key: Some("caller".to_string()),
        }
    }
}

impl EncoderConfig {
    /// Encode one event as a JSON object.
    ///
    /// `static_fields` are written first, so event fields with the same
    /// name win. The reserved keys are written last and always win.
    pub fn encode(
        &self,
        event: &Event<'_>,
        level: LogLevel,
        static_fields: &Map<String, Value>,
    ) -> Result<Vec<u8>, serde_json::Error> {
        let meta = event.metadata();
        let mut object = static_fields.clone();

        if let Some(key) = &self.time_key {
            let now = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
            object.insert(key.clone(), Value::String(now));
        }
        if let Some(key) = &self.target_key {
            object.insert(key.clone(), Value::String(meta.target().to_string()));
        }
        if let (Some(key), Some(file)) = (&self.caller_key, meta.file()) {
            let caller = match meta.line() {
                Some(line) => format!("{file}:{line}"),
                None => file.to_string(),
            };
            object.insert(key.clone(), Value::String(caller));
        }

        let mut message = None;
        event.record(&mut FieldVisitor {
            fields: &mut object,
            message: &mut message,
        });

        object.insert(MESSAGE_KEY.to_string(), Value::String(message.unwrap_or_default()));
        object.insert(
            LEVEL_KEY.to_string(),
            Value::String(level.severity().as_str().to_string()),
        );

        serde_json::to_vec(&Value::Object(object))
    }
}

/// Collects event fields into a JSON map, pulling out `message`.
pub struct FieldVisitor<'a> {
    pub fields: &'a mut Map<String, Value>,
    pub message: &'a mut Option<String>,
}

impl<'a> Visit for FieldVisitor<'a> {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            *self.message = Some(value.to_string());
        } else {
            self.fields
                .insert(field.name().to_string(), Value::String(value.to_string()));
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.fields.insert(field.name().to_string(), Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.fields.insert(field.name().to_string(), Value::from(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.fields.insert(field.name().to_string(), Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.fields.insert(field.name().to_string(), Value::from(value));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        // `info!("...")` records the formatted message through here.
        if field.name() == "message" {
            *self.message = Some(format!("{:?}", value));
        } else {
            self.fields
                .insert(field.name().to_string(), Value::String(format!("{:?}", value)));
        }
    }
}
