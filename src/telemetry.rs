use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

use crate::level::SeverityLevel;

/// A trace event bound for the ingestion service.
#[derive(Debug, Clone, PartialEq)]
pub struct TraceTelemetry {
    pub message: String,
    pub severity: SeverityLevel,
    /// Custom dimensions. Values are always strings.
    pub properties: HashMap<String, String>,
    pub timestamp: DateTime<Utc>,
}

impl TraceTelemetry {
    pub fn new(message: impl Into<String>, severity: SeverityLevel) -> Self {
        TraceTelemetry {
            message: message.into(),
            severity,
            properties: HashMap::new(),
            timestamp: Utc::now(),
        }
    }
}

/// Wire envelope wrapping one telemetry item.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    pub name: String,
    pub time: String,
    pub i_key: String,
    pub tags: BTreeMap<String, String>,
    pub data: Data,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Data {
    pub base_type: String,
    pub base_data: MessageData,
}

/// Printf-like trace statement as understood by the service.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageData {
    pub ver: i32,
    pub message: String,
    pub severity_level: SeverityLevel,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, String>,
}

impl Envelope {
    /// Wrap a trace for the resource identified by `instrumentation_key`.
    pub fn from_trace(trace: TraceTelemetry, instrumentation_key: &str) -> Self {
        let key = instrumentation_key.replace('-', "");
        let name = if key.is_empty() {
            "Microsoft.ApplicationInsights.Message".to_string()
        } else {
            format!("Microsoft.ApplicationInsights.{key}.Message")
        };

        Envelope {
            name,
            time: trace.timestamp.to_rfc3339_opts(SecondsFormat::Micros, true),
            i_key: instrumentation_key.to_string(),
            tags: BTreeMap::new(),
            data: Data {
                base_type: "MessageData".to_string(),
                base_data: MessageData {
                    ver: 2,
                    message: trace.message,
                    severity_level: trace.severity,
                    properties: trace.properties.into_iter().collect(),
                },
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_serializes_with_service_field_names() {
        let mut trace = TraceTelemetry::new("disk almost full", SeverityLevel::Warning);
        trace.properties.insert("host".into(), "db-1".into());

        let envelope = Envelope::from_trace(trace, "0000-1111");
        let json = serde_json::to_value(&envelope).unwrap();

        assert_eq!(json["name"], "Microsoft.ApplicationInsights.00001111.Message");
        assert_eq!(json["iKey"], "0000-1111");
        assert_eq!(json["data"]["baseType"], "MessageData");
        assert_eq!(json["data"]["baseData"]["ver"], 2);
        assert_eq!(json["data"]["baseData"]["message"], "disk almost full");
        assert_eq!(json["data"]["baseData"]["severityLevel"], "Warning");
        assert_eq!(json["data"]["baseData"]["properties"]["host"], "db-1");
    }

    #[test]
    fn empty_properties_are_omitted() {
        let envelope = Envelope::from_trace(TraceTelemetry::new("x", SeverityLevel::Verbose), "k");
        let json = serde_json::to_value(&envelope).unwrap();
        assert!(json["data"]["baseData"].get("properties").is_none());
    }
}
