//! Serialisable adapter configuration.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::protocol::{ChannelMode, ClassId};

/// Opaque description of the wrapped detector.
///
/// Only identifies the detector; it carries nothing that could rebuild it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectorRef {
    pub id: String,
    pub type_name: String,
}

/// Configuration of a `DetectorAdapter`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdapterConfig {
    pub detector: DetectorRef,
    pub ids: Vec<ClassId>,
    /// Display names aligned with `ids`. When empty, names are resolved from
    /// the detector's metadata.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub class_names: Vec<String>,
    pub img_batch_size: usize,
    #[serde(default)]
    pub channel_mode: ChannelMode,
}

impl AdapterConfig {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AdapterError;

    #[test]
    fn test_defaults_when_fields_missing() {
        let config = AdapterConfig::from_json(
            r#"{"detector":{"id":"mock","type_name":"Mock"},"ids":[0,1,2],"img_batch_size":4}"#,
        )
        .unwrap();

        assert_eq!(config.ids, vec![0, 1, 2]);
        assert!(config.class_names.is_empty());
        assert_eq!(config.channel_mode, ChannelMode::Rgb);
    }

    #[test]
    fn test_json_round_trip() {
        let config = AdapterConfig {
            detector: DetectorRef {
                id: "mock".to_string(),
                type_name: "Mock".to_string(),
            },
            ids: vec![0, 2],
            class_names: vec!["A".to_string(), "C".to_string()],
            img_batch_size: 2,
            channel_mode: ChannelMode::Passthrough,
        };

        let json = config.to_json().unwrap();
        assert!(json.contains(r#""channel_mode":"passthrough""#));
        assert_eq!(AdapterConfig::from_json(&json).unwrap(), config);
    }

    #[test]
    fn test_invalid_json() {
        let err = AdapterConfig::from_json("{").unwrap_err();
        assert!(matches!(err, AdapterError::Serialization(_)));
    }
}
