//! Checksummed on-disk envelope for model artifacts
//!
//! Every artifact is wrapped with magic bytes, a format version and an
//! FNV-1a checksum of the encoded payload so a truncated or foreign file is
//! rejected before the model is decoded.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use crate::error::{Result, SpendingError};

/// Serialization format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SerializationFormat {
    /// Binary format using bincode (efficient)
    #[default]
    Binary,
    /// JSON format (portable, human-readable)
    Json,
}

impl SerializationFormat {
    /// File extension for this format
    pub fn extension(&self) -> &'static str {
        match self {
            SerializationFormat::Binary => "bin",
            SerializationFormat::Json => "json",
        }
    }

    /// Format implied by a file's extension
    pub fn from_path(path: &Path) -> Result<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("bin") => Ok(SerializationFormat::Binary),
            Some("json") => Ok(SerializationFormat::Json),
            other => Err(SpendingError::Persistence(format!(
                "unrecognised artifact extension {:?} for {}",
                other,
                path.display()
            ))),
        }
    }
}

impl fmt::Display for SerializationFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Model metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    /// Model identifier, e.g. `RandomForest`
    pub identifier: String,
    /// Version of the crate that wrote the artifact
    pub version: String,
    /// Training timestamp (UTC)
    pub trained_at: chrono::DateTime<chrono::Utc>,
    /// Feature names, in the column order the model expects
    pub feature_names: Vec<String>,
    /// Target name
    pub target_name: String,
    /// Hyperparameters
    pub hyperparameters: BTreeMap<String, String>,
    /// Hold-out metrics
    pub metrics: BTreeMap<String, f64>,
}

impl ModelMetadata {
    /// Create new metadata stamped with the current time
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            trained_at: chrono::Utc::now(),
            feature_names: Vec::new(),
            target_name: String::new(),
            hyperparameters: BTreeMap::new(),
            metrics: BTreeMap::new(),
        }
    }

    /// Set feature names
    pub fn with_features(mut self, features: Vec<String>) -> Self {
        self.feature_names = features;
        self
    }

    /// Set target name
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target_name = target.into();
        self
    }

    /// Set hyperparameters
    pub fn with_hyperparameters(mut self, params: BTreeMap<String, String>) -> Self {
        self.hyperparameters = params;
        self
    }

    /// Add metric
    pub fn add_metric(mut self, key: impl Into<String>, value: f64) -> Self {
        self.metrics.insert(key.into(), value);
        self
    }
}

/// Wrapper written to disk around the encoded artifact
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Envelope<P> {
    magic: [u8; 4],
    format_version: u32,
    checksum: u64,
    payload: P,
}

const MAGIC: [u8; 4] = *b"SPTM";
const FORMAT_VERSION: u32 = 1;

/// FNV-1a over the payload bytes
fn compute_checksum(data: &[u8]) -> u64 {
    const FNV_OFFSET: u64 = 14695981039346656037;
    const FNV_PRIME: u64 = 1099511628211;

    data.iter().fold(FNV_OFFSET, |hash, byte| {
        (hash ^ *byte as u64).wrapping_mul(FNV_PRIME)
    })
}

/// Encode `value` in an envelope. Nothing touches the filesystem.
pub fn encode<T: Serialize>(value: &T, format: SerializationFormat) -> Result<Vec<u8>> {
    let fail = |e: &dyn fmt::Display| SpendingError::Persistence(format!("failed to serialize: {}", e));

    match format {
        SerializationFormat::Binary => {
            let payload = bincode::serialize(value).map_err(|e| fail(&e))?;
            let envelope = Envelope {
                magic: MAGIC,
                format_version: FORMAT_VERSION,
                checksum: compute_checksum(&payload),
                payload,
            };
            bincode::serialize(&envelope).map_err(|e| fail(&e))
        }
        SerializationFormat::Json => {
            let payload = serde_json::to_value(value).map_err(|e| fail(&e))?;
            let canonical = serde_json::to_vec(&payload).map_err(|e| fail(&e))?;
            let envelope = Envelope {
                magic: MAGIC,
                format_version: FORMAT_VERSION,
                checksum: compute_checksum(&canonical),
                payload,
            };
            serde_json::to_vec_pretty(&envelope).map_err(|e| fail(&e))
        }
    }
}

fn check_header(magic: [u8; 4], format_version: u32, checksum: u64, payload: &[u8]) -> Result<()> {
    if magic != MAGIC {
        return Err(SpendingError::Persistence("not a model artifact (bad magic bytes)".to_string()));
    }
    if format_version != FORMAT_VERSION {
        return Err(SpendingError::Persistence(format!(
            "unsupported artifact format version {} (expected {})",
            format_version, FORMAT_VERSION
        )));
    }
    if compute_checksum(payload) != checksum {
        return Err(SpendingError::Persistence(
            "checksum verification failed - file may be corrupted".to_string(),
        ));
    }
    Ok(())
}

/// Decode bytes produced by [`encode`], verifying magic, version and checksum
pub fn decode<T: DeserializeOwned>(bytes: &[u8], format: SerializationFormat) -> Result<T> {
    let fail = |e: &dyn fmt::Display| SpendingError::Persistence(format!("failed to deserialize: {}", e));

    match format {
        SerializationFormat::Binary => {
            let envelope: Envelope<Vec<u8>> = bincode::deserialize(bytes).map_err(|e| fail(&e))?;
            check_header(envelope.magic, envelope.format_version, envelope.checksum, &envelope.payload)?;
            bincode::deserialize(&envelope.payload).map_err(|e| fail(&e))
        }
        SerializationFormat::Json => {
            let envelope: Envelope<serde_json::Value> = serde_json::from_slice(bytes).map_err(|e| fail(&e))?;
            let canonical = serde_json::to_vec(&envelope.payload).map_err(|e| fail(&e))?;
            check_header(envelope.magic, envelope.format_version, envelope.checksum, &canonical)?;
            serde_json::from_value(envelope.payload).map_err(|e| fail(&e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
    struct TestModel {
        weights: Vec<f64>,
        bias: f64,
    }

    fn model() -> TestModel {
        TestModel {
            weights: vec![1.0, 2.0, 3.0],
            bias: 0.5,
        }
    }

    #[test]
    fn test_binary_envelope() {
        let bytes = encode(&model(), SerializationFormat::Binary).unwrap();
        let restored: TestModel = decode(&bytes, SerializationFormat::Binary).unwrap();
        assert_eq!(restored, model());
    }

    #[test]
    fn test_json_envelope_is_readable() {
        let bytes = encode(&model(), SerializationFormat::Json).unwrap();
        let text = String::from_utf8(bytes.clone()).unwrap();
        assert!(text.contains("\"bias\": 0.5"));
        let restored: TestModel = decode(&bytes, SerializationFormat::Json).unwrap();
        assert_eq!(restored, model());
    }

    #[test]
    fn test_corrupted_payload_rejected() {
        let mut bytes = encode(&model(), SerializationFormat::Binary).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xFF;
        let err = decode::<TestModel>(&bytes, SerializationFormat::Binary).unwrap_err();
        assert!(err.to_string().contains("checksum"), "{}", err);
    }

    #[test]
    fn test_tampered_json_rejected() {
        let bytes = encode(&model(), SerializationFormat::Json).unwrap();
        let text = String::from_utf8(bytes).unwrap().replace("0.5", "0.75");
        assert!(decode::<TestModel>(text.as_bytes(), SerializationFormat::Json).is_err());
    }

    #[test]
    fn test_bad_magic_rejected() {
        let envelope = Envelope {
            magic: *b"KOLM",
            format_version: FORMAT_VERSION,
            checksum: compute_checksum(&[]),
            payload: Vec::<u8>::new(),
        };
        let bytes = bincode::serialize(&envelope).unwrap();
        let err = decode::<TestModel>(&bytes, SerializationFormat::Binary).unwrap_err();
        assert!(err.to_string().contains("magic"));
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(SerializationFormat::from_path(Path::new("a/RandomForest_best_model.bin")).unwrap(), SerializationFormat::Binary);
        assert_eq!(SerializationFormat::from_path(Path::new("m.json")).unwrap(), SerializationFormat::Json);
        assert!(SerializationFormat::from_path(Path::new("m.pkl")).is_err());
    }

    #[test]
    fn test_fnv_checksum() {
        assert_eq!(compute_checksum(&[]), 14695981039346656037);
        assert_ne!(compute_checksum(b"abc"), compute_checksum(b"abd"));
    }
}
