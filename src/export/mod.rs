//! Model persistence
//!
//! The selected model is written together with its metadata and the fitted
//! scaler as `<identifier>_best_model.<ext>`:
//! - Binary (`bin`, bincode): compact, the default
//! - JSON (`json`): portable, human-readable

mod artifact;
mod serializer;

pub use artifact::{artifact_path, load_model, save_model, ModelArtifact};
pub use serializer::{decode, encode, ModelMetadata, SerializationFormat};
