//! Durable persistence for trained models and their fitted pipelines.
//!
//! An [`Artifact`] bundles everything prediction needs — input schema,
//! fitted pipeline, trained model, trainer configuration — into a single
//! opaque file. The file is framed with a magic number, format version,
//! payload length and CRC32 so an unreadable or incompatible file surfaces
//! as `CorruptArtifact` instead of a decode panic. Saves go through a
//! same-directory temp file followed by a rename, so readers never observe
//! a partially written artifact.

use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::backend::TrainedModel;
use crate::error::{HarrierError, Result};
use crate::pipeline::FittedPipeline;
use crate::schema::Schema;
use crate::trainer::TrainerConfig;

/// Artifact file magic number.
const MAGIC: &[u8; 4] = b"HARR";
/// Current artifact format version.
const FORMAT_VERSION: u32 = 1;

/// Descriptive metadata recorded alongside the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    /// Backend that trained the model.
    pub backend: String,
    /// When the artifact was created.
    pub created_at: DateTime<Utc>,
    /// Rows the model was trained on.
    pub training_rows: usize,
}

/// The persisted form of a trained model and its fitted pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    /// Descriptive metadata.
    pub metadata: ArtifactMetadata,
    /// Pre-pipeline input schema, used to coerce serving-time inputs.
    pub schema: Schema,
    /// Trainer configuration (feature/label columns, task kind).
    pub trainer: TrainerConfig,
    /// The fitted pipeline.
    pub pipeline: FittedPipeline,
    /// The backend-trained model.
    pub model: TrainedModel,
}

impl Artifact {
    /// Save this artifact to a file, atomically.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let payload = bincode::serialize(self)
            .map_err(|e| HarrierError::other(format!("failed to encode artifact: {e}")))?;
        let checksum = crc32fast::hash(&payload);

        let temp_path = path.with_extension("tmp");
        {
            let mut file = File::create(&temp_path)?;
            file.write_all(MAGIC)?;
            file.write_u32::<LittleEndian>(FORMAT_VERSION)?;
            file.write_u64::<LittleEndian>(payload.len() as u64)?;
            file.write_u32::<LittleEndian>(checksum)?;
            file.write_all(&payload)?;
            file.sync_all()?;
        }
        fs::rename(&temp_path, path)?;

        info!(path = %path.display(), bytes = payload.len(), "artifact saved");
        Ok(())
    }

    /// Load an artifact from a file, verifying framing and checksum.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut file = File::open(path)
            .map_err(|e| HarrierError::corrupt_artifact(path, format!("cannot open: {e}")))?;

        let mut magic = [0u8; 4];
        file.read_exact(&mut magic)
            .map_err(|_| HarrierError::corrupt_artifact(path, "file too short"))?;
        if &magic != MAGIC {
            return Err(HarrierError::corrupt_artifact(path, "bad magic number"));
        }

        let version = file
            .read_u32::<LittleEndian>()
            .map_err(|_| HarrierError::corrupt_artifact(path, "missing format version"))?;
        if version != FORMAT_VERSION {
            return Err(HarrierError::corrupt_artifact(
                path,
                format!("unsupported format version {version}"),
            ));
        }

        let length = file
            .read_u64::<LittleEndian>()
            .map_err(|_| HarrierError::corrupt_artifact(path, "missing payload length"))?;
        let checksum = file
            .read_u32::<LittleEndian>()
            .map_err(|_| HarrierError::corrupt_artifact(path, "missing checksum"))?;

        let mut payload = Vec::new();
        file.read_to_end(&mut payload)
            .map_err(|e| HarrierError::corrupt_artifact(path, format!("read failed: {e}")))?;
        if payload.len() as u64 != length {
            return Err(HarrierError::corrupt_artifact(
                path,
                format!("payload length {} does not match header {length}", payload.len()),
            ));
        }
        if crc32fast::hash(&payload) != checksum {
            return Err(HarrierError::corrupt_artifact(path, "checksum mismatch"));
        }

        let artifact: Artifact = bincode::deserialize(&payload)
            .map_err(|e| HarrierError::corrupt_artifact(path, format!("undecodable payload: {e}")))?;

        info!(path = %path.display(), backend = %artifact.metadata.backend, "artifact loaded");
        Ok(artifact)
    }
}
