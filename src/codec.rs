//! Action parameter blobs stored in each audio action's configuration.
//!
//! Two generations exist:
//!
//! - **Legacy**: every action embeds the raw audio bytes (`FileData`,
//!   base64 in the JSON document) next to its playback settings.
//! - **V2**: the action references an `audio_file` row by `AudioFileId`
//!   and keeps only playback settings.
//!
//! Both are JSON objects with PascalCase keys, which is how the host
//! application stores plugin action configuration.

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::{Result, SbError};

const DEFAULT_VOLUME: i32 = 50;

const fn default_volume() -> i32 {
    DEFAULT_VOLUME
}

const fn default_true() -> bool {
    true
}

/// Playback parameters with the audio payload embedded inline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LegacyActionParameters {
    #[serde(with = "base64_bytes")]
    pub file_data: Vec<u8>,
    pub file_name: String,
    /// Original location the audio was loaded from (file path or URL).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_ext: Option<String>,
    #[serde(default = "default_volume")]
    pub volume: i32,
    #[serde(default = "default_true")]
    pub use_default_device: bool,
    #[serde(default)]
    pub output_device_id: Option<String>,
    #[serde(default)]
    pub sync_button_state: bool,
}

impl LegacyActionParameters {
    /// Legacy parameters with default playback settings.
    pub fn new(file_data: Vec<u8>, file_name: impl Into<String>) -> Self {
        Self {
            file_data,
            file_name: file_name.into(),
            file_path: None,
            file_ext: None,
            volume: DEFAULT_VOLUME,
            use_default_device: true,
            output_device_id: None,
            sync_button_state: false,
        }
    }

    /// Converts into V2 parameters pointing at `audio_file_id`.
    ///
    /// Playback settings carry over unchanged; the payload does not.
    pub fn into_v2(self, audio_file_id: i64) -> ActionParametersV2 {
        ActionParametersV2 {
            audio_file_id,
            file_name: self.file_name,
            volume: self.volume,
            use_default_device: self.use_default_device,
            output_device_id: self.output_device_id,
            sync_button_state: self.sync_button_state,
        }
    }
}

/// Playback parameters referencing a stored audio file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ActionParametersV2 {
    pub audio_file_id: i64,
    #[serde(default)]
    pub file_name: String,
    #[serde(default = "default_volume")]
    pub volume: i32,
    #[serde(default = "default_true")]
    pub use_default_device: bool,
    #[serde(default)]
    pub output_device_id: Option<String>,
    #[serde(default)]
    pub sync_button_state: bool,
}

impl ActionParametersV2 {
    /// Human-readable summary shown on the button, e.g. `"7 - airhorn.wav"`.
    pub fn summary(&self) -> String {
        format!("{} - {}", self.audio_file_id, self.file_name)
    }
}

/// Shape of an audio action configuration blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlobFormat {
    Legacy,
    V2,
    Unknown,
}

/// Decodes a legacy blob; fails if `FileData` or `FileName` is missing or malformed.
pub fn deserialize_legacy(blob: &str) -> Result<LegacyActionParameters> {
    let params: LegacyActionParameters = serde_json::from_str(blob)
        .map_err(|e| SbError::InvalidLegacyParameters(e.to_string()))?;
    trace!(file_name = %params.file_name, bytes = params.file_data.len(), "Decoded legacy parameters");
    Ok(params)
}

/// Encodes legacy parameters.
pub fn serialize_legacy(params: &LegacyActionParameters) -> Result<String> {
    serde_json::to_string(params).map_err(|e| SbError::InvalidLegacyParameters(e.to_string()))
}

/// Decodes a V2 blob.
pub fn deserialize_v2(blob: &str) -> Result<ActionParametersV2> {
    serde_json::from_str(blob).map_err(|e| SbError::InvalidParameters(e.to_string()))
}

/// Encodes V2 parameters.
pub fn serialize_v2(params: &ActionParametersV2) -> Result<String> {
    serde_json::to_string(params).map_err(|e| SbError::InvalidParameters(e.to_string()))
}

/// Classifies a blob by its keys without decoding the payload.
///
/// A blob with `FileData` is legacy even if it also carries an
/// `AudioFileId`; the embedded bytes are what still needs migrating.
pub fn detect_format(blob: &str) -> BlobFormat {
    let Ok(serde_json::Value::Object(map)) = serde_json::from_str::<serde_json::Value>(blob) else {
        return BlobFormat::Unknown;
    };
    if map.contains_key("FileData") {
        BlobFormat::Legacy
    } else if map.contains_key("AudioFileId") {
        BlobFormat::V2
    } else {
        BlobFormat::Unknown
    }
}

mod base64_bytes {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}
