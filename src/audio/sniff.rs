//! Magic-byte detection of supported audio containers.

use std::fmt;
use std::path::Path;

use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::error::{Result, SbError};
use crate::store::AudioStore;

/// Audio containers accepted for import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    Wav,
    Mp3,
    Ogg,
    Flac,
    Aiff,
}

impl AudioFormat {
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Wav => "wav",
            Self::Mp3 => "mp3",
            Self::Ogg => "ogg",
            Self::Flac => "flac",
            Self::Aiff => "aiff",
        }
    }
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Identifies the container from the first bytes of `data`.
pub fn detect_format(data: &[u8]) -> Option<AudioFormat> {
    match data {
        [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'A', b'V', b'E', ..] => Some(AudioFormat::Wav),
        [b'I', b'D', b'3', ..] => Some(AudioFormat::Mp3),
        // MPEG audio frame sync: 11 set bits
        [0xFF, second, ..] if second & 0xE0 == 0xE0 => Some(AudioFormat::Mp3),
        [b'O', b'g', b'g', b'S', ..] => Some(AudioFormat::Ogg),
        [b'f', b'L', b'a', b'C', ..] => Some(AudioFormat::Flac),
        [b'F', b'O', b'R', b'M', _, _, _, _, b'A', b'I', b'F', b'F' | b'C', ..] => Some(AudioFormat::Aiff),
        _ => None,
    }
}

/// Reads an audio file from disk, validates it and stores it.
///
/// The stored name defaults to the file name. Returns the new audio file id.
#[instrument(skip(store))]
pub fn import_file<S: AudioStore + ?Sized>(
    store: &S,
    path: &Path,
    name: Option<&str>,
    category_id: i64,
) -> Result<i64> {
    if !path.is_file() {
        return Err(SbError::AudioSourceNotFound {
            path: path.display().to_string(),
        });
    }
    require_category(store, category_id)?;

    let data = std::fs::read(path)?;
    let fallback = path.file_name().map(|n| n.to_string_lossy().into_owned());
    let name = name.map(str::to_string).or(fallback);
    store_audio(store, &data, &path.display().to_string(), name, category_id)
}

pub(crate) fn require_category<S: AudioStore + ?Sized>(store: &S, category_id: i64) -> Result<()> {
    if store.list_categories()?.iter().any(|c| c.id == category_id) {
        Ok(())
    } else {
        Err(SbError::CategoryNotFound { id: category_id })
    }
}

/// Validates `data` and inserts it under `name`, or `audio.<ext>` when unnamed.
pub(crate) fn store_audio<S: AudioStore + ?Sized>(
    store: &S,
    data: &[u8],
    source: &str,
    name: Option<String>,
    category_id: i64,
) -> Result<i64> {
    let Some(format) = detect_format(data) else {
        return Err(SbError::UnsupportedAudio {
            path: source.to_string(),
        });
    };
    debug!(%format, bytes = data.len(), "Detected audio format");

    let name = name.unwrap_or_else(|| format!("audio.{format}"));
    let id = store.insert_audio_file(data, &name, category_id)?;
    info!(id, name = %name, category_id, "Imported audio file");
    Ok(id)
}
