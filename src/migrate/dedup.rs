//! Content-addressed index from audio payload to stored audio file id.
//!
//! The index lives for exactly one migration run. It is created empty by
//! the orchestrator, threaded through the tree walk by `&mut`, and dropped
//! when the run ends, so a later run never sees stale entries.

use std::collections::HashMap;

use sha2::{Digest, Sha256};
use tracing::trace;

use crate::error::Result;

/// Hex-encoded SHA-256 of the full payload.
pub fn fingerprint(payload: &[u8]) -> String {
    hex::encode(Sha256::digest(payload))
}

/// Maps payload fingerprints to the audio file created for them.
#[derive(Debug, Default)]
pub struct DedupIndex {
    entries: HashMap<String, i64>,
    hits: usize,
}

impl DedupIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the id stored for `payload`, creating the audio file with
    /// `insert` on first sight.
    ///
    /// `insert` runs at most once per distinct payload. If it fails nothing is
    /// recorded and the error is returned.
    pub fn get_or_insert<F>(&mut self, payload: &[u8], name: &str, category_id: i64, insert: F) -> Result<i64>
    where
        F: FnOnce(&[u8], &str, i64) -> Result<i64>,
    {
        let key = fingerprint(payload);
        if let Some(&id) = self.entries.get(&key) {
            self.hits += 1;
            trace!(id, name, "Payload already stored");
            return Ok(id);
        }

        let id = insert(payload, name, category_id)?;
        trace!(id, name, fingerprint = %key, "Payload stored");
        self.entries.insert(key, id);
        Ok(id)
    }

    /// Number of distinct payloads seen.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of lookups answered without an insert.
    pub fn hits(&self) -> usize {
        self.hits
    }
}
