//! Soundboard store library: category/audio storage and the one-time
//! migration of legacy per-button audio into it.
//!
//! This library exposes the core functionality of the `sb` CLI for use in
//! tests and by hosts that embed the store.
//!
//! # Modules
//!
//! - `store`: SQLite-backed categories, audio files and backups
//! - `profile`: The host's profile/folder/button tree
//! - `codec`: Legacy and current action parameter blobs
//! - `migrate`: Deduplicating, transactional migration of legacy buttons
//! - `retry`: Bounded retry with fixed delay
//! - `audio`: Audio format detection for imports
//! - `config`: Settings file handling
//! - `error`: Error types with user-recoverable hints
#![forbid(unsafe_code)]

pub mod audio;
pub mod cli;
pub mod codec;
pub mod config;
pub mod error;
pub mod logging;
pub mod migrate;
pub mod profile;
pub mod retry;
pub mod store;
