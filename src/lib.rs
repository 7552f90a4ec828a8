//! Resonance archive: an append-only journal of text entries, each embedded
//! into a vector and labelled with one of a fixed set of emotional archetypes.
//!
//! Entries are retrieved later by cosine similarity ("resonance"), traced into
//! chronological lineages, and periodically revisited by a background curator
//! that records "ghost reflections" linking a random entry to its neighbours.
//!
//! | Collection | Record | Written by |
//! |------------|--------|------------|
//! | `entries` | [`archive::types::Entry`] | ingestion |
//! | `echoes` | [`archive::types::Echo`] | every public search |
//! | `ghost_threads` | [`archive::types::Reflection`] | the curator |
//!
//! # Architecture
//!
//! - **Storage**: flat JSON documents replaced atomically, or one SQLite file
//!   per collection, or in-process memory for tests
//! - **Embeddings**: any OpenAI-compatible `/embeddings` endpoint
//! - **Search**: brute-force cosine scan, no index
//! - **Transport**: JSON over HTTP (axum)
//!
//! # Modules
//!
//! - [`archive`]: ingestion, search, lineage, classification, curator
//! - [`config`]: configuration loading from TOML files and environment variables
//! - [`db`]: SQLite connection setup and schema for the SQLite backend
//! - [`embedding`]: text-to-vector provider trait and HTTP implementation
//! - [`error`]: error taxonomy
//! - [`server`]: HTTP routes and the `serve` entry point
//! - [`store`]: append-only collection backends

pub mod archive;
pub mod config;
pub mod db;
pub mod embedding;
pub mod error;
pub mod server;
pub mod store;
