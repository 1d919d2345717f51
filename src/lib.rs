//! addon-import
//!
//! Fetches addon manifest documents from URLs or local paths, validates
//! their shape, and merges them by id into the `profile.addons` list of a
//! `localStorage.json` store.
//!
//! # Architecture
//!
//! - **addons**: Source reading, decoding, manifest validation, the store
//!   and the import orchestrator
//! - **config**: Layered configuration (defaults, TOML file, env, CLI)
//! - **logging**: `tracing` subscriber setup
//!
//! # Usage
//!
//! ```no_run
//! use addon_import::{ImportConfig, Importer};
//!
//! let sources = addon_import::collect_sources(["https://example.com/manifest.json"]);
//! let outcome = Importer::new(ImportConfig::default()).run(&sources);
//! std::process::exit(outcome.exit_code());
//! ```

// Clippy configuration - allow common patterns
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::doc_markdown)]

pub mod addons;
pub mod config;
pub mod logging;

// Re-export main types
pub use addons::{
    AddonManifest, AddonStore, ImportError, ImportOutcome, Importer, MergeAction, StoreError,
    StoreFile, collect_sources,
};
pub use config::ImportConfig;
