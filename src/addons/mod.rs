//! Addon manifest import.
//!
//! # Architecture
//!
//! - **source**: Resolves a URL or path to raw bytes
//! - **decode**: Bytes to a JSON document, UTF-8 first with a detected fallback
//! - **manifest**: Required-field validation and the borrowed manifest view
//! - **store**: `localStorage.json` model, merge by id, atomic save
//! - **importer**: Runs the pipeline per source and decides whether to save
//!
//! # Usage
//!
//! ```ignore
//! use addon_import::addons::{AddonStore, SourceReader, decode, manifest};
//!
//! let store = AddonStore::new("localStorage.json".into());
//! let mut file = store.load()?;
//! let bytes = SourceReader::new(Duration::from_secs(10)).read(src)?;
//! let doc = decode::decode(&bytes, src)?;
//! let addon = manifest::validate(&doc, src)?;
//! file.merge(&addon, src);
//! store.save(&file)?;
//! ```

pub mod decode;
mod error;
mod importer;
pub mod manifest;
mod source;
mod store;

pub use error::{ImportError, StoreError, ValidationError};
pub use importer::{ImportOutcome, Importer, collect_sources};
pub use manifest::{AddonManifest, Declarations, REQUIRED_FIELDS};
pub use source::{SourceLocation, SourceReader};
pub use store::{
    AddonEntry, AddonFlags, AddonStore, DEFAULT_STORE_FILE, MergeAction, Profile, StoreFile,
};
