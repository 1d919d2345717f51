//! Addon store backed by `localStorage.json`.
//!
//! The file holds a user profile whose `addons` array is merged by manifest
//! id. Every other key is carried through untouched.

use super::error::StoreError;
use super::manifest::AddonManifest;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::ffi::OsString;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Default store file name, resolved against the working directory.
pub const DEFAULT_STORE_FILE: &str = "localStorage.json";

/// Suffix of the sibling file written before the rename.
const TEMP_SUFFIX: &str = ".tmp";

/// Result of merging one manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeAction {
    /// Appended as a new entry.
    Inserted,
    /// Replaced an entry with the same id, in place.
    Updated,
}

impl MergeAction {
    /// Returns the lowercase verb used in the import summary.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Inserted => "inserted",
            Self::Updated => "updated",
        }
    }
}

/// Per-entry flags. Always reset on insert and update.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddonFlags {
    /// Shipped with the host application.
    pub official: bool,
    /// Cannot be removed by the user.
    pub protected: bool,
}

/// A stored addon: the manifest plus where it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddonEntry {
    /// Entry flags.
    pub flags: AddonFlags,
    /// Manifest document as fetched.
    pub manifest: Map<String, Value>,
    /// Source the manifest was imported from.
    pub transport_url: String,
}

impl AddonEntry {
    /// Wraps a manifest with default flags.
    #[must_use]
    pub fn new(manifest: &AddonManifest<'_>, transport_url: &str) -> Self {
        Self {
            flags: AddonFlags::default(),
            manifest: manifest.document.clone(),
            transport_url: transport_url.to_string(),
        }
    }
}

/// The profile object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    /// Addon entries. Kept as raw values so entries written by other tools
    /// survive a round trip.
    pub addons: Vec<Value>,
    /// Other profile fields.
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

/// Root of the store document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreFile {
    /// User profile.
    pub profile: Profile,
    /// Other top-level fields.
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl StoreFile {
    /// Parses and shape-checks a store document.
    pub fn from_json(content: &str) -> Result<Self, StoreError> {
        let root: Value = serde_json::from_str(content).map_err(StoreError::InvalidJson)?;

        let profile = root
            .get("profile")
            .and_then(Value::as_object)
            .ok_or(StoreError::MissingProfile)?;
        if !profile.get("addons").is_some_and(Value::is_array) {
            return Err(StoreError::MissingAddons);
        }

        serde_json::from_value(root).map_err(StoreError::InvalidJson)
    }

    /// Serializes with sorted keys, 2-space indent and a trailing newline.
    pub fn to_json(&self) -> Result<String, StoreError> {
        // Going through `Value` sorts object keys: serde_json's map is a BTreeMap.
        let value = serde_json::to_value(self).map_err(StoreError::Serialize)?;
        let mut content = serde_json::to_string_pretty(&value).map_err(StoreError::Serialize)?;
        content.push('\n');
        Ok(content)
    }

    /// Returns the index of the entry whose manifest id is `id`.
    #[must_use]
    pub fn position(&self, id: &str) -> Option<usize> {
        self.profile.addons.iter().position(|entry| {
            entry
                .get("manifest")
                .and_then(|m| m.get("id"))
                .and_then(Value::as_str)
                == Some(id)
        })
    }

    /// Inserts or updates the entry for `manifest.id`.
    ///
    /// An update replaces the whole entry at its current index, resetting
    /// its flags.
    pub fn merge(&mut self, manifest: &AddonManifest<'_>, transport_url: &str) -> MergeAction {
        let value = Value::from(AddonEntry::new(manifest, transport_url));

        match self.position(manifest.id) {
            Some(index) => {
                debug!("[ADDON-STORE] Replacing '{}' at index {}", manifest.id, index);
                self.profile.addons[index] = value;
                MergeAction::Updated
            }
            None => {
                debug!("[ADDON-STORE] Appending '{}'", manifest.id);
                self.profile.addons.push(value);
                MergeAction::Inserted
            }
        }
    }

    /// Number of addon entries.
    #[must_use]
    pub fn addon_count(&self) -> usize {
        self.profile.addons.len()
    }
}

// Built by hand so merging cannot fail; matches the serde layout.
impl From<AddonEntry> for Value {
    fn from(entry: AddonEntry) -> Self {
        let mut flags = Map::new();
        flags.insert("official".into(), Value::Bool(entry.flags.official));
        flags.insert("protected".into(), Value::Bool(entry.flags.protected));

        let mut map = Map::new();
        map.insert("flags".into(), Value::Object(flags));
        map.insert("manifest".into(), Value::Object(entry.manifest));
        map.insert("transportUrl".into(), Value::String(entry.transport_url));
        Value::Object(map)
    }
}

/// Loads and atomically saves the store file.
#[derive(Debug, Clone)]
pub struct AddonStore {
    /// Path to the store file.
    path: PathBuf,
}

impl AddonStore {
    /// Creates a store for `path`.
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Returns the store file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the sibling path written before the rename.
    #[must_use]
    pub fn temp_path(&self) -> PathBuf {
        let mut name = OsString::from(self.path.as_os_str());
        name.push(TEMP_SUFFIX);
        PathBuf::from(name)
    }

    /// Loads the store file.
    ///
    /// A missing file is [`StoreError::NotFound`]; no empty store is made up.
    pub fn load(&self) -> Result<StoreFile, StoreError> {
        if !self.path.exists() {
            info!("[ADDON-STORE] {} does not exist", self.path.display());
            return Err(StoreError::NotFound(self.path.clone()));
        }

        let content = fs::read_to_string(&self.path)?;
        let file = StoreFile::from_json(&content).inspect_err(|e| {
            warn!("[ADDON-STORE] Rejecting {}: {}", self.path.display(), e);
        })?;

        info!(
            "[ADDON-STORE] Loaded {} with {} addon(s)",
            self.path.display(),
            file.addon_count()
        );
        Ok(file)
    }

    /// Saves the store file.
    ///
    /// Writes the temp sibling, syncs it, then renames it over the target.
    /// A failure before the rename leaves the target untouched.
    pub fn save(&self, file: &StoreFile) -> Result<(), StoreError> {
        let content = file.to_json()?;

        // Ensure parent directory exists
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let temp_path = self.temp_path();

        {
            let mut temp = fs::File::create(&temp_path)?;
            temp.write_all(content.as_bytes())?;
            temp.flush()?;
            temp.sync_all()?;
        }

        fs::rename(&temp_path, &self.path)?;

        info!(
            "[ADDON-STORE] Saved {} addon(s) to {}",
            file.addon_count(),
            self.path.display()
        );
        Ok(())
    }
}
