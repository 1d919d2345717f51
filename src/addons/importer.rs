//! Import orchestrator.
//!
//! Loads the store once, runs read → decode → validate → merge for each
//! source in turn, and saves once at the end if anything succeeded. A
//! failing source is reported and counted; it never stops the batch.

use super::decode::decode;
use super::error::ImportError;
use super::manifest::{self, AddonManifest};
use super::source::SourceReader;
use super::store::{AddonStore, MergeAction, StoreFile};
use crate::config::ImportConfig;
use std::fmt::Display;
use std::io::{self, Write};
use tracing::{info, warn};

/// Splits every argument on whitespace into individual sources.
///
/// A single quoted argument holding several space-separated sources and
/// one source per argument both work, and may be mixed.
pub fn collect_sources<I, S>(args: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    args.into_iter()
        .flat_map(|arg| {
            arg.as_ref()
                .split_whitespace()
                .map(String::from)
                .collect::<Vec<_>>()
        })
        .collect()
}

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportOutcome {
    /// At least one source merged and the store was saved.
    Saved {
        /// Sources merged.
        succeeded: usize,
        /// Sources attempted.
        total: usize,
    },
    /// Every source failed; the store was not touched.
    NothingImported {
        /// Sources attempted.
        total: usize,
    },
    /// The store could not be loaded; no source was attempted.
    StoreUnavailable,
    /// Sources merged but the save failed; the old file is intact.
    SaveFailed,
    /// No sources were given.
    NoInput,
}

impl ImportOutcome {
    /// Process exit code: 0 saved, 1 failure, 2 no input.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Saved { .. } => 0,
            Self::NothingImported { .. } | Self::StoreUnavailable | Self::SaveFailed => 1,
            Self::NoInput => 2,
        }
    }
}

/// Runs an import batch against one store file.
///
/// Progress goes to `out` and failures to `err`; by default these are
/// stdout and stderr.
#[derive(Debug)]
pub struct Importer<O = io::Stdout, E = io::Stderr> {
    /// Whether manifests are validated before merging.
    validate: bool,
    /// Reader shared across sources.
    reader: SourceReader,
    /// Store being merged into.
    store: AddonStore,
    /// Progress stream.
    out: O,
    /// Error stream.
    err: E,
}

impl Importer {
    /// Creates an importer writing to stdout and stderr.
    #[must_use]
    pub fn new(config: ImportConfig) -> Self {
        Self::with_output(config, io::stdout(), io::stderr())
    }
}

impl<O: Write, E: Write> Importer<O, E> {
    /// Creates an importer writing to the given streams.
    pub fn with_output(config: ImportConfig, out: O, err: E) -> Self {
        Self {
            validate: config.validate,
            reader: SourceReader::new(config.fetch_timeout()),
            store: AddonStore::new(config.store_path),
            out,
            err,
        }
    }

    /// Consumes the importer and returns its output streams.
    pub fn into_output(self) -> (O, E) {
        (self.out, self.err)
    }

    /// Imports every source and saves the store if any succeeded.
    pub fn run(&mut self, sources: &[String]) -> ImportOutcome {
        if sources.is_empty() {
            self.error("No addon URL provided. Provide as CLI args");
            self.error("Example: addon-import https://example.com/manifest.json");
            return ImportOutcome::NoInput;
        }

        let mut file = match self.store.load() {
            Ok(file) => file,
            Err(e) => {
                self.error(format_args!("Warning: {}", e));
                self.error("No addons were imported due to errors.");
                return ImportOutcome::StoreUnavailable;
            }
        };

        let total = sources.len();
        let mut succeeded = 0;

        for source in sources {
            self.say(format_args!("Importing addon from {}...", source));

            match self.import_one(&mut file, source) {
                Ok(_) => succeeded += 1,
                Err(ImportError::Validation(e)) => {
                    warn!("[ADDON-IMPORT] Rejected {}: {}", source, e);
                    self.error(e);
                }
                Err(e) => {
                    warn!("[ADDON-IMPORT] Failed {}: {}", source, e);
                    self.error(format_args!("Error importing '{}': {}", source, e));
                }
            }
        }

        info!("[ADDON-IMPORT] {}/{} source(s) imported", succeeded, total);

        if succeeded == 0 {
            self.error("No addons were imported due to errors.");
            return ImportOutcome::NothingImported { total };
        }

        if let Err(e) = self.store.save(&file) {
            let path = self.store.path().display().to_string();
            self.error(format_args!("Error saving storage to {}: {}", path, e));
            return ImportOutcome::SaveFailed;
        }

        let path = self.store.path().display().to_string();
        self.say(format_args!(
            "\nSaved storage to {}. {}/{} addon(s) processed successfully.",
            path, succeeded, total
        ));

        ImportOutcome::Saved { succeeded, total }
    }

    /// Reads, decodes, validates and merges one source into `file`.
    pub fn import_one(
        &mut self,
        file: &mut StoreFile,
        source: &str,
    ) -> Result<MergeAction, ImportError> {
        self.say(format_args!("Fetching info for addon at {}...", source));
        let payload = self.reader.read(source)?;
        let doc = decode(&payload, source)?;

        let addon = if self.validate {
            manifest::validate(&doc, source)?
        } else {
            AddonManifest::unchecked(&doc, source)?
        };

        let action = file.merge(&addon, source);
        info!("[ADDON-IMPORT] {} '{}' from {}", action.as_str(), addon.id, source);

        self.summarize(&addon, action, source);
        Ok(action)
    }

    /// Prints the per-addon summary block.
    fn summarize(&mut self, addon: &AddonManifest<'_>, action: MergeAction, source: &str) {
        self.say(format_args!(
            "Addon '{}' ({}) v{} {} from {}",
            addon.name,
            addon.id,
            addon.version,
            action.as_str(),
            source
        ));
        self.say(format_args!("  - description: {}", addon.description_excerpt()));
        self.say(format_args!("  - logo: {}", addon.logo));
        self.say(format_args!(
            "  - resources: {}, types: {}",
            addon.resources.len(),
            addon.types.len()
        ));
    }

    // Output is best effort: a closed pipe must not fail the import.
    fn say(&mut self, line: impl Display) {
        let _ = writeln!(self.out, "{}", line);
    }

    fn error(&mut self, line: impl Display) {
        let _ = writeln!(self.err, "{}", line);
    }
}
