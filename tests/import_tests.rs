//! Integration tests for the import pipeline.
//!
//! Tests cover: insert/update semantics, failure isolation, store
//! preconditions, and the on-disk format.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::fs;
use std::path::{Path, PathBuf};

use addon_import::{ImportConfig, ImportOutcome, Importer};
use serde_json::{Value, json};
use tempfile::TempDir;

// ============================================================================
// Helpers
// ============================================================================

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("tempdir"),
        }
    }

    fn store_path(&self) -> PathBuf {
        self.dir.path().join("localStorage.json")
    }

    fn write_store(&self, content: &str) {
        fs::write(self.store_path(), content).expect("write store");
    }

    fn read_store(&self) -> Value {
        let content = fs::read_to_string(self.store_path()).expect("read store");
        serde_json::from_str(&content).expect("store is json")
    }

    fn write_manifest(&self, name: &str, doc: &Value) -> String {
        let path = self.dir.path().join(name);
        fs::write(&path, serde_json::to_vec(doc).unwrap()).unwrap();
        path_string(&path)
    }

    fn config(&self) -> ImportConfig {
        ImportConfig {
            store_path: self.store_path(),
            fetch_timeout_secs: 2,
            ..ImportConfig::default()
        }
    }

    fn run(&self, config: ImportConfig, sources: &[String]) -> (ImportOutcome, String, String) {
        let mut importer = Importer::with_output(config, Vec::new(), Vec::new());
        let outcome = importer.run(sources);
        let (out, err) = importer.into_output();
        (
            outcome,
            String::from_utf8(out).unwrap(),
            String::from_utf8(err).unwrap(),
        )
    }
}

fn path_string(path: &Path) -> String {
    path.to_str().expect("utf-8 temp path").to_string()
}

fn manifest(id: &str, version: &str) -> Value {
    json!({
        "id": id,
        "version": version,
        "name": "Foo",
        "description": "A foo",
        "logo": "http://x/l.png",
        "resources": [],
        "types": []
    })
}

const EMPTY_STORE: &str = r#"{"profile": {"addons": []}}"#;

// ============================================================================
// Merge semantics
// ============================================================================

mod merge_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_import_into_empty_store() {
        let ws = Workspace::new();
        ws.write_store(EMPTY_STORE);
        let doc = manifest("a1", "1.0");
        let src = ws.write_manifest("a1.json", &doc);

        let (outcome, out, err) = ws.run(ws.config(), &[src.clone()]);

        assert_eq!(outcome, ImportOutcome::Saved { succeeded: 1, total: 1 });
        assert_eq!(
            ws.read_store(),
            json!({"profile": {"addons": [{
                "flags": {"official": false, "protected": false},
                "manifest": doc,
                "transportUrl": src
            }]}})
        );
        assert!(out.contains(&format!("Addon 'Foo' (a1) v1.0 inserted from {}", src)));
        assert!(out.contains("1/1 addon(s) processed successfully."));
        assert!(err.is_empty(), "unexpected stderr: {}", err);
    }

    #[test]
    fn test_import_same_manifest_twice_is_update() {
        let ws = Workspace::new();
        ws.write_store(EMPTY_STORE);
        let src = ws.write_manifest("a1.json", &manifest("a1", "1.0"));

        let (outcome, out, _) = ws.run(ws.config(), &[src.clone(), src.clone()]);

        assert_eq!(outcome, ImportOutcome::Saved { succeeded: 2, total: 2 });
        assert!(out.contains("inserted from"));
        assert!(out.contains("updated from"));
        assert_eq!(ws.read_store()["profile"]["addons"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_update_keeps_position() {
        let ws = Workspace::new();
        ws.write_store(EMPTY_STORE);
        let a = ws.write_manifest("a.json", &manifest("a", "1.0"));
        let b = ws.write_manifest("b.json", &manifest("b", "1.0"));
        let c = ws.write_manifest("c.json", &manifest("c", "1.0"));
        ws.run(ws.config(), &[a, b, c]);

        let b2 = ws.write_manifest("b2.json", &manifest("b", "2.0"));
        let (outcome, _, _) = ws.run(ws.config(), &[b2]);
        assert_eq!(outcome, ImportOutcome::Saved { succeeded: 1, total: 1 });

        let store = ws.read_store();
        let addons = store["profile"]["addons"].as_array().unwrap();
        let ids: Vec<&str> = addons
            .iter()
            .map(|e| e["manifest"]["id"].as_str().unwrap())
            .collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(addons[1]["manifest"]["version"], "2.0");
    }

    #[test]
    fn test_update_resets_flags() {
        let ws = Workspace::new();
        ws.write_store(
            r#"{"profile": {"addons": [{
                "flags": {"official": true, "protected": true},
                "manifest": {"id": "a1"},
                "transportUrl": "https://old/manifest.json"
            }]}}"#,
        );
        let src = ws.write_manifest("a1.json", &manifest("a1", "1.1"));

        ws.run(ws.config(), &[src.clone()]);

        let entry = &ws.read_store()["profile"]["addons"][0];
        assert_eq!(entry["flags"], json!({"official": false, "protected": false}));
        assert_eq!(entry["transportUrl"], src.as_str());
    }
}

// ============================================================================
// Failure isolation
// ============================================================================

mod failure_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_partial_failure_saves_successes() {
        let ws = Workspace::new();
        ws.write_store(EMPTY_STORE);
        let first = ws.write_manifest("first.json", &manifest("first", "1.0"));
        let mut broken = manifest("broken", "1.0");
        broken.as_object_mut().unwrap().remove("logo");
        let second = ws.write_manifest("second.json", &broken);
        let third = ws.write_manifest("third.json", &manifest("third", "1.0"));

        let (outcome, out, err) = ws.run(ws.config(), &[first, second.clone(), third]);

        assert_eq!(outcome, ImportOutcome::Saved { succeeded: 2, total: 3 });
        assert_eq!(outcome.exit_code(), 0);
        assert!(err.contains(&format!(
            "Missing required field(s) in '{}': logo",
            second
        )));
        assert!(out.contains("2/3 addon(s) processed successfully."));

        let store = ws.read_store();
        let ids: Vec<&str> = store["profile"]["addons"]
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["manifest"]["id"].as_str().unwrap())
            .collect();
        assert_eq!(ids, vec!["first", "third"]);
    }

    #[test]
    fn test_all_sources_fail_leaves_store_untouched() {
        let ws = Workspace::new();
        ws.write_store(EMPTY_STORE);
        let missing = path_string(&ws.dir.path().join("missing.json"));
        let bad_json = ws.dir.path().join("bad.json");
        fs::write(&bad_json, b"{\"id\": ").unwrap();
        let bad_json = path_string(&bad_json);

        let (outcome, _, err) = ws.run(ws.config(), &[missing.clone(), bad_json.clone()]);

        assert_eq!(outcome, ImportOutcome::NothingImported { total: 2 });
        assert_eq!(outcome.exit_code(), 1);
        assert!(err.contains(&format!("Error importing '{}': Failed to fetch", missing)));
        assert!(err.contains(&format!("Invalid JSON from '{}'", bad_json)));
        assert!(err.contains("No addons were imported due to errors."));
        assert_eq!(fs::read_to_string(ws.store_path()).unwrap(), EMPTY_STORE);
    }

    #[test]
    fn test_unreachable_url_is_isolated() {
        let ws = Workspace::new();
        ws.write_store(EMPTY_STORE);
        let good = ws.write_manifest("good.json", &manifest("good", "1.0"));
        let unreachable = "http://127.0.0.1:1/manifest.json".to_string();

        let (outcome, _, err) = ws.run(ws.config(), &[unreachable, good]);

        assert_eq!(outcome, ImportOutcome::Saved { succeeded: 1, total: 2 });
        assert!(err.contains("Error importing 'http://127.0.0.1:1/manifest.json'"));
    }

    #[test]
    fn test_validation_can_be_disabled() {
        let ws = Workspace::new();
        ws.write_store(EMPTY_STORE);
        let src = ws.write_manifest("bare.json", &json!({"id": "bare", "name": "Bare"}));

        let strict = ws.run(ws.config(), &[src.clone()]);
        assert_eq!(strict.0, ImportOutcome::NothingImported { total: 1 });

        let config = ImportConfig {
            validate: false,
            ..ws.config()
        };
        let (outcome, _, _) = ws.run(config, &[src]);
        assert_eq!(outcome, ImportOutcome::Saved { succeeded: 1, total: 1 });
        assert_eq!(
            ws.read_store()["profile"]["addons"][0]["manifest"],
            json!({"id": "bare", "name": "Bare"})
        );
    }
}

// ============================================================================
// Store preconditions and format
// ============================================================================

mod store_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_missing_store_aborts_before_fetching() {
        let ws = Workspace::new();
        let src = ws.write_manifest("a1.json", &manifest("a1", "1.0"));

        let (outcome, out, err) = ws.run(ws.config(), &[src]);

        assert_eq!(outcome, ImportOutcome::StoreUnavailable);
        assert_eq!(outcome.exit_code(), 1);
        assert!(!out.contains("Fetching info"));
        assert!(err.contains("No addons were imported due to errors."));
        assert!(!ws.store_path().exists());
    }

    #[test]
    fn test_corrupt_store_is_not_overwritten() {
        for (content, warning) in [
            ("{not json", "invalid json"),
            (r#"{"settings": {}}"#, "missing 'profile' object"),
            (r#"{"profile": {"addons": null}}"#, "missing 'addons' array"),
        ] {
            let ws = Workspace::new();
            ws.write_store(content);
            let src = ws.write_manifest("a1.json", &manifest("a1", "1.0"));

            let (outcome, _, err) = ws.run(ws.config(), &[src]);

            assert_eq!(outcome, ImportOutcome::StoreUnavailable);
            assert!(err.contains(warning), "stderr {:?} lacks {:?}", err, warning);
            assert_eq!(fs::read_to_string(ws.store_path()).unwrap(), content);
        }
    }

    #[test]
    fn test_empty_source_list_keeps_file() {
        let ws = Workspace::new();
        ws.write_store(EMPTY_STORE);

        let (outcome, _, _) = ws.run(ws.config(), &[]);

        assert_eq!(outcome, ImportOutcome::NoInput);
        assert_eq!(outcome.exit_code(), 2);
        assert_eq!(fs::read_to_string(ws.store_path()).unwrap(), EMPTY_STORE);
    }

    #[test]
    fn test_saved_file_format() {
        let ws = Workspace::new();
        ws.write_store(r#"{"zeta": true, "profile": {"name": "me", "addons": []}}"#);
        let doc = json!({
            "types": ["movie"],
            "resources": {"stream": {}},
            "logo": "http://x/l.png",
            "description": "Ünïcode",
            "name": "Foo",
            "version": "1.0",
            "id": "a1"
        });
        let src = ws.write_manifest("a1.json", &doc);

        ws.run(ws.config(), &[src.clone()]);

        let content = fs::read_to_string(ws.store_path()).unwrap();
        let expected = format!(
            r#"{{
  "profile": {{
    "addons": [
      {{
        "flags": {{
          "official": false,
          "protected": false
        }},
        "manifest": {{
          "description": "Ünïcode",
          "id": "a1",
          "logo": "http://x/l.png",
          "name": "Foo",
          "resources": {{
            "stream": {{}}
          }},
          "types": [
            "movie"
          ],
          "version": "1.0"
        }},
        "transportUrl": {}
      }}
    ],
    "name": "me"
  }},
  "zeta": true
}}
"#,
            serde_json::to_string(&src).unwrap()
        );
        assert_eq!(content, expected);
        assert!(!ws.dir.path().join("localStorage.json.tmp").exists());
    }
}
