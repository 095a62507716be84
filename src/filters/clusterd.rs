//! Filter for the on-disk state of the cluster coordination daemon.
//!
//! The state is a JSON object. Up to five secrets may be present: the
//! top-level `token`, and `authkey` plus `pems.blobs` in both
//! `cluster_config` and `old_cluster_config`. Any of them, or any object on
//! the way to them, may be missing.

use std::path::Path;

use anyhow::{Context, Result};
use serde_json::Value;

use crate::constants::REDACTION_MARKER;
use crate::filters::read_optional;

const CONFIG_KEYS: [&str; 2] = ["cluster_config", "old_cluster_config"];

/// Replace the value at `path` if every step of it exists
fn redact_at(value: &mut Value, path: &[&str]) -> bool {
    let Some((last, parents)) = path.split_last() else {
        return false;
    };
    let mut current = value;
    for key in parents {
        match current.get_mut(*key) {
            Some(next) => current = next,
            None => return false,
        }
    }
    match current.get_mut(*last) {
        Some(slot) => {
            *slot = Value::String(REDACTION_MARKER.to_string());
            true
        }
        None => false,
    }
}

/// Redact the JSON text of a clusterd database.
///
/// Invalid JSON is an error; absent secrets are not.
pub fn redact_xapi_clusterd_db(text: &str) -> Result<String> {
    let mut db: Value = serde_json::from_str(text)
        .context("filter_xapi_clusterd_db: failed to parse clusterd database as JSON")?;

    redact_at(&mut db, &["token"]);
    for config in CONFIG_KEYS {
        redact_at(&mut db, &[config, "authkey"]);
        redact_at(&mut db, &[config, "pems", "blobs"]);
    }

    serde_json::to_string_pretty(&db).context("Failed to serialize clusterd database as JSON")
}

/// Read and redact the clusterd database at `path`.
///
/// A missing file yields an empty string.
pub fn filter_xapi_clusterd_db(path: &Path) -> Result<String> {
    match read_optional(path)? {
        Some(text) => redact_xapi_clusterd_db(&text),
        None => Ok(String::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn original() -> Value {
        json!({
            "token": "secret-token",
            "cluster_config": {
                "pems": { "blobs": "secret-blob" },
                "authkey": "secret-key"
            },
            "old_cluster_config": {
                "pems": { "blobs": "secret-blob" },
                "authkey": "secret-key"
            },
            "max_config_version": 1
        })
    }

    fn expected() -> Value {
        json!({
            "token": "REMOVED",
            "cluster_config": {
                "pems": { "blobs": "REMOVED" },
                "authkey": "REMOVED"
            },
            "old_cluster_config": {
                "pems": { "blobs": "REMOVED" },
                "authkey": "REMOVED"
            },
            "max_config_version": 1
        })
    }

    fn assert_filtered(original: Value, expected: Value) {
        let out = redact_xapi_clusterd_db(&original.to_string()).unwrap();
        let parsed: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed, expected);
    }

    fn without(mut value: Value, remove: impl Fn(&mut Value)) -> Value {
        remove(&mut value);
        value
    }

    #[test]
    fn test_pems_blobs_and_token() {
        assert_filtered(original(), expected());
    }

    #[test]
    fn test_no_authkey() {
        let strip = |v: &mut Value| {
            for key in CONFIG_KEYS {
                v[key].as_object_mut().unwrap().remove("authkey");
            }
        };
        assert_filtered(without(original(), strip), without(expected(), strip));
    }

    #[test]
    fn test_no_pems() {
        let strip = |v: &mut Value| {
            for key in CONFIG_KEYS {
                v[key].as_object_mut().unwrap().remove("pems");
            }
        };
        assert_filtered(without(original(), strip), without(expected(), strip));
    }

    #[test]
    fn test_no_blobs() {
        let strip = |v: &mut Value| {
            for key in CONFIG_KEYS {
                v[key]["pems"].as_object_mut().unwrap().remove("blobs");
            }
        };
        assert_filtered(without(original(), strip), without(expected(), strip));
    }

    #[test]
    fn test_no_cluster_configs() {
        let strip = |v: &mut Value| {
            let obj = v.as_object_mut().unwrap();
            obj.remove("cluster_config");
            obj.remove("old_cluster_config");
        };
        assert_filtered(without(original(), strip), without(expected(), strip));
    }

    #[test]
    fn test_no_token() {
        let strip = |v: &mut Value| {
            v.as_object_mut().unwrap().remove("token");
        };
        assert_filtered(without(original(), strip), without(expected(), strip));
    }

    #[test]
    fn test_only_new_config_without_pems() {
        let mut input = original();
        input["cluster_config"].as_object_mut().unwrap().remove("pems");
        let mut output = expected();
        output["cluster_config"].as_object_mut().unwrap().remove("pems");
        assert_filtered(input, output);
    }

    #[test]
    fn test_non_object_intermediate() {
        assert_filtered(
            json!({"cluster_config": "not-an-object", "token": null}),
            json!({"cluster_config": "not-an-object", "token": "REMOVED"}),
        );
    }

    #[test]
    fn test_key_order_preserved() {
        let out = redact_xapi_clusterd_db(&original().to_string()).unwrap();
        let token = out.find("\"token\"").unwrap();
        let max = out.find("\"max_config_version\"").unwrap();
        assert!(token < max);
    }

    #[test]
    fn test_idempotent() {
        let once = redact_xapi_clusterd_db(&original().to_string()).unwrap();
        assert_eq!(redact_xapi_clusterd_db(&once).unwrap(), once);
    }

    #[test]
    fn test_missing_database() {
        assert_eq!(
            filter_xapi_clusterd_db(Path::new("/does/not/exist")).unwrap(),
            ""
        );
    }

    #[test]
    fn test_invalid_json_propagates() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("db");
        fs::write(&path, "invalid json").unwrap();

        let err = filter_xapi_clusterd_db(&path).unwrap_err();
        let message = format!("{:#}", err);
        assert!(message.contains("filter_xapi_clusterd_db"));
        assert!(message.contains("JSON"));
    }
}
