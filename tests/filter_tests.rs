//! Integration tests for the redaction filters.
//!
//! These tests drive the filters the way the collector does: through their
//! file-backed entry points and the named filter lookup.

use std::collections::BTreeSet;
use std::fs;

use anyhow::Result;
use proptest::prelude::*;
use tempfile::TempDir;

use diag_collector::filters::db::{dump_xapi_db, filter_xapi_db, parse_document, Element};
use diag_collector::filters::{builtin_filter, clusterd, snmp, DbFilter, DbRedactionRules};

const XAPI_DB: &str = r#"<?xml version="1.0" ?>
<database>
    <manifest><pair key="schema_major_vsn" value="5"/></manifest>
    <table name="secret">
        <row ref="OpaqueRef:1" uuid="s1" value="hunter2"/>
    </table>
    <table name="Cluster">
        <row ref="OpaqueRef:2" cluster_token="tok3n" pool_auto_join="true"/>
    </table>
    <table name="PBD">
        <row ref="OpaqueRef:3" device_config="((&quot;location&quot; &quot;//srv/share&quot;) (&quot;cifspassword&quot; &quot;pw&quot;))"/>
    </table>
    <table name="VM">
        <row ref="OpaqueRef:4" name__label="vm" NVRAM="((&apos;EFI-variables&apos;%.&apos;blob&apos;))"/>
    </table>
</database>
"#;

#[test]
fn test_database_dump_through_db_conf() -> Result<()> {
    let dir = TempDir::new()?;
    let db = dir.path().join("state.db");
    fs::write(&db, XAPI_DB)?;
    let db_conf = dir.path().join("db.conf");
    fs::write(&db_conf, format!("[{}]\nmode:write_only\nformat:xml\n", db.display()))?;

    let out = dump_xapi_db(&db_conf, &DbFilter::default())?;
    for secret in ["hunter2", "tok3n", "&quot;pw&quot;", "blob"] {
        assert!(!out.contains(secret), "{} leaked", secret);
    }
    assert!(out.contains("//srv/share"));
    assert!(out.contains("name__label=\"vm\""));

    // The source database is never rewritten
    assert_eq!(fs::read_to_string(&db)?, XAPI_DB);
    Ok(())
}

#[test]
fn test_named_filter_matches_function() -> Result<()> {
    let filter = builtin_filter("xapi-db", &DbRedactionRules::default(), &[]).unwrap();
    let via_filter = String::from_utf8(filter.apply("xenserver-databases", XAPI_DB.as_bytes())?)?;
    assert_eq!(via_filter, filter_xapi_db(XAPI_DB)?);
    Ok(())
}

#[test]
fn test_malformed_database_names_xml() {
    let err = filter_xapi_db("<database><table></database>").unwrap_err();
    assert!(format!("{:#}", err).contains("XML"));
}

#[test]
fn test_clusterd_file_roundtrip() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("db");
    fs::write(
        &path,
        r#"{"token": "t", "cluster_config": {"authkey": "k", "pems": {"blobs": "b"}}, "max_config_version": 3}"#,
    )?;

    let out: serde_json::Value = serde_json::from_str(&clusterd::filter_xapi_clusterd_db(&path)?)?;
    assert_eq!(out["token"], "REMOVED");
    assert_eq!(out["cluster_config"]["authkey"], "REMOVED");
    assert_eq!(out["cluster_config"]["pems"]["blobs"], "REMOVED");
    assert_eq!(out["max_config_version"], 3);
    Ok(())
}

#[test]
fn test_snmp_files() -> Result<()> {
    let dir = TempDir::new()?;
    let xs = dir.path().join("snmp.xs.conf");
    fs::write(
        &xs,
        "\"community\": \"INITIAL_STR\",\n\"authentication_key\": \"INITIAL_STR\",\n\"privacy_key\": \"INITIAL_STR\",",
    )?;
    assert_eq!(
        snmp::filter_snmp_xs_conf(&xs)?,
        "\"community\": \"REMOVED\",\n\"authentication_key\": \"REMOVED\",\n\"privacy_key\": \"REMOVED\","
    );

    let daemon = dir.path().join("snmpd.xs.conf");
    fs::write(&daemon, "com2sec notConfigUser default INITIAL_STR")?;
    assert_eq!(
        snmp::filter_snmpd_xs_conf(&daemon)?,
        "com2sec notConfigUser default REMOVED"
    );
    Ok(())
}

/// Tag names, attribute keys and element children, ignoring text
fn assert_same_shape(before: &Element, after: &Element, redacted_keys: &BTreeSet<&str>) {
    assert_eq!(before.name, after.name);

    let keys_before: BTreeSet<&str> = before.attributes.iter().map(|(k, _)| k.as_str()).collect();
    let keys_after: BTreeSet<&str> = after.attributes.iter().map(|(k, _)| k.as_str()).collect();
    assert!(keys_before.is_subset(&keys_after));
    assert!(keys_after
        .difference(&keys_before)
        .all(|k| redacted_keys.contains(k)));

    let children_before: Vec<&Element> = before.child_elements().collect();
    let children_after: Vec<&Element> = after.child_elements().collect();
    assert_eq!(children_before.len(), children_after.len());
    for (b, a) in children_before.iter().zip(children_after.iter()) {
        assert_same_shape(b, a, redacted_keys);
    }
}

fn attr_value() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-zA-Z0-9 ._:/-]{0,12}",
        Just("(('EFI-variables'%.'secret'))".to_string()),
        Just("('NVRAM'%.'((\\'EFI-variables\\'%.\\'x\\'))')".to_string()),
        Just("(('a'%.'b') ('c'%.'d'".to_string()),
        Just("((\"location\" \"//x\") (\"password\" \"p\\\"w\"))".to_string()),
        Just("<&>\"'".to_string()),
    ]
}

fn row() -> impl Strategy<Value = String> {
    (
        prop::collection::vec(
            (
                prop::sample::select(vec![
                    "uuid",
                    "NVRAM",
                    "snapshot_metadata",
                    "value",
                    "cluster_token",
                    "device_config",
                    "name__label",
                ]),
                attr_value(),
            ),
            0..4,
        ),
        prop::option::of("[a-z0-9]{0,8}"),
    )
        .prop_map(|(attrs, child)| {
            let mut seen = BTreeSet::new();
            let mut row = String::from("<row");
            for (key, value) in attrs {
                if seen.insert(key) {
                    let escaped = value
                        .replace('&', "&amp;")
                        .replace('<', "&lt;")
                        .replace('>', "&gt;")
                        .replace('"', "&quot;");
                    row.push_str(&format!(" {}=\"{}\"", key, escaped));
                }
            }
            match child {
                Some(text) => row.push_str(&format!("><value>{}</value></row>", text)),
                None => row.push_str("/>"),
            }
            row
        })
}

fn database() -> impl Strategy<Value = String> {
    prop::collection::vec(
        (
            prop::sample::select(vec!["VM", "secret", "PBD", "Cluster", "host"]),
            prop::collection::vec(row(), 0..4),
        ),
        0..5,
    )
    .prop_map(|tables| {
        let mut doc = String::from("<?xml version=\"1.0\" ?>\n<database>\n");
        for (name, rows) in tables {
            doc.push_str(&format!("  <table name=\"{}\">", name));
            for row in rows {
                doc.push_str(&row);
            }
            doc.push_str("</table>\n");
        }
        doc.push_str("</database>\n");
        doc
    })
}

proptest! {
    #[test]
    fn prop_db_filter_idempotent(doc in database()) {
        let once = filter_xapi_db(&doc).unwrap();
        let twice = filter_xapi_db(&once).unwrap();
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn prop_db_filter_preserves_structure(doc in database()) {
        let out = filter_xapi_db(&doc).unwrap();
        let before = parse_document(&doc).unwrap();
        let after = parse_document(&out).unwrap();
        let redacted: BTreeSet<&str> = ["value", "cluster_token"].into_iter().collect();
        assert_same_shape(&before.root, &after.root, &redacted);
    }
}
