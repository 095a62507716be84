//! Filters for the SNMP configuration files.
//!
//! Each filter exists in two forms: a pure text version and a file-backed
//! version that reads the whole file first. A missing file yields an empty
//! string.

use std::path::Path;

use anyhow::Result;
use lazy_static::lazy_static;
use regex::Regex;

use crate::constants::REDACTION_MARKER;
use crate::filters::read_optional;

lazy_static! {
    /// `"community": "..."` and the two key entries of snmp.xs.conf
    static ref XS_CONF_SECRET: Regex = Regex::new(
        r#"("(?:community|authentication_key|privacy_key)"[ \t]*:[ \t]*")(?:[^"\\\n]|\\.)*(")"#
    )
    .unwrap();

    /// Trailing community token of a `com2sec` directive
    static ref COM2SEC_SECRET: Regex =
        Regex::new(r"(?m)^([ \t]*com2sec[ \t]+\S+[ \t]+\S+[ \t]+)\S+").unwrap();

    /// Authentication and privacy keys of a `usmUser` line: fields 9 and 11
    static ref USM_USER_KEYS: Regex = Regex::new(
        r"(?m)^([ \t]*usmUser(?:[ \t]+\S+){7}[ \t]+)\S+([ \t]+\S+[ \t]+)\S+"
    )
    .unwrap();
}

/// Redact the community string and both keys of `snmp.xs.conf`
pub fn redact_snmp_xs_conf(text: &str) -> String {
    XS_CONF_SECRET
        .replace_all(text, format!("${{1}}{}${{2}}", REDACTION_MARKER))
        .into_owned()
}

/// Redact the community token of every `com2sec` line
pub fn redact_snmpd_xs_conf(text: &str) -> String {
    COM2SEC_SECRET
        .replace_all(text, format!("${{1}}{}", REDACTION_MARKER))
        .into_owned()
}

/// Redact the authentication and privacy keys of every `usmUser` line
pub fn redact_snmpd_conf(text: &str) -> String {
    USM_USER_KEYS
        .replace_all(
            text,
            format!("${{1}}{marker}${{2}}{marker}", marker = REDACTION_MARKER),
        )
        .into_owned()
}

pub fn filter_snmp_xs_conf(path: &Path) -> Result<String> {
    Ok(read_optional(path)?.map_or_else(String::new, |text| redact_snmp_xs_conf(&text)))
}

pub fn filter_snmpd_xs_conf(path: &Path) -> Result<String> {
    Ok(read_optional(path)?.map_or_else(String::new, |text| redact_snmpd_xs_conf(&text)))
}

pub fn filter_snmpd_conf(path: &Path) -> Result<String> {
    Ok(read_optional(path)?.map_or_else(String::new, |text| redact_snmpd_conf(&text)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const USM_USER: &str = "usmUser 1 3 0x80001f8880f369b576d8b2a46500000000 0x7872746d69612d30372d3035 \
        0x7872746d69612d30372d3035 NULL .1.3.6.1.6.3.10.1.1.3 INITIAL_STR .1.3.6.1.6.3.10.1.2.2 INITIAL_STR 0x";

    #[test]
    fn test_snmp_xs_conf() {
        let input = "\n        \"community\": \"INITIAL_STR\",\n        \"authentication_key\": \"INITIAL_STR\",\n        \"privacy_key\": \"INITIAL_STR\",\n    ";
        let expected = "\n        \"community\": \"REMOVED\",\n        \"authentication_key\": \"REMOVED\",\n        \"privacy_key\": \"REMOVED\",\n    ";
        assert_eq!(redact_snmp_xs_conf(input), expected);
    }

    #[test]
    fn test_snmp_xs_conf_other_keys_untouched() {
        let input = "\"community\": \"public\",\n\"enabled\": \"yes\",\n\"privacy_key\": \"\",";
        assert_eq!(
            redact_snmp_xs_conf(input),
            "\"community\": \"REMOVED\",\n\"enabled\": \"yes\",\n\"privacy_key\": \"REMOVED\","
        );
    }

    #[test]
    fn test_snmp_xs_conf_escaped_quote_in_value() {
        let out = redact_snmp_xs_conf(r#""community": "pub\"secret","#);
        assert_eq!(out, r#""community": "REMOVED","#);

        let out = redact_snmp_xs_conf(r#""privacy_key": "a\\b\"c\"d", "x": "y""#);
        assert_eq!(out, r#""privacy_key": "REMOVED", "x": "y""#);
    }

    #[test]
    fn test_com2sec() {
        assert_eq!(
            redact_snmpd_xs_conf("com2sec notConfigUser default INITIAL_STR"),
            "com2sec notConfigUser default REMOVED"
        );
    }

    #[test]
    fn test_com2sec_keeps_other_lines() {
        let input = "# comment com2sec a b c\nsyslocation rack1\ncom2sec ro 10.0.0.0/8 secret\n";
        assert_eq!(
            redact_snmpd_xs_conf(input),
            "# comment com2sec a b c\nsyslocation rack1\ncom2sec ro 10.0.0.0/8 REMOVED\n"
        );
    }

    #[test]
    fn test_usm_user() {
        let expected = "usmUser 1 3 0x80001f8880f369b576d8b2a46500000000 0x7872746d69612d30372d3035 \
            0x7872746d69612d30372d3035 NULL .1.3.6.1.6.3.10.1.1.3 REMOVED .1.3.6.1.6.3.10.1.2.2 REMOVED 0x";
        assert_eq!(redact_snmpd_conf(USM_USER), expected);
    }

    #[test]
    fn test_filters_are_idempotent() {
        let once = redact_snmpd_conf(USM_USER);
        assert_eq!(redact_snmpd_conf(&once), once);

        let once = redact_snmpd_xs_conf("com2sec a b c");
        assert_eq!(redact_snmpd_xs_conf(&once), once);

        let once = redact_snmp_xs_conf("\"community\": \"x\"");
        assert_eq!(redact_snmp_xs_conf(&once), once);
    }

    #[test]
    fn test_file_backed_filters() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("snmpd.xs.conf");
        fs::write(&path, "com2sec notConfigUser default INITIAL_STR").unwrap();

        assert_eq!(
            filter_snmpd_xs_conf(&path).unwrap(),
            "com2sec notConfigUser default REMOVED"
        );
        // The source file itself is never rewritten
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "com2sec notConfigUser default INITIAL_STR"
        );
    }

    #[test]
    fn test_missing_file_is_empty() {
        let missing = Path::new("/does/not/exist/snmp.xs.conf");
        assert_eq!(filter_snmp_xs_conf(missing).unwrap(), "");
        assert_eq!(filter_snmpd_xs_conf(missing).unwrap(), "");
        assert_eq!(filter_snmpd_conf(missing).unwrap(), "");
    }
}
