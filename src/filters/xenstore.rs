//! Filter for `xenstore-ls` style listings.
//!
//! Lines look like `   vncpasswd = "secret"`, with nesting expressed by
//! indentation or by slash-separated paths.

use regex::Regex;

use crate::constants::REDACTION_MARKER;
use crate::filters::Filter;

lazy_static::lazy_static! {
    static ref ENTRY: Regex = Regex::new(r#"^(\s*)(\S+)(\s*=\s*")(.*)("\s*)$"#).unwrap();
}

pub fn default_secret_keys() -> Vec<String> {
    ["vncpasswd", "password", "passwd"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Redact the value of every entry whose last path component is in `keys`
pub fn redact_xenstore_ls(text: &str, keys: &[String]) -> String {
    let mut out = String::with_capacity(text.len());
    for line in text.split_inclusive('\n') {
        let (body, newline) = match line.strip_suffix('\n') {
            Some(body) => (body, "\n"),
            None => (line, ""),
        };
        match ENTRY.captures(body) {
            Some(caps) => {
                let name = caps[2].rsplit('/').next().unwrap_or_default();
                if keys.iter().any(|k| k == name) {
                    out.push_str(&caps[1]);
                    out.push_str(&caps[2]);
                    out.push_str(&caps[3]);
                    out.push_str(REDACTION_MARKER);
                    out.push_str(&caps[5]);
                } else {
                    out.push_str(body);
                }
            }
            None => out.push_str(body),
        }
        out.push_str(newline);
    }
    out
}

/// Line filter redacting the values of `keys`
pub fn xenstore_filter(keys: &[String]) -> Filter {
    let keys = keys.to_vec();
    Filter::line("filter_xenstore_ls", move |text| {
        redact_xenstore_ls(text, &keys)
    })
}
