use serde::{Deserialize, Serialize};

/// One member written into the output directory.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CollectedEntry {
    /// Path of the member relative to the output directory
    pub member: String,
    pub label: String,
    pub capability: String,
    pub size: u64,
    pub sha256: String,
    /// Name of the redaction filter applied, if any
    pub filter: Option<String>,
    pub collection_time: String,
}

/// A task that produced no member, with the reason it was dropped.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct OmittedEntry {
    pub label: String,
    pub capability: String,
    pub reason: String,
}
