use anyhow::{Context, Result};
use serde_json::json;
use uuid::Uuid;

use crate::models::{CollectedEntry, OmittedEntry};

/// Create a JSON summary of the collection.
///
/// Lists every member with its size and SHA-256 so the bundle can be
/// verified after it leaves the host, plus every task that was omitted.
///
/// # Example Output
///
/// ```json
/// {
///   "collection_id": "550e8400-e29b-41d4-a716-446655440000",
///   "hostname": "xs-host-01",
///   "collection_time": "2024-01-15T14:30:52Z",
///   "collector_version": "0.3.0",
///   "capabilities": ["pam", "xenserver-config"],
///   "member_count": 12,
///   "members": [...],
///   "omitted": [...]
/// }
/// ```
pub fn create_collection_summary(
    hostname: &str,
    timestamp: &str,
    capabilities: &[&str],
    members: &[CollectedEntry],
    omitted: &[OmittedEntry],
) -> Result<String> {
    let summary = json!({
        "collection_id": Uuid::new_v4().to_string(),
        "hostname": hostname,
        "collection_time": timestamp,
        "collector_version": env!("CARGO_PKG_VERSION"),
        "capabilities": capabilities,
        "member_count": members.len(),
        "members": members,
        "omitted": omitted,
    });

    serde_json::to_string_pretty(&summary).context("Failed to serialize collection summary to JSON")
}
