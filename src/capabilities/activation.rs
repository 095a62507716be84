use std::collections::BTreeSet;

use log::{debug, warn};

use super::Capability;

/// The set of capabilities selected for the current run.
///
/// Built once from CLI input and never changed afterwards; every registry
/// operation consults it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivationSet {
    entries: BTreeSet<String>,
}

impl ActivationSet {
    /// Resolve the active capabilities.
    ///
    /// With an explicit list, every name known to `catalogue` is activated and
    /// unknown names are logged and ignored. Without one, every capability
    /// marked `checked` is activated.
    pub fn resolve(explicit: Option<&[String]>, catalogue: &[Capability]) -> Self {
        let entries = match explicit {
            Some(names) => names
                .iter()
                .filter(|name| {
                    let known = catalogue.iter().any(|cap| &cap.key == *name);
                    if !known {
                        warn!("Ignoring unknown capability: {}", name);
                    }
                    known
                })
                .cloned()
                .collect(),
            None => catalogue
                .iter()
                .filter(|cap| cap.checked)
                .map(|cap| cap.key.clone())
                .collect(),
        };

        let set = Self { entries };
        debug!("Activated capabilities: {:?}", set.entries);
        set
    }

    /// Activate exactly the given keys without consulting a catalogue
    pub fn from_keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            entries: keys.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(&self, capability: &str) -> bool {
        self.entries.contains(capability)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }
}
