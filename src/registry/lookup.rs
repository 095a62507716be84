//! Resolution of command names against the host.

use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Answers whether a program can be run on this system.
pub trait CommandLookup: Send + Sync {
    fn resolve(&self, program: &str) -> Option<PathBuf>;
}

/// Looks programs up like a shell: paths with a separator are checked
/// directly, bare names are searched in `PATH`.
#[derive(Debug, Clone)]
pub struct PathLookup {
    search_path: Vec<PathBuf>,
}

impl PathLookup {
    pub fn from_env() -> Self {
        Self::new(env::var_os("PATH").unwrap_or_else(OsString::new))
    }

    pub fn new(path_var: OsString) -> Self {
        Self {
            search_path: env::split_paths(&path_var).collect(),
        }
    }
}

impl Default for PathLookup {
    fn default() -> Self {
        Self::from_env()
    }
}

impl CommandLookup for PathLookup {
    fn resolve(&self, program: &str) -> Option<PathBuf> {
        if program.contains('/') {
            let path = Path::new(program);
            return path.is_file().then(|| path.to_path_buf());
        }
        self.search_path
            .iter()
            .map(|dir| dir.join(program))
            .find(|candidate| candidate.is_file())
    }
}
