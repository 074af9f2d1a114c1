// Application state module
// Immutable per-process state shared by every connection

use std::io;
use std::path::PathBuf;

use super::types::Config;
use crate::logger;

/// Application state
///
/// Built once at startup and shared behind an `Arc`; request handling
/// never mutates it, so no locking is involved.
pub struct AppState {
    pub config: Config,
    /// Canonicalized serving root; resolved paths must stay inside it.
    pub root: PathBuf,
}

impl AppState {
    /// Resolve the configured root directory and freeze the state.
    ///
    /// Fails fast when the root does not exist or is not a directory,
    /// rather than answering every request with 404.
    pub fn new(config: Config) -> io::Result<Self> {
        let root = PathBuf::from(&config.server.root_dir).canonicalize()?;
        if !root.is_dir() {
            logger::log_error(&format!(
                "Serving root '{}' is not a directory",
                root.display()
            ));
            return Err(io::Error::new(
                io::ErrorKind::NotADirectory,
                "serving root is not a directory",
            ));
        }

        Ok(Self { config, root })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn test_config(root: &str) -> Config {
        let mut cfg = Config::load_from("definitely-missing-config").expect("defaults");
        cfg.server.root_dir = root.to_string();
        cfg
    }

    #[test]
    fn canonicalizes_existing_root() {
        let tmp = std::env::temp_dir();
        let state = AppState::new(test_config(tmp.to_str().unwrap())).expect("state");
        assert!(state.root.is_absolute());
    }

    #[test]
    fn missing_root_fails_fast() {
        assert!(AppState::new(test_config("/definitely/not/a/real/dir")).is_err());
    }
}
