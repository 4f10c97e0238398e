//! Best-effort local cache of the participant identifier and the last
//! completed result. Nothing here is authoritative.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use dspan_core::TestResults;

pub const PARTICIPANT_KEY: &str = "participant_id";
pub const RESULTS_KEY: &str = "test_results.json";

#[derive(Debug, Clone)]
pub struct SessionStore {
    dir: PathBuf,
}

impl SessionStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn save_participant(&self, id: &str) -> Result<()> {
        self.write(PARTICIPANT_KEY, id.as_bytes())
    }

    pub fn load_participant(&self) -> Result<Option<String>> {
        Ok(self
            .read(PARTICIPANT_KEY)?
            .map(|bytes| String::from_utf8_lossy(&bytes).trim().to_owned())
            .filter(|id| !id.is_empty()))
    }

    pub fn save_results(&self, results: &TestResults) -> Result<()> {
        let json = serde_json::to_vec_pretty(results).context("serializing results")?;
        self.write(RESULTS_KEY, &json)
    }

    pub fn load_results(&self) -> Result<Option<TestResults>> {
        match self.read(RESULTS_KEY)? {
            Some(bytes) => {
                let results = serde_json::from_slice(&bytes)
                    .with_context(|| format!("parsing {}", self.path(RESULTS_KEY).display()))?;
                Ok(Some(results))
            }
            None => Ok(None),
        }
    }

    /// Removes both keys. Missing entries are not an error.
    pub fn clear(&self) -> Result<()> {
        for key in [PARTICIPANT_KEY, RESULTS_KEY] {
            let path = self.path(key);
            match fs::remove_file(&path) {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(e).with_context(|| format!("removing {}", path.display())),
            }
        }
        Ok(())
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }

    fn write(&self, key: &str, bytes: &[u8]) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("creating {}", self.dir.display()))?;
        let path = self.path(key);
        fs::write(&path, bytes).with_context(|| format!("writing {}", path.display()))
    }

    fn read(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path(key);
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("reading {}", path.display())),
        }
    }
}
