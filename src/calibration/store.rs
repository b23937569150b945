//! Versioned calibration artifacts on disk
//!
//! Layout under the calibration directory:
//! - `calibration_<version>.json`, one per published set
//! - `CURRENT`, holding the promoted version
//!
//! Both files are written to a temporary file in the same directory and
//! renamed into place, so a reader never sees a half-written artifact.
//!
//! A store built `with_constants` also refuses sets sampled under other
//! metric constants.

use anyhow::{Context, Result};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

use super::table::CalibrationSet;
use super::CalibrationError;
use crate::config::MetricConstants;

const CURRENT_FILE: &str = "CURRENT";
const FILE_PREFIX: &str = "calibration_";
const FILE_SUFFIX: &str = ".json";

#[derive(Debug, Clone)]
pub struct CalibrationStore {
    root: PathBuf,
    constants: Option<MetricConstants>,
}

impl CalibrationStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            constants: None,
        }
    }

    /// Only load (and so only promote) sets sampled with `constants`
    pub fn with_constants(mut self, constants: MetricConstants) -> Self {
        self.constants = Some(constants);
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Artifact path for `version`. Version ids are plain tokens and can
    /// never name a file outside the store.
    pub fn path_for(&self, version: &str) -> Result<PathBuf, CalibrationError> {
        check_version_id(version)?;
        Ok(self.root.join(format!("{}{}{}", FILE_PREFIX, version, FILE_SUFFIX)))
    }

    /// Write a new version. Does not change which version is current, and
    /// refuses to overwrite a version that was already published.
    pub fn publish(&self, set: &CalibrationSet) -> Result<PathBuf> {
        set.validate()?;
        let path = self.path_for(&set.version)?;
        fs::create_dir_all(&self.root)
            .with_context(|| format!("Failed to create calibration dir: {:?}", self.root))?;

        let mut tmp = NamedTempFile::new_in(&self.root)?;
        serde_json::to_writer_pretty(&mut tmp, set)?;
        tmp.flush()?;
        tmp.as_file().sync_all()?;
        tmp.persist_noclobber(&path)
            .with_context(|| format!("Calibration version {} already exists", set.version))?;

        info!(version = %set.version, path = ?path, "Published calibration");
        Ok(path)
    }

    /// Make `version` the one scorers load. The artifact is read and
    /// validated first so a broken file can never become current.
    pub fn promote(&self, version: &str) -> Result<()> {
        self.load(version)?;

        let mut tmp = NamedTempFile::new_in(&self.root)?;
        writeln!(tmp, "{}", version)?;
        tmp.as_file().sync_all()?;
        tmp.persist(self.root.join(CURRENT_FILE))?;

        info!(version, "Promoted calibration");
        Ok(())
    }

    pub fn current_version(&self) -> Result<Option<String>> {
        let path = self.root.join(CURRENT_FILE);
        if !path.exists() {
            return Ok(None);
        }
        let version = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {:?}", path))?
            .trim()
            .to_string();
        Ok((!version.is_empty()).then_some(version))
    }

    pub fn load(&self, version: &str) -> Result<CalibrationSet> {
        let path = self.path_for(version)?;
        if !path.exists() {
            return Err(CalibrationError::UnknownVersion(version.to_string()).into());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read calibration file: {:?}", path))?;
        let set: CalibrationSet = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse calibration file: {:?}", path))?;
        set.validate()?;
        if let Some(constants) = &self.constants {
            set.check_constants(constants)?;
        }

        debug!(version, profiles = set.profiles.len(), "Loaded calibration");
        Ok(set)
    }

    pub fn load_current(&self) -> Result<CalibrationSet> {
        let version = self
            .current_version()?
            .ok_or(CalibrationError::NoCurrentVersion)?;
        self.load(&version)
    }

    /// Published versions, oldest first
    pub fn list_versions(&self) -> Result<Vec<String>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }

        let mut versions = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let name = entry?.file_name();
            let Some(name) = name.to_str() else { continue };
            if let Some(version) = name
                .strip_prefix(FILE_PREFIX)
                .and_then(|rest| rest.strip_suffix(FILE_SUFFIX))
            {
                versions.push(version.to_string());
            }
        }
        versions.sort();
        Ok(versions)
    }
}

/// ASCII letters, digits, `-` and `_` only
fn check_version_id(version: &str) -> Result<(), CalibrationError> {
    let valid = !version.is_empty()
        && version
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');
    if valid {
        Ok(())
    } else {
        Err(CalibrationError::InvalidVersion(version.to_string()))
    }
}
