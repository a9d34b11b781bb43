//! Sweep storage API.
//!
//! Layout of an output directory:
//!
//! ```text
//! <root>/manifest.json
//! <root>/FINALDATA.json
//! <root>/TEMP/INCOMPLETEDATA_<index>.json
//! ```
//!
//! A checkpoint is written after every held setpoint, so a crashed sweep
//! can be reloaded from the highest-numbered partial file.

use crate::types::{RunManifest, StageResult};
use crate::{ResultsError, ResultsResult};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

const PARTIAL_DIR: &str = "TEMP";
const PARTIAL_PREFIX: &str = "INCOMPLETEDATA_";
const FINAL_FILE: &str = "FINALDATA.json";
const MANIFEST_FILE: &str = "manifest.json";

/// Durable destination for sweep results.
pub trait ResultSink {
    /// Persist everything recorded so far. `index` increases by one per call.
    fn save_partial(&mut self, results: &[StageResult], index: usize) -> ResultsResult<()>;

    /// Persist the complete sweep.
    fn save_final(&mut self, results: &[StageResult]) -> ResultsResult<()>;

    /// Record run bookkeeping. Sinks without a manifest ignore it.
    fn record_manifest(&mut self, _manifest: &RunManifest) -> ResultsResult<()> {
        Ok(())
    }
}

#[derive(Clone, Debug)]
pub struct RunStore {
    root_dir: PathBuf,
}

impl RunStore {
    /// Open (and create if needed) an output directory.
    pub fn new(root_dir: PathBuf) -> ResultsResult<Self> {
        fs::create_dir_all(root_dir.join(PARTIAL_DIR))?;
        Ok(Self { root_dir })
    }

    /// Open an existing output directory without creating anything.
    pub fn open(root_dir: PathBuf) -> ResultsResult<Self> {
        if !root_dir.is_dir() {
            return Err(ResultsError::NotFound {
                path: root_dir.display().to_string(),
            });
        }
        Ok(Self { root_dir })
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    pub fn partial_path(&self, index: usize) -> PathBuf {
        self.root_dir
            .join(PARTIAL_DIR)
            .join(format!("{PARTIAL_PREFIX}{index}.json"))
    }

    pub fn final_path(&self) -> PathBuf {
        self.root_dir.join(FINAL_FILE)
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.root_dir.join(MANIFEST_FILE)
    }

    pub fn save_manifest(&self, manifest: &RunManifest) -> ResultsResult<()> {
        write_json(&self.manifest_path(), manifest)
    }

    pub fn load_manifest(&self) -> ResultsResult<RunManifest> {
        read_json(&self.manifest_path())
    }

    pub fn load_final(&self) -> ResultsResult<Vec<StageResult>> {
        read_json(&self.final_path())
    }

    /// Indices of all partial checkpoints, ascending.
    pub fn partial_indices(&self) -> ResultsResult<Vec<usize>> {
        let dir = self.root_dir.join(PARTIAL_DIR);
        let mut indices = Vec::new();
        if !dir.exists() {
            return Ok(indices);
        }

        for entry in fs::read_dir(dir)? {
            let name = entry?.file_name().to_string_lossy().to_string();
            if let Some(index) = name
                .strip_prefix(PARTIAL_PREFIX)
                .and_then(|rest| rest.strip_suffix(".json"))
                .and_then(|digits| digits.parse::<usize>().ok())
            {
                indices.push(index);
            }
        }
        indices.sort_unstable();
        Ok(indices)
    }

    /// Highest-numbered checkpoint and its contents, if any.
    pub fn load_latest_partial(&self) -> ResultsResult<Option<(usize, Vec<StageResult>)>> {
        match self.partial_indices()?.last() {
            Some(&index) => Ok(Some((index, read_json(&self.partial_path(index))?))),
            None => Ok(None),
        }
    }
}

impl ResultSink for RunStore {
    fn save_partial(&mut self, results: &[StageResult], index: usize) -> ResultsResult<()> {
        let path = self.partial_path(index);
        write_json(&path, &results)?;
        debug!(index, path = %path.display(), "checkpoint written");
        Ok(())
    }

    fn save_final(&mut self, results: &[StageResult]) -> ResultsResult<()> {
        write_json(&self.final_path(), &results)
    }

    fn record_manifest(&mut self, manifest: &RunManifest) -> ResultsResult<()> {
        self.save_manifest(manifest)
    }
}

/// Write through a temporary file so a crash never leaves a torn file.
fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> ResultsResult<()> {
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, serde_json::to_string_pretty(value)?)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> ResultsResult<T> {
    if !path.exists() {
        return Err(ResultsError::NotFound {
            path: path.display().to_string(),
        });
    }
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}
