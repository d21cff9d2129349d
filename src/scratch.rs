use crate::{ConvertedArtifact, Error, Result};
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, info};

/// Flat directory holding relocated images and produced artifacts.
///
/// A shared space is reused across requests and must be purged between sessions, since
/// relocated image names only encode page and sequence. An isolated space is a fresh
/// sub-directory owned by one request and removed when the value is dropped.
#[derive(Debug)]
pub struct ScratchSpace {
    dir: PathBuf,
    _owned: Option<TempDir>,
}

impl ScratchSpace {
    /// Uses `dir` directly, creating it if missing.
    pub fn shared(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir, _owned: None })
    }

    /// Creates a unique sub-directory of `root` for a single request. The directory and
    /// everything in it is removed when the space is dropped.
    pub fn isolated(root: impl AsRef<Path>) -> Result<Self> {
        Self::unique_in(root.as_ref(), false)
    }

    /// Like [`ScratchSpace::isolated`], but the directory outlives the value.
    pub fn isolated_persistent(root: impl AsRef<Path>) -> Result<Self> {
        Self::unique_in(root.as_ref(), true)
    }

    fn unique_in(root: &Path, keep: bool) -> Result<Self> {
        fs::create_dir_all(root)?;
        let owned = tempfile::Builder::new().prefix("request-").keep(keep).tempdir_in(root)?;
        let dir = owned.path().to_path_buf();
        debug!("Isolated scratch space at {:?}", dir);
        Ok(Self { dir, _owned: Some(owned) })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Removes every file in the directory and returns how many were removed.
    pub fn purge(&self) -> Result<usize> {
        let mut removed = 0;
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                fs::remove_file(entry.path())?;
                removed += 1;
            }
        }
        info!("Purged {} files from {:?}", removed, self.dir);
        Ok(removed)
    }

    /// `image_<page>_<sequence>.<extension>`
    pub fn image_path(&self, page_index: usize, sequence_in_page: usize, extension: &str) -> PathBuf {
        self.dir.join(format!("image_{}_{}.{}", page_index, sequence_in_page, extension))
    }

    /// Writes an extracted image, overwriting any previous file with the same name.
    pub fn store_image(&self, page_index: usize, sequence_in_page: usize, extension: &str, bytes: &[u8]) -> Result<PathBuf> {
        let path = self.image_path(page_index, sequence_in_page, extension);
        fs::write(&path, bytes).map_err(|source| Error::ImagePersistFailure { path: path.clone(), source })?;
        Ok(path)
    }

    /// Where an artifact called `filename` is stored. Directory components are ignored.
    pub fn artifact_path(&self, filename: &str) -> PathBuf {
        let name = Path::new(filename).file_name().unwrap_or(OsStr::new(filename));
        self.dir.join(name)
    }

    pub fn store_artifact(&self, artifact: &ConvertedArtifact) -> Result<PathBuf> {
        let path = self.artifact_path(&artifact.filename);
        fs::write(&path, &artifact.bytes)?;
        debug!("Stored {} ({} bytes)", path.display(), artifact.bytes.len());
        Ok(path)
    }

    pub fn read_artifact(&self, filename: &str) -> Result<Vec<u8>> {
        Ok(fs::read(self.artifact_path(filename))?)
    }
}
