//! Upload tree layout.
//!
//! ```text
//! <upload_root>/
//!   temp_<name>      raw generation output (scratch)
//!   overlay_<name>   profile overlay output (scratch)
//!   posters/<name>   final posters
//!   logos/<name>     uploaded company logos
//! ```

use crate::compositor::LogoResolver;
use crate::config::StorageConfig;
use crate::constants::{ALLOWED_UPLOAD_EXTENSIONS, LOGOS_DIR, POSTERS_DIR};
use crate::error::{InputError, PosterError};
use crate::raster;
use std::path::{Path, PathBuf};

/// Fresh collision-free filename: a v4 UUID plus `extension`.
pub fn generate_filename(extension: &str) -> String {
    format!(
        "{}.{}",
        uuid::Uuid::new_v4(),
        extension.trim_start_matches('.')
    )
}

/// Lowercased extension of `name` if it is an accepted upload type.
fn allowed_extension(name: &str) -> Option<String> {
    let ext = Path::new(name).extension()?.to_str()?.to_ascii_lowercase();
    ALLOWED_UPLOAD_EXTENSIONS
        .contains(&ext.as_str())
        .then_some(ext)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageLayout {
    upload_root: PathBuf,
}

impl StorageLayout {
    pub fn new(upload_root: impl Into<PathBuf>) -> Self {
        Self {
            upload_root: upload_root.into(),
        }
    }

    pub fn from_config(config: &StorageConfig) -> Self {
        Self::new(config.upload_root.clone())
    }

    pub fn upload_root(&self) -> &Path {
        &self.upload_root
    }

    pub fn posters_dir(&self) -> PathBuf {
        self.upload_root.join(POSTERS_DIR)
    }

    pub fn logos_dir(&self) -> PathBuf {
        self.upload_root.join(LOGOS_DIR)
    }

    pub fn poster_path(&self, filename: &str) -> PathBuf {
        self.posters_dir().join(filename)
    }

    /// Scratch file at the upload root, e.g. `temp_<filename>`.
    pub fn scratch_path(&self, prefix: &str, filename: &str) -> PathBuf {
        self.upload_root.join(format!("{}_{}", prefix, filename))
    }

    /// Store uploaded bytes in `dir` under a fresh name, keeping the extension.
    ///
    /// Returns the generated filename. Only jpg, jpeg and png uploads are
    /// accepted (case-insensitive).
    pub fn save_upload(
        &self,
        bytes: &[u8],
        original_name: &str,
        dir: &Path,
    ) -> Result<String, PosterError> {
        let ext = allowed_extension(original_name).ok_or_else(|| {
            PosterError::from(InputError::UnsupportedUpload {
                filename: original_name.to_string(),
            })
        })?;

        let filename = generate_filename(&ext);
        let path = dir.join(&filename);
        raster::write_atomic(&path, bytes).map_err(|e| PosterError::io(&path, e))?;

        tracing::info!(
            original = original_name,
            path = %path.display(),
            bytes = bytes.len(),
            "Upload stored"
        );
        Ok(filename)
    }
}

impl LogoResolver for StorageLayout {
    fn resolve_logo(&self, reference: &str) -> Option<PathBuf> {
        let name = Path::new(reference).file_name()?;
        let path = self.logos_dir().join(name);
        path.is_file().then_some(path)
    }
}
