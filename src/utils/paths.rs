use crate::object::validate_file_name;
use crate::utils::errors::{ProviderError, Result};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

pub struct TargetPaths;

impl TargetPaths {
    /// Path of a mounted file under the target directory
    pub fn file_path(target: &Path, file_name: &str) -> Result<PathBuf> {
        validate_file_name(file_name)?;
        Ok(target.join(file_name))
    }

    /// Ensure a directory exists
    pub fn ensure_dir_exists(path: &Path) -> Result<()> {
        if !path.exists() {
            fs::create_dir_all(path)?;
        }
        Ok(())
    }

    /// Write one file, created with the requested permissions
    pub fn write_file(path: &Path, content: &[u8], mode: u32) -> Result<()> {
        if let Some(parent) = path.parent() {
            Self::ensure_dir_exists(parent)?;
        }

        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(mode);
        }
        #[cfg(not(unix))]
        let _ = mode;

        let write_error = |e: std::io::Error| {
            ProviderError::Config(format!("failed to write {}: {e}", path.display()))
        };
        let mut file = options.open(path).map_err(write_error)?;

        // open() applies the mode to new files only, narrowed by the umask
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(fs::Permissions::from_mode(mode))?;
        }
        file.write_all(content).map_err(write_error)?;

        tracing::debug!("wrote {} ({} bytes)", path.display(), content.len());
        Ok(())
    }
}
