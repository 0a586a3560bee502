use std::fs::{File, OpenOptions};
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::config::AccessMode;
use crate::error::LoadError;

/// An open image file, owned by the load that acquired it.
///
/// The file is closed by [`ImageHandle::release`] or when the handle is dropped.
#[derive(Debug)]
pub struct ImageHandle {
    file: File,
    path: PathBuf,
}

impl ImageHandle {
    pub fn acquire(path: impl AsRef<Path>, access: AccessMode) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .read(true)
            .write(access == AccessMode::ReadWrite)
            .open(path)
            .map_err(|source| LoadError::ImageNotFound {
                path: path.to_path_buf(),
                source,
            })?;
        log::debug!("opened {} ({:?})", path.display(), access);
        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the whole image into memory.
    pub fn read_image(&mut self) -> Result<Vec<u8>, LoadError> {
        let mut content = Vec::new();
        self.file
            .read_to_end(&mut content)
            .map_err(LoadError::ReadImage)?;
        log::trace!("read {} bytes from {}", content.len(), self.path.display());
        Ok(content)
    }

    pub fn release(self) {
        log::debug!("closing {}", self.path.display());
        drop(self.file);
    }
}
