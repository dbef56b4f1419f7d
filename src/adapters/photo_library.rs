//! Photo library adapter.
//!
//! Implements [`PhotoLibraryPort`] by writing each capture as
//! `IMG_<sequence>.jpg` under a directory (the SD card mount on device,
//! any directory on the host).  A write refused by the filesystem
//! surfaces as [`ActionError::AuthorizationDenied`].

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::app::ports::{Photo, PhotoLibraryPort};
use crate::error::ActionError;

pub struct FsPhotoLibrary {
    dir: PathBuf,
}

impl FsPhotoLibrary {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        info!("FsPhotoLibrary: saving to {}", dir.display());
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Where photo `sequence` is stored.
    pub fn path_for(&self, sequence: u32) -> PathBuf {
        self.dir.join(format!("IMG_{:05}.jpg", sequence))
    }
}

fn map_io(e: &std::io::Error) -> ActionError {
    match e.kind() {
        ErrorKind::PermissionDenied | ErrorKind::ReadOnlyFilesystem => {
            ActionError::AuthorizationDenied
        }
        _ => ActionError::Io,
    }
}

impl PhotoLibraryPort for FsPhotoLibrary {
    fn save(&mut self, photo: &Photo) -> Result<(), ActionError> {
        fs::create_dir_all(&self.dir).map_err(|e| map_io(&e))?;
        let path = self.path_for(photo.sequence);
        fs::write(&path, &photo.jpeg).map_err(|e| map_io(&e))?;
        debug!("FsPhotoLibrary: wrote {}", path.display());
        Ok(())
    }
}
