use std::fs;
use std::path::{Path, PathBuf};

use crate::errors::*;

use super::{ReadStream, StreamProvider};

/// Maps a directory of the local host filesystem into resource paths.
#[derive(Debug, Clone)]
pub struct Directory {
    root: PathBuf,
}

impl Directory {
    pub fn new<T: Into<PathBuf>>(root: T) -> Result<Self> {
        let root = root.into();
        info!("Creates directory based stream provider at {:?}.", root);

        let metadata = fs::metadata(&root)?;
        if metadata.is_dir() {
            Ok(Directory { root })
        } else {
            Err(Error::NotFound(root))
        }
    }

    #[inline]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl StreamProvider for Directory {
    fn open_read(&self, location: &Path) -> Option<Box<dyn ReadStream>> {
        let location = self.root.join(location);
        match fs::File::open(&location) {
            Ok(file) => Some(Box::new(file)),
            Err(_) => None,
        }
    }

    fn exists(&self, location: &Path) -> bool {
        self.root.join(location).is_file()
    }
}
