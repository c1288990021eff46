use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use crate::utils::FastHashMap;

use super::{canonicalize, ReadStream, StreamProvider};

/// An in-memory table of files. Handy for generated content, embedded data and tests.
#[derive(Default)]
pub struct Memory {
    files: RwLock<FastHashMap<PathBuf, Arc<[u8]>>>,
}

impl Memory {
    pub fn new() -> Self {
        Memory {
            files: RwLock::new(FastHashMap::default()),
        }
    }

    /// Adds or replaces the file at `path`.
    pub fn insert<P, T>(&self, path: P, bytes: T)
    where
        P: AsRef<Path>,
        T: Into<Vec<u8>>,
    {
        let bytes: Vec<u8> = bytes.into();
        let bytes: Arc<[u8]> = bytes.into();
        self.files
            .write()
            .unwrap()
            .insert(canonicalize(path), bytes);
    }

    /// Removes the file at `path`, returns true if it was there.
    pub fn remove<P: AsRef<Path>>(&self, path: P) -> bool {
        self.files
            .write()
            .unwrap()
            .remove(&canonicalize(path))
            .is_some()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.files.read().unwrap().len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl StreamProvider for Memory {
    fn open_read(&self, path: &Path) -> Option<Box<dyn ReadStream>> {
        self.files
            .read()
            .unwrap()
            .get(&canonicalize(path))
            .map(|bytes| Box::new(Cursor::new(bytes.clone())) as Box<dyn ReadStream>)
    }

    fn exists(&self, path: &Path) -> bool {
        self.files
            .read()
            .unwrap()
            .contains_key(&canonicalize(path))
    }
}
