//! Pluggable sources of byte streams.
//!
//! The cache does not know anything about filesystems, archives or the network. It asks each
//! registered `StreamProvider` in order to open a path and uses the first stream it gets.

pub mod directory;
pub use self::directory::Directory;

pub mod memory;
pub use self::memory::Memory;

use std::io::{Read, Seek};
use std::path::{Component, Path, PathBuf};

/// A readable and seekable byte stream.
pub trait ReadStream: Read + Seek + Send {}

impl<T: Read + Seek + Send> ReadStream for T {}

pub trait StreamProvider: Send + Sync + 'static {
    /// Opens a readable stream at `path`, or returns `None` if this provider does not have it.
    fn open_read(&self, path: &Path) -> Option<Box<dyn ReadStream>>;

    /// Checks if the file exists.
    fn exists(&self, path: &Path) -> bool {
        self.open_read(path).is_some()
    }
}

/// Canonicalizes a resource path lexically: backslashes become slashes, empty and `.`
/// components are dropped and `..` pops the previous component.
pub fn canonicalize<P: AsRef<Path>>(path: P) -> PathBuf {
    let path = path.as_ref();
    let normalized;
    let path = match path.to_str() {
        Some(v) if v.contains('\\') => {
            normalized = v.replace('\\', "/");
            Path::new(&normalized)
        }
        _ => path,
    };

    let mut dst = PathBuf::new();
    for v in path.components() {
        match v {
            Component::CurDir => {}
            Component::ParentDir => {
                dst.pop();
            }
            Component::Normal(v) => dst.push(v),
            Component::RootDir | Component::Prefix(_) => dst.push(v.as_os_str()),
        }
    }

    dst
}
