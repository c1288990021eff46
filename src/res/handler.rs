//! The three extension points of the `ResourceCache`.
//!
//! * A `ResourceLoader` produces a resource from a byte stream.
//! * A `ResourceConverter` produces a resource from another, already loaded resource.
//! * A `ResourceCreator` produces a resource from an in-memory value.
//!
//! Handlers never touch the cache table themselves, the cache commits whatever they return.
//! They are free to call back into the cache to load the resources they depend on. Returning
//! an error is always recoverable, the cache just moves on to the next candidate.

use std::any::Any;
use std::io;
use std::path::Path;
use std::sync::Arc;

use failure::Error;

use super::cache::ResourceCache;
use super::flags::ResourceCacheFlags;
use super::resource::{Resource, ResourceOptions};
use super::types::ResourceType;
use super::vfs::ReadStream;

/// Everything a loader gets to see while producing a resource.
pub struct LoaderContext<'a> {
    /// The resolved path of the stream, wildcards already substituted.
    pub path: &'a Path,
    pub cache: &'a ResourceCache,
    pub stream: &'a mut dyn ReadStream,
    pub options: Option<&'a dyn ResourceOptions>,
    pub flags: ResourceCacheFlags,
}

impl<'a> LoaderContext<'a> {
    /// Reads the remaining bytes of the stream.
    pub fn read_to_end(&mut self) -> io::Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.stream.read_to_end(&mut buf)?;
        Ok(buf)
    }

    /// Loads a dependency with the same options and flags as the current request.
    pub fn load<P: AsRef<Path>>(
        &self,
        path: P,
        ty: &'static ResourceType,
    ) -> Option<Arc<dyn Resource>> {
        self.cache.load(path, ty, self.options, self.flags)
    }

    #[inline]
    pub fn is_quiet(&self) -> bool {
        self.flags.contains(ResourceCacheFlags::QUIET)
    }
}

pub trait ResourceLoader: Send + Sync + 'static {
    /// The type of resources this loader produces.
    fn resource_type(&self) -> &'static ResourceType;

    /// File extensions this loader accepts, with or without the leading dot. Must not be
    /// empty.
    fn extensions(&self) -> &[&str];

    /// Loaders with lower priority are tried first.
    fn priority(&self) -> i32 {
        0
    }

    fn load(&self, ctx: &mut LoaderContext) -> Result<Arc<dyn Resource>, Error>;

    fn can_load_extension(&self, ext: &str) -> bool {
        let ext = ext.trim_start_matches('.');
        self.extensions()
            .iter()
            .any(|v| v.trim_start_matches('.').eq_ignore_ascii_case(ext))
    }
}

/// Everything a converter gets to see while producing a resource.
pub struct ConverterContext<'a> {
    /// The path under which the raw resource was found.
    pub path: &'a Path,
    pub cache: &'a ResourceCache,
    pub options: Option<&'a dyn ResourceOptions>,
    pub flags: ResourceCacheFlags,
}

pub trait ResourceConverter: Send + Sync + 'static {
    /// The type of resources this converter consumes.
    fn raw_type(&self) -> &'static ResourceType;

    /// The type of resources this converter produces.
    fn resource_type(&self) -> &'static ResourceType;

    fn priority(&self) -> i32 {
        0
    }

    /// Converts `raw`, which is guaranteed to be derived from `raw_type()`. Must not perform
    /// any I/O.
    fn convert(
        &self,
        ctx: &ConverterContext,
        raw: &Arc<dyn Resource>,
    ) -> Result<Arc<dyn Resource>, Error>;
}

/// Everything a creator gets to see while producing a resource.
pub struct CreatorContext<'a> {
    pub cache: &'a ResourceCache,
    pub options: Option<&'a dyn ResourceOptions>,
    pub flags: ResourceCacheFlags,
}

pub trait ResourceCreator: Send + Sync + 'static {
    fn resource_type(&self) -> &'static ResourceType;

    fn priority(&self) -> i32 {
        0
    }

    /// Returns true if this creator knows how to build a resource out of `value`.
    fn can_create(&self, value: &dyn Any) -> bool;

    fn create(&self, ctx: &CreatorContext, value: &dyn Any) -> Result<Arc<dyn Resource>, Error>;
}
