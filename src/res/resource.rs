use std::any::Any;
use std::sync::Arc;

use crate::utils::hash64;

use super::types::ResourceType;

/// Whether a freshly produced resource may be committed into the cache table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CachePolicy {
    CanCache,
    NoCache,
}

impl Default for CachePolicy {
    fn default() -> Self {
        CachePolicy::CanCache
    }
}

/// Conversions into `Any`, implemented for everything that is `Send + Sync + 'static`.
pub trait Downcast: Any + Send + Sync {
    fn as_any(&self) -> &dyn Any;
    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

impl<T: Any + Send + Sync> Downcast for T {
    #[inline]
    fn as_any(&self) -> &dyn Any {
        self
    }

    #[inline]
    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

/// The capability every cacheable object implements.
///
/// Resources are shared with `Arc`. The cache holds one strong reference per table entry,
/// like any other holder, and never mutates a resource after it has been produced.
pub trait Resource: Downcast {
    /// The runtime type of this instance.
    fn resource_type(&self) -> &'static ResourceType;

    /// Bytes of system memory used by this resource itself, excluding dependencies.
    fn system_memory_use(&self) -> usize;

    /// Bytes of video memory used by this resource, if any.
    fn video_memory_use(&self) -> usize {
        0
    }

    fn cache_policy(&self) -> CachePolicy {
        CachePolicy::CanCache
    }

    /// Appends the resources this one depends on into `out`, and returns how many were
    /// appended. Only used for memory accounting, lifetime is governed by reference
    /// counting alone.
    fn used_resources(&self, _out: &mut Vec<Arc<dyn Resource>>) -> usize {
        0
    }
}

/// Implemented by concrete resource types to name their static descriptor.
pub trait ResourceKind: Resource + Sized {
    fn static_type() -> &'static ResourceType;
}

/// Recovers the concrete type of a shared resource.
#[inline]
pub fn downcast<T: Resource>(resource: Arc<dyn Resource>) -> Option<Arc<T>> {
    resource.into_any().downcast::<T>().ok()
}

/// Recovers the concrete type of a borrowed resource.
#[inline]
pub fn downcast_ref<T: Resource>(resource: &dyn Resource) -> Option<&T> {
    resource.as_any().downcast_ref::<T>()
}

/// A configuration value attached to a load or create request. Two requests for the same
/// path share a cache entry only if their options hash to the same value.
pub trait ResourceOptions: Downcast {
    fn options_hash(&self) -> u64;
}

/// Options that never distinguish anything. Equivalent to passing no options.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct EmptyOptions;

impl ResourceOptions for EmptyOptions {
    fn options_hash(&self) -> u64 {
        0
    }
}

/// Options identified by a text tag, e.g. to keep a "tiled" and a "plain" decode of the
/// same image apart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionsTag {
    text: String,
    hash: u64,
}

impl OptionsTag {
    pub fn new<T: Into<String>>(text: T) -> Self {
        let text = text.into();
        let hash = hash64(text.as_str());
        OptionsTag { text, hash }
    }

    #[inline]
    pub fn text(&self) -> &str {
        &self.text
    }
}

impl ResourceOptions for OptionsTag {
    fn options_hash(&self) -> u64 {
        self.hash
    }
}

/// The hash of optional options, absence counts as zero.
#[inline]
pub fn options_hash(options: Option<&dyn ResourceOptions>) -> u64 {
    options.map(|v| v.options_hash()).unwrap_or(0)
}

/// Recovers the concrete type of request options.
#[inline]
pub fn options_as<T: ResourceOptions>(options: Option<&dyn ResourceOptions>) -> Option<&T> {
    options.and_then(|v| v.as_any().downcast_ref::<T>())
}
