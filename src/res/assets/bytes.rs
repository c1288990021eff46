use std::any::Any;
use std::mem;
use std::sync::Arc;

use failure::Error;

use crate::res::handler::{CreatorContext, LoaderContext, ResourceCreator, ResourceLoader};
use crate::res::resource::{Resource, ResourceKind};
use crate::res::types::ResourceType;

declare_resource_type!(
    /// Uninterpreted bytes.
    pub BINARY_DATA, "BinaryData"
);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryData {
    bytes: Vec<u8>,
}

impl BinaryData {
    pub fn new<T: Into<Vec<u8>>>(bytes: T) -> Self {
        BinaryData {
            bytes: bytes.into(),
        }
    }

    #[inline]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl Resource for BinaryData {
    fn resource_type(&self) -> &'static ResourceType {
        &BINARY_DATA
    }

    fn system_memory_use(&self) -> usize {
        mem::size_of::<Self>() + self.bytes.capacity()
    }
}

impl ResourceKind for BinaryData {
    fn static_type() -> &'static ResourceType {
        &BINARY_DATA
    }
}

/// Reads the whole stream into a `BinaryData`.
#[derive(Debug, Clone)]
pub struct BinaryDataLoader {
    extensions: Vec<&'static str>,
    priority: i32,
}

impl Default for BinaryDataLoader {
    fn default() -> Self {
        BinaryDataLoader::new()
    }
}

impl BinaryDataLoader {
    /// Creates a loader that accepts `.dat` and `.bin` files.
    pub fn new() -> Self {
        BinaryDataLoader::with_extensions(&["dat", "bin"])
    }

    pub fn with_extensions(extensions: &[&'static str]) -> Self {
        BinaryDataLoader {
            extensions: extensions.to_vec(),
            priority: 0,
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }
}

impl ResourceLoader for BinaryDataLoader {
    fn resource_type(&self) -> &'static ResourceType {
        &BINARY_DATA
    }

    fn extensions(&self) -> &[&str] {
        &self.extensions
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn load(&self, ctx: &mut LoaderContext) -> Result<Arc<dyn Resource>, Error> {
        let bytes = ctx.read_to_end()?;
        Ok(Arc::new(BinaryData::new(bytes)))
    }
}

/// Wraps a `Vec<u8>` or a `&'static [u8]` into a `BinaryData`.
#[derive(Debug, Default, Clone, Copy)]
pub struct BinaryDataCreator;

impl ResourceCreator for BinaryDataCreator {
    fn resource_type(&self) -> &'static ResourceType {
        &BINARY_DATA
    }

    fn can_create(&self, value: &dyn Any) -> bool {
        value.is::<Vec<u8>>() || value.is::<&'static [u8]>()
    }

    fn create(&self, _: &CreatorContext, value: &dyn Any) -> Result<Arc<dyn Resource>, Error> {
        if let Some(bytes) = value.downcast_ref::<Vec<u8>>() {
            return Ok(Arc::new(BinaryData::new(bytes.clone())));
        }

        if let Some(bytes) = value.downcast_ref::<&'static [u8]>() {
            return Ok(Arc::new(BinaryData::new(*bytes)));
        }

        bail!("BinaryDataCreator only accepts Vec<u8> or &'static [u8].");
    }
}
