use std::mem;
use std::sync::Arc;

use failure::Error;

use crate::errors;

use crate::res::handler::{ConverterContext, LoaderContext, ResourceConverter, ResourceLoader};
use crate::res::resource::{self, Resource, ResourceKind};
use crate::res::types::ResourceType;

use super::bytes::{BinaryData, BINARY_DATA};

declare_resource_type!(
    /// UTF-8 text.
    pub TEXT_DATA, "TextData"
);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextData {
    text: String,
}

impl TextData {
    pub fn new<T: Into<String>>(text: T) -> Self {
        TextData { text: text.into() }
    }

    #[inline]
    pub fn text(&self) -> &str {
        &self.text
    }
}

impl Resource for TextData {
    fn resource_type(&self) -> &'static ResourceType {
        &TEXT_DATA
    }

    fn system_memory_use(&self) -> usize {
        mem::size_of::<Self>() + self.text.capacity()
    }
}

impl ResourceKind for TextData {
    fn static_type() -> &'static ResourceType {
        &TEXT_DATA
    }
}

/// Reads `.txt` files.
#[derive(Debug, Default, Clone, Copy)]
pub struct TextDataLoader;

impl ResourceLoader for TextDataLoader {
    fn resource_type(&self) -> &'static ResourceType {
        &TEXT_DATA
    }

    fn extensions(&self) -> &[&str] {
        &["txt"]
    }

    fn load(&self, ctx: &mut LoaderContext) -> Result<Arc<dyn Resource>, Error> {
        let bytes = ctx.read_to_end()?;
        let text = String::from_utf8(bytes)?;
        Ok(Arc::new(TextData::new(text)))
    }
}

/// Decodes any `BinaryData` as UTF-8 text. Useful for text stored under extensions no text
/// loader knows about.
#[derive(Debug, Clone, Copy)]
pub struct TextDataConverter {
    priority: i32,
}

impl Default for TextDataConverter {
    fn default() -> Self {
        TextDataConverter { priority: 0 }
    }
}

impl TextDataConverter {
    pub fn with_priority(priority: i32) -> Self {
        TextDataConverter { priority }
    }
}

impl ResourceConverter for TextDataConverter {
    fn raw_type(&self) -> &'static ResourceType {
        &BINARY_DATA
    }

    fn resource_type(&self) -> &'static ResourceType {
        &TEXT_DATA
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn convert(
        &self,
        ctx: &ConverterContext,
        raw: &Arc<dyn Resource>,
    ) -> Result<Arc<dyn Resource>, Error> {
        let data = resource::downcast_ref::<BinaryData>(&**raw).ok_or_else(|| {
            errors::Error::InvalidRawType {
                expected: BINARY_DATA.name(),
                found: raw.resource_type().name(),
            }
        })?;

        trace!("Decodes {} bytes of text at {:?}.", data.len(), ctx.path);

        let text = ::std::str::from_utf8(data.bytes())?;
        Ok(Arc::new(TextData::new(text)))
    }
}
