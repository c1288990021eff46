//! Built-in resources that do not depend on any file format.

pub mod bytes;
pub mod list;
pub mod text;

pub mod prelude {
    pub use super::bytes::{BinaryData, BinaryDataCreator, BinaryDataLoader, BINARY_DATA};
    pub use super::list::{ResourceList, RESOURCE_LIST};
    pub use super::text::{TextData, TextDataConverter, TextDataLoader, TEXT_DATA};
}

use std::sync::Arc;

use super::cache::ResourceCache;

use self::prelude::*;

/// Registers the loaders, converters and creators of the built-in resources.
pub fn setup(cache: &ResourceCache) {
    cache.add_loader(Arc::new(BinaryDataLoader::new()));
    cache.add_loader(Arc::new(TextDataLoader));
    cache.add_converter(Arc::new(TextDataConverter::default()));
    cache.add_creator(Arc::new(BinaryDataCreator));
}
