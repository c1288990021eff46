//! The `ResourceCache` provides a standardized interface to load shared resources from various
//! places, and makes sure every resource is loaded only once.
//!
//! # Resource
//!
//! A _resource_ is an abstraction of some piece of data that is fully prepared for using at
//! runtime, like a decoded image, a font or a sound clip. Every resource implements the
//! `Resource` trait, which reports its runtime type and memory footprint.
//!
//! ## Type
//!
//! Resource types form a hierarchy described by static `ResourceType` descriptors. A request
//! for a base type, say `Font`, could be satisfied by any derived instance, say a `BitmapFont`.
//!
//! ```rust
//! #[macro_use]
//! extern crate rescache;
//!
//! declare_resource_type!(pub FONT, "Font");
//! declare_resource_type!(pub BITMAP_FONT, "BitmapFont", FONT);
//!
//! fn main() {
//!     assert!(BITMAP_FONT.is_derived_from(&FONT));
//! }
//! ```
//!
//! ## Ownership & Lifetime
//!
//! Resources are shared with `Arc`. The cache table holds one strong reference to every cached
//! resource, just like any other holder does. `unload_unused` drops the entries that nobody
//! else holds anymore, which never invalidates a resource somebody still uses.
//!
//! # Stream Provider
//!
//! The cache reads bytes through pluggable `StreamProvider`s, which are queried in the order
//! they were added. A trivial `Directory` supports the local host filesystem and `Memory`
//! serves bytes from a table.
//!
//! # Handlers
//!
//! * `ResourceLoader`s produce resources from streams, filtered by the file extension.
//! * `ResourceConverter`s produce resources from other resources, e.g. a texture out of a
//! decoded image. They are tried when no loader succeeded.
//! * `ResourceCreator`s produce resources from in-memory values. Created resources are not
//! cached.
//!
//! Handlers are registered under their type and every ancestor of it, ordered by priority.
//!
//! ```rust
//! use std::sync::Arc;
//! use rescache::prelude::*;
//!
//! let memory = Arc::new(Memory::new());
//! memory.insert("greetings.txt", "Hello, World!");
//!
//! let cache = ResourceCache::new();
//! cache.add_provider(memory);
//! rescache::res::assets::setup(&cache);
//!
//! let text = cache
//!     .load_as::<TextData, _>("greetings.txt", None, ResourceCacheFlags::empty())
//!     .unwrap();
//!
//! assert_eq!(text.text(), "Hello, World!");
//! ```

#[macro_use]
pub mod types;
pub mod resource;

pub mod flags;
pub mod handler;
pub mod inflight;
pub mod registry;
pub mod settings;
pub mod vfs;

pub mod cache;

pub mod assets;

pub mod prelude {
    pub use super::assets::prelude::*;
    pub use super::cache::{MemoryUse, ResourceCache, ResourceUsage};
    pub use super::flags::ResourceCacheFlags;
    pub use super::handler::{
        ConverterContext, CreatorContext, LoaderContext, ResourceConverter, ResourceCreator,
        ResourceLoader,
    };
    pub use super::resource::{
        downcast, downcast_ref, CachePolicy, EmptyOptions, OptionsTag, Resource, ResourceKind,
        ResourceOptions,
    };
    pub use super::settings::CacheParams;
    pub use super::types::{ResourceType, RESOURCE};
    pub use super::vfs::{Directory, Memory, ReadStream, StreamProvider};
}
