//! Ordered tables of handlers, keyed by the resource type they produce.
//!
//! A handler is filed under its declared type and under every ancestor of that type, except
//! the universal root. Asking for the handlers of a type is a single map lookup that already
//! contains the handlers of all derived types, ordered by ascending priority and then by
//! registration order.

use std::sync::Arc;

use smallvec::SmallVec;

use crate::utils::FastHashMap;

use super::handler::{ResourceConverter, ResourceCreator, ResourceLoader};
use super::types::{ResourceType, RESOURCE};

struct HandlerEntry<T: ?Sized> {
    priority: i32,
    seq: u64,
    handler: Arc<T>,
}

/// A list of handlers sorted by `(priority, seq)`.
pub struct HandlerSet<T: ?Sized> {
    entries: Vec<HandlerEntry<T>>,
}

impl<T: ?Sized> Default for HandlerSet<T> {
    fn default() -> Self {
        HandlerSet {
            entries: Vec::new(),
        }
    }
}

impl<T: ?Sized> HandlerSet<T> {
    /// Inserts `handler` at its ordered position. Returns false if the very same instance
    /// is already in the set.
    pub fn insert(&mut self, handler: Arc<T>, priority: i32, seq: u64) -> bool {
        if self.contains(&handler) {
            return false;
        }

        let position = self
            .entries
            .iter()
            .position(|v| (v.priority, v.seq) > (priority, seq))
            .unwrap_or(self.entries.len());

        let entry = HandlerEntry {
            priority,
            seq,
            handler,
        };

        self.entries.insert(position, entry);
        true
    }

    #[inline]
    pub fn contains(&self, handler: &Arc<T>) -> bool {
        self.entries.iter().any(|v| Arc::ptr_eq(&v.handler, handler))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Clones the handlers out in order, so they can be invoked without holding any lock.
    pub fn to_vec(&self) -> Vec<Arc<T>> {
        self.entries.iter().map(|v| v.handler.clone()).collect()
    }
}

type Lineage = SmallVec<[&'static ResourceType; 8]>;

/// The loaders, converters and creators known to a `ResourceCache`.
pub struct HandlerRegistry {
    loaders: FastHashMap<&'static ResourceType, HandlerSet<dyn ResourceLoader>>,
    converters: FastHashMap<&'static ResourceType, HandlerSet<dyn ResourceConverter>>,
    creators: FastHashMap<&'static ResourceType, HandlerSet<dyn ResourceCreator>>,
    max_depth: usize,
    seq: u64,
}

impl HandlerRegistry {
    pub fn new(max_depth: usize) -> Self {
        HandlerRegistry {
            loaders: FastHashMap::default(),
            converters: FastHashMap::default(),
            creators: FastHashMap::default(),
            max_depth,
            seq: 0,
        }
    }

    /// Registers a loader. Returns false if it has been registered before.
    pub fn add_loader(&mut self, loader: Arc<dyn ResourceLoader>) -> bool {
        debug_assert!(
            !loader.extensions().is_empty(),
            "Loader of {} declares no extension.",
            loader.resource_type()
        );

        let ty = loader.resource_type();
        let priority = loader.priority();
        let lineage = self.lineage(ty);
        let seq = self.next_seq();
        Self::file(&mut self.loaders, &lineage, loader, priority, seq)
    }

    /// Registers a converter. Returns false if it has been registered before.
    pub fn add_converter(&mut self, converter: Arc<dyn ResourceConverter>) -> bool {
        let ty = converter.resource_type();
        let priority = converter.priority();
        let lineage = self.lineage(ty);
        let seq = self.next_seq();
        Self::file(&mut self.converters, &lineage, converter, priority, seq)
    }

    /// Registers a creator. Returns false if it has been registered before.
    pub fn add_creator(&mut self, creator: Arc<dyn ResourceCreator>) -> bool {
        let ty = creator.resource_type();
        let priority = creator.priority();
        let lineage = self.lineage(ty);
        let seq = self.next_seq();
        Self::file(&mut self.creators, &lineage, creator, priority, seq)
    }

    /// Loaders able to produce `ty` or any type derived from it, in the order they should be
    /// tried.
    pub fn loaders(&self, ty: &'static ResourceType) -> Vec<Arc<dyn ResourceLoader>> {
        self.loaders.get(ty).map(|v| v.to_vec()).unwrap_or_default()
    }

    pub fn converters(&self, ty: &'static ResourceType) -> Vec<Arc<dyn ResourceConverter>> {
        self.converters
            .get(ty)
            .map(|v| v.to_vec())
            .unwrap_or_default()
    }

    pub fn creators(&self, ty: &'static ResourceType) -> Vec<Arc<dyn ResourceCreator>> {
        self.creators.get(ty).map(|v| v.to_vec()).unwrap_or_default()
    }

    fn next_seq(&mut self) -> u64 {
        self.seq += 1;
        self.seq
    }

    fn lineage(&self, ty: &'static ResourceType) -> Lineage {
        let mut lineage = Lineage::new();
        for v in ty.ancestors() {
            if *v == RESOURCE {
                return lineage;
            }

            if lineage.len() >= self.max_depth {
                break;
            }

            lineage.push(v);
        }

        if lineage.last().map(|v| !v.is_root()).unwrap_or(false) {
            warn!(
                "The type chain of {:?} is deeper than {}, handlers are only filed under its nearest {} ancestors.",
                ty,
                self.max_depth,
                lineage.len()
            );
        }

        lineage
    }

    fn file<T: ?Sized>(
        tables: &mut FastHashMap<&'static ResourceType, HandlerSet<T>>,
        lineage: &[&'static ResourceType],
        handler: Arc<T>,
        priority: i32,
        seq: u64,
    ) -> bool {
        let first = match lineage.first() {
            Some(v) => *v,
            None => return false,
        };

        if tables
            .get(first)
            .map(|v| v.contains(&handler))
            .unwrap_or(false)
        {
            return false;
        }

        for &ty in lineage {
            tables
                .entry(ty)
                .or_insert_with(HandlerSet::default)
                .insert(handler.clone(), priority, seq);
        }

        true
    }
}
