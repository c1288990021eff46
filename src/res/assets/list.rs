use std::mem;
use std::ops::Deref;
use std::sync::Arc;

use crate::res::resource::{Resource, ResourceKind};
use crate::res::types::ResourceType;

declare_resource_type!(
    /// A list of shared resources.
    pub RESOURCE_LIST, "ResourceList"
);

/// Keeps a set of resources alive together. The elements are reported as used resources,
/// so they are accounted for exactly once by `ResourceCache::calc_memory_use`.
pub struct ResourceList<T: Resource> {
    items: Vec<Arc<T>>,
}

impl<T: Resource> Default for ResourceList<T> {
    fn default() -> Self {
        ResourceList { items: Vec::new() }
    }
}

impl<T: Resource> ResourceList<T> {
    pub fn new(items: Vec<Arc<T>>) -> Self {
        ResourceList { items }
    }

    pub fn push(&mut self, item: Arc<T>) {
        self.items.push(item);
    }
}

impl<T: Resource> Deref for ResourceList<T> {
    type Target = [Arc<T>];

    fn deref(&self) -> &Self::Target {
        &self.items
    }
}

impl<T: Resource> Resource for ResourceList<T> {
    fn resource_type(&self) -> &'static ResourceType {
        &RESOURCE_LIST
    }

    fn system_memory_use(&self) -> usize {
        mem::size_of::<Self>() + self.items.capacity() * mem::size_of::<Arc<T>>()
    }

    fn used_resources(&self, out: &mut Vec<Arc<dyn Resource>>) -> usize {
        for v in &self.items {
            out.push(v.clone());
        }

        self.items.len()
    }
}

impl<T: Resource> ResourceKind for ResourceList<T> {
    fn static_type() -> &'static ResourceType {
        &RESOURCE_LIST
    }
}
