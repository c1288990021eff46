//! Runtime type descriptors of resources.
//!
//! Every kind of resource is described by a `ResourceType` living in a `static`. A descriptor
//! knows its parent, which makes it possible to ask for a base type (e.g. `Font`) and accept
//! any derived instance (e.g. `BitmapFont`) without reflection:
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
//!     assert!(BITMAP_FONT.is_derived_from(&rescache::res::types::RESOURCE));
//!     assert!(!FONT.is_derived_from(&BITMAP_FONT));
//! }
//! ```
//!
//! Two descriptors are the same type only if they are the same `static`, names are for
//! humans.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::ptr;

/// Chains longer than this are considered malformed.
pub const MAX_DEPTH: usize = 64;

/// The universal root of every resource type.
pub static RESOURCE: ResourceType = ResourceType::root("Resource");

pub struct ResourceType {
    name: &'static str,
    parent: Option<&'static ResourceType>,
}

impl ResourceType {
    /// Creates a descriptor derived from `parent`. Use `declare_resource_type!` instead of
    /// calling this directly.
    pub const fn new(name: &'static str, parent: Option<&'static ResourceType>) -> Self {
        ResourceType { name, parent }
    }

    /// Creates a descriptor without parent.
    pub const fn root(name: &'static str) -> Self {
        ResourceType { name, parent: None }
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[inline]
    pub fn parent(&self) -> Option<&'static ResourceType> {
        self.parent
    }

    #[inline]
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Iterates this type and then its parents, ending at the root. The walk is bounded
    /// by `MAX_DEPTH`.
    #[inline]
    pub fn ancestors(&'static self) -> Ancestors {
        Ancestors {
            next: Some(self),
            remaining: MAX_DEPTH,
        }
    }

    /// Returns true if `self` is `base`, or one of `self`'s ancestors is `base`.
    pub fn is_derived_from(&self, base: &ResourceType) -> bool {
        if self == base {
            return true;
        }

        let mut iter = self.parent;
        for _ in 0..MAX_DEPTH {
            match iter {
                Some(v) if v == base => return true,
                Some(v) => iter = v.parent,
                None => return false,
            }
        }

        false
    }
}

impl PartialEq for ResourceType {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        ptr::eq(self, other)
    }
}

impl Eq for ResourceType {}

impl Hash for ResourceType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (self as *const ResourceType as usize).hash(state);
    }
}

impl fmt::Debug for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.parent {
            Some(parent) => write!(f, "{}: {}", self.name, parent.name),
            None => write!(f, "{}", self.name),
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Iterator returned by `ResourceType::ancestors`.
pub struct Ancestors {
    next: Option<&'static ResourceType>,
    remaining: usize,
}

impl Iterator for Ancestors {
    type Item = &'static ResourceType;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }

        let v = self.next?;
        self.remaining -= 1;
        self.next = v.parent;
        Some(v)
    }
}

/// Declares a `static` resource type descriptor, derived from `RESOURCE` unless a parent
/// is given.
#[macro_export]
macro_rules! declare_resource_type {
    ($(#[$attr:meta])* $vis:vis $ident:ident, $name:expr, $parent:path) => {
        $(#[$attr])*
        $vis static $ident: $crate::res::types::ResourceType =
            $crate::res::types::ResourceType::new($name, Some(&$parent));
    };

    ($(#[$attr:meta])* $vis:vis $ident:ident, $name:expr) => {
        $(#[$attr])*
        $vis static $ident: $crate::res::types::ResourceType =
            $crate::res::types::ResourceType::new($name, Some(&$crate::res::types::RESOURCE));
    };
}
