//! Commonly used utilities.

pub mod hash;

pub use self::hash::{hash64, hash_combine, FastHashMap, FastHashSet};
