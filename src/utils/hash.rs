//! Hashing helpers shared by the cache keys and the internal tables.

use std::collections::hash_map::DefaultHasher;
use std::collections::{HashMap, HashSet};
use std::hash::{Hash, Hasher};

use fnv::FnvBuildHasher;

/// A `HashMap` using a fast, non-cryptographic hasher. All the keys we put into these
/// tables are either pre-hashed values or small structs.
pub type FastHashMap<K, V> = HashMap<K, V, FnvBuildHasher>;
pub type FastHashSet<K> = HashSet<K, FnvBuildHasher>;

/// Hashes a value into 64 bits with the standard SipHash hasher, which gives a well
/// distributed value for strings and paths.
pub fn hash64<T: Hash + ?Sized>(v: &T) -> u64 {
    let mut state = DefaultHasher::new();
    v.hash(&mut state);
    state.finish()
}

/// Mixes `value` into `seed`. The combination is order dependent, so `(path, options)`
/// and `(options, path)` produce different keys.
#[inline]
pub fn hash_combine(seed: u64, value: u64) -> u64 {
    seed ^ value
        .wrapping_add(0x9e37_79b9_7f4a_7c15)
        .wrapping_add(seed << 6)
        .wrapping_add(seed >> 2)
}

#[cfg(test)]
mod test {
    use super::*;
    use std::path::Path;

    #[test]
    fn combine_is_order_dependent() {
        let a = hash64("textures/crate.png");
        let b = hash64(&7u64);
        assert_ne!(hash_combine(a, b), hash_combine(b, a));
        assert_eq!(hash_combine(a, b), hash_combine(a, b));
    }

    #[test]
    fn combine_with_zero_still_mixes() {
        let a = hash64("textures/crate.png");
        assert_ne!(hash_combine(a, 0), a);
    }

    #[test]
    fn hash_path() {
        let a = hash64(Path::new("textures/crate.png"));
        assert_eq!(a, hash64(Path::new("textures/crate.png")));
        assert_ne!(a, hash64(Path::new("textures/crate.bmp")));
    }

    #[test]
    fn fast_map() {
        let mut map = FastHashMap::default();
        map.insert(1u64, "a");
        map.insert(2u64, "b");
        map.insert(1u64, "c");
        assert_eq!(map.len(), 2);
        assert_eq!(map.get(&1), Some(&"c"));

        let mut set = FastHashSet::default();
        assert!(set.insert("textures/crate.png"));
        assert!(!set.insert("textures/crate.png"));
    }
}
