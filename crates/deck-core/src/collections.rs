//! Map types and key hashing shared by the deck crates.
//!
//! `hashbrown` maps are used unless the `std-hash` feature is enabled.

use core::hash::{Hash, Hasher};

#[cfg(feature = "std-hash")]
pub mod map {
    pub use std::collections::{HashMap, HashSet};
}

#[cfg(not(feature = "std-hash"))]
pub mod map {
    pub use hashbrown::{HashMap, HashSet};
}

#[cfg(feature = "std-hash")]
fn key_hasher() -> std::collections::hash_map::DefaultHasher {
    std::collections::hash_map::DefaultHasher::new()
}

#[cfg(not(feature = "std-hash"))]
fn key_hasher() -> ahash::AHasher {
    // fixed keys: equal names hash equally for the lifetime of the process
    ahash::AHasher::default()
}

/// Hashes `value` under `namespace` into a 64-bit key.
///
/// Used to derive stable identifiers from human readable names, e.g. layout ids
/// that several pages agree on.
pub fn namespaced_key<T: Hash + ?Sized>(namespace: &str, value: &T) -> u64 {
    let mut hasher = key_hasher();
    namespace.hash(&mut hasher);
    value.hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::namespaced_key;

    #[test]
    fn same_name_same_key() {
        assert_eq!(namespaced_key("layout", "header"), namespaced_key("layout", "header"));
        assert_ne!(namespaced_key("layout", "header"), namespaced_key("layout", "footer"));
        assert_ne!(namespaced_key("a", "header"), namespaced_key("b", "header"));
    }
}
