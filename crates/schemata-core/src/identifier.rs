//! Identifier management using string interning for efficient string storage and comparison
//!
//! This module provides the [`Id`] type used for node type, edge type, handle
//! and canvas element names, and [`ShortUid`], the generator for the short
//! random names given to connections drawn on the canvas.

use std::{
    fmt,
    sync::{Mutex, OnceLock},
};

use rand::{Rng, SeedableRng, distr::Alphanumeric, rngs::StdRng};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use string_interner::{DefaultStringInterner, DefaultSymbol};

/// Global string interner for efficient identifier storage.
///
/// # Thread Safety
///
/// This uses `Mutex` for thread-safe access to the string interner.
static INTERNER: OnceLock<Mutex<DefaultStringInterner>> = OnceLock::new();

fn with_interner<T>(f: impl FnOnce(&mut DefaultStringInterner) -> T) -> T {
    let mut interner = INTERNER
        .get_or_init(|| Mutex::new(DefaultStringInterner::new()))
        .lock()
        .expect("Failed to acquire interner lock");
    f(&mut interner)
}

/// Efficient identifier type using string interning
///
/// # Examples
///
/// ```
/// use schemata_core::identifier::Id;
///
/// let person = Id::new("PERSON");
/// let works_at = Id::new("WORKS_AT");
///
/// assert_eq!(person, "PERSON");
/// assert_ne!(person, works_at);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Id(DefaultSymbol);

impl Id {
    /// Creates an `Id` from &str.
    pub fn new(name: &str) -> Self {
        Self(with_interner(|interner| interner.get_or_intern(name)))
    }

    /// Returns the interned string as an owned `String`.
    pub fn as_string(&self) -> String {
        with_interner(|interner| {
            interner
                .resolve(self.0)
                .expect("Symbol should exist in interner")
                .to_string()
        })
    }

    /// Creates a new `Id` by joining this identifier, `infix` and `suffix` with `-`.
    ///
    /// # Examples
    ///
    /// ```
    /// use schemata_core::identifier::Id;
    ///
    /// let handle = Id::new("PERSON").join("source", Id::new("KNOWS"));
    /// assert_eq!(handle, "PERSON-source-KNOWS");
    /// ```
    pub fn join(&self, infix: &str, suffix: Id) -> Self {
        let joined = format!("{self}-{infix}-{suffix}");
        Self::new(&joined)
    }

    /// Creates a new `Id` by putting `prefix-` in front of this identifier.
    pub fn prefixed(&self, prefix: &str) -> Self {
        let prefixed = format!("{prefix}-{self}");
        Self::new(&prefixed)
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        with_interner(|interner| {
            let str_value = interner
                .resolve(self.0)
                .expect("Symbol should exist in interner");
            write!(f, "{str_value}")
        })
    }
}

impl From<&str> for Id {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl PartialEq<str> for Id {
    fn eq(&self, other: &str) -> bool {
        with_interner(|interner| {
            interner
                .resolve(self.0)
                .expect("Symbol should exist in interner")
                == other
        })
    }
}

impl PartialEq<&str> for Id {
    fn eq(&self, other: &&str) -> bool {
        self == *other
    }
}

impl Serialize for Id {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.as_string())
    }
}

impl<'de> Deserialize<'de> for Id {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(Self::new(&name))
    }
}

/// Source of fresh names for connections drawn on the canvas.
pub trait IdGenerator {
    /// Returns a new name. Collisions are unlikely but not impossible; callers
    /// that need uniqueness check against the names they already hold.
    fn next_id(&mut self) -> String;
}

/// Generates short random alphanumeric names (8 characters by default).
///
/// Not cryptographically strong; the randomness source is injected so that
/// tests can seed it.
#[derive(Debug, Clone)]
pub struct ShortUid<R> {
    rng: R,
    length: usize,
}

impl<R: Rng> ShortUid<R> {
    /// Default name length.
    pub const DEFAULT_LENGTH: usize = 8;

    /// Create a generator drawing from `rng`.
    pub fn new(rng: R) -> Self {
        Self {
            rng,
            length: Self::DEFAULT_LENGTH,
        }
    }

    /// Set the length of generated names.
    pub fn with_length(mut self, length: usize) -> Self {
        self.length = length;
        self
    }
}

impl ShortUid<StdRng> {
    /// Create a generator seeded from the operating system.
    pub fn from_os_rng() -> Self {
        Self::new(StdRng::from_os_rng())
    }

    /// Create a reproducible generator.
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> IdGenerator for ShortUid<R> {
    fn next_id(&mut self) -> String {
        (0..self.length)
            .map(|_| char::from(self.rng.sample(Alphanumeric)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_new() {
        let id1 = Id::new("PERSON");
        let id2 = Id::new("PERSON");
        let id3 = Id::new("COMPANY");

        assert_eq!(id1, id2);
        assert_ne!(id1, id3);
        assert_eq!(id1, "PERSON");
    }

    #[test]
    fn test_display_and_as_string() {
        let id = Id::new("display_test");
        assert_eq!(format!("{id}"), "display_test");
        assert_eq!(id.as_string(), "display_test");
    }

    #[test]
    fn test_join_and_prefixed() {
        let node = Id::new("CITY");
        let edge = Id::new("aB3dE9xZ");

        assert_eq!(node.join("target", edge), "CITY-target-aB3dE9xZ");
        assert_eq!(edge.prefixed("connector"), "connector-aB3dE9xZ");
    }

    #[test]
    fn test_short_uid_shape() {
        let mut ids = ShortUid::seeded(7);
        let id = ids.next_id();
        assert_eq!(id.len(), 8);
        assert!(id.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_short_uid_with_length() {
        let mut ids = ShortUid::seeded(7).with_length(6);
        assert_eq!(ids.next_id().len(), 6);
    }

    #[test]
    fn test_short_uid_seeded_is_reproducible() {
        let mut a = ShortUid::seeded(42);
        let mut b = ShortUid::seeded(42);
        assert_eq!(a.next_id(), b.next_id());
    }

    #[test]
    fn test_short_uid_rarely_collides() {
        let mut ids = ShortUid::seeded(1);
        let generated: HashSet<String> = (0..1000).map(|_| ids.next_id()).collect();
        assert_eq!(generated.len(), 1000);
    }
}
