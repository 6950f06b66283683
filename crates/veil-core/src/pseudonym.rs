//! One-way pseudonym mapping.
//!
//! A subscriber channel is identified by a caller-chosen *private id*. The
//! *pseudonym* handed to publishers is the SHA-256 digest of that id,
//! rendered as lowercase hex. Publishers can address a channel without ever
//! learning its private id; the broker reverses the mapping through the
//! registry built up by subscribe calls.

use fxhash::FxHashMap;
use parking_lot::RwLock;
use sha2::{Digest, Sha256};

/// Derives the public pseudonym for a private channel id.
///
/// Lowercase-hex SHA-256 over the UTF-8 bytes of the id. The mapping is a
/// pure function with no salt, so the same private id always yields the
/// same pseudonym and registration is idempotent. Guessing resistance
/// rests entirely on the entropy of the private id.
#[must_use]
pub fn derive(private_id: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(private_id.as_bytes());
    hex::encode(hasher.finalize())
}

// ---------------------------------------------------------------------------
// PseudonymRegistry
// ---------------------------------------------------------------------------

/// Registry of `pseudonym -> private id` mappings.
///
/// Process-wide shared state. An entry is created the first time a channel
/// subscribes and is never evicted: the registry grows for the lifetime of
/// the process ([`len`](Self::len) exposes the size). Reads dominate —
/// every publish resolves, only subscribes register — so the map sits
/// behind an [`RwLock`].
#[derive(Debug, Default)]
pub struct PseudonymRegistry {
    entries: RwLock<FxHashMap<String, String>>,
}

impl PseudonymRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the mapping for `private_id` and returns its pseudonym.
    ///
    /// Never fails. Re-registering an already-known id overwrites the
    /// entry with an identical value.
    pub fn register(&self, private_id: &str) -> String {
        let pseudonym = derive(private_id);
        self.entries
            .write()
            .insert(pseudonym.clone(), private_id.to_owned());
        pseudonym
    }

    /// Resolves a pseudonym back to its private id.
    ///
    /// Returns `None` when no subscriber has ever registered under the
    /// pseudonym. That is the normal "nobody is listening" outcome, not a
    /// fault; dispatch treats it exactly like an empty waiter sequence.
    #[must_use]
    pub fn resolve(&self, pseudonym: &str) -> Option<String> {
        self.entries.read().get(pseudonym).cloned()
    }

    /// Number of registered pseudonyms. Grows without bound; there is no
    /// eviction.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns `true` if nothing has ever registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    // --- Derivation ---

    #[test]
    fn test_derive_known_vector() {
        assert_eq!(
            derive("alice-channel"),
            "742ffae03cef00539532b227d6ef3122b845f21244c24aadd3daa9db21bc6645"
        );
        assert_eq!(
            derive("a"),
            "ca978112ca1bbdcafac231b39a23dc4da786eff8147c4e72b9807785afee48bb"
        );
    }

    #[test]
    fn test_derive_deterministic() {
        assert_eq!(derive("some-channel"), derive("some-channel"));
        assert_ne!(derive("some-channel"), derive("other-channel"));
    }

    #[test]
    fn test_derive_shape() {
        let p = derive("anything at all");
        assert_eq!(p.len(), 64);
        assert!(p.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    // --- Register / resolve ---

    #[test]
    fn test_resolve_after_register() {
        let reg = PseudonymRegistry::new();
        let p = reg.register("alice-channel");
        assert_eq!(reg.resolve(&p).as_deref(), Some("alice-channel"));
    }

    #[test]
    fn test_resolve_unknown_is_none() {
        let reg = PseudonymRegistry::new();
        assert!(reg.resolve("0000000000000000000000000000000000000000000000000000000000000000").is_none());
        assert!(reg.resolve(&derive("never-registered")).is_none());
    }

    #[test]
    fn test_register_idempotent() {
        let reg = PseudonymRegistry::new();
        let p1 = reg.register("alice-channel");
        let p2 = reg.register("alice-channel");
        assert_eq!(p1, p2);
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn test_len_growth() {
        let reg = PseudonymRegistry::new();
        assert!(reg.is_empty());
        reg.register("a");
        reg.register("b");
        reg.register("a");
        assert_eq!(reg.len(), 2);
        assert!(!reg.is_empty());
    }
}
