use std::borrow::Cow;
use std::collections::HashSet;
use tracing::warn;

/// FNV-1a 64 over the UTF-8 bytes.
///
/// Must stay stable across builds: repaired layer ids are derived from name
/// hashes and persist in the import state.
pub fn name_hash(name: &str) -> i64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;
    let mut h = OFFSET;
    for b in name.as_bytes() {
        h ^= u64::from(*b);
        h = h.wrapping_mul(PRIME);
    }
    h as i64
}

/// Names that cannot be used for emitted assets get a `_` suffix.
fn sanitize(name: &str) -> Cow<'_, str> {
    match name {
        "." | ".." | "/" => {
            let renamed = format!("{}_", name);
            warn!(from = name, to = %renamed, "layer name is reserved, renaming");
            Cow::Owned(renamed)
        }
        _ => Cow::Borrowed(name),
    }
}

/// Hash registry for name disambiguation, scoped to one import pass.
///
/// Layer-id repair and sprite naming share one registry, so a repaired id can
/// never collide with a hash later claimed by a name (and vice versa).
#[derive(Debug, Default)]
pub struct NameRegistry {
    hashes: HashSet<i64>,
}

impl NameRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains_hash(&self, hash: i64) -> bool {
        self.hashes.contains(&hash)
    }

    pub fn add_hash(&mut self, hash: i64) {
        self.hashes.insert(hash);
    }

    /// Registers `name`'s hash without any uniqueness handling. Used to claim
    /// names that must survive verbatim (manual renames, user-created records).
    pub fn add_name(&mut self, name: &str) {
        self.add_hash(name_hash(name));
    }

    /// Returns `name` (sanitized) if its hash is free, otherwise the first free
    /// `{name}_N` with N counting up from 1. The winning hash is registered.
    pub fn unique_name(&mut self, name: &str) -> String {
        let mut candidate = sanitize(name).into_owned();
        let mut index = 1u32;
        loop {
            let hash = name_hash(&candidate);
            if !self.hashes.contains(&hash) {
                self.hashes.insert(hash);
                return candidate;
            }
            // suffix candidates derive from the unsanitized input
            candidate = format!("{}_{}", name, index);
            index += 1;
        }
    }
}
