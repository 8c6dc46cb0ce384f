//! Platform user lookup (spec.md §4.3 step 1).
//!
//! The registry answers one question: does this UID correspond to a known
//! platform user, and if so what's their primary GID and supplementary
//! group list? It deliberately knows nothing about shares or squashing —
//! that's layered on top in [`super::build_auth_context`].

/// A resolved platform user record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub uid: u32,
    pub gid: u32,
    pub groups: Vec<u32>,
}

/// Source of platform user records. Implementations might read
/// `/etc/passwd` and `/etc/group`, query an LDAP/NIS directory, or (in
/// tests) serve a fixed in-memory table.
pub trait Registry: Send + Sync {
    /// Resolves `uid`, returning `None` if the platform has no record of
    /// it (the pipeline then falls back to the raw wire credential,
    /// spec.md §4.3 "unknown uid").
    fn lookup_user(&self, uid: u32) -> Option<UserRecord>;
}

/// A fixed in-memory registry, primarily for tests and for deployments
/// that enumerate every allowed user up front rather than querying the
/// platform at request time.
#[derive(Debug, Default)]
pub struct StaticRegistry {
    users: std::collections::HashMap<u32, UserRecord>,
}

impl StaticRegistry {
    pub fn new() -> Self {
        StaticRegistry { users: std::collections::HashMap::new() }
    }

    pub fn insert(&mut self, record: UserRecord) {
        self.users.insert(record.uid, record);
    }
}

impl Registry for StaticRegistry {
    fn lookup_user(&self, uid: u32) -> Option<UserRecord> {
        self.users.get(&uid).cloned()
    }
}
