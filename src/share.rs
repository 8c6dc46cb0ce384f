//! Shares — named exports, and the permission/prefetch policy attached to
//! each (spec.md §3 "Share").

/// Per-share permission level, resolved during auth-context construction.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Permission {
    None,
    Read,
    Write,
}

/// Prefetch policy for a share's payload cache (spec.md §3, §4.4).
#[derive(Debug, Clone, PartialEq)]
pub struct PrefetchConfig {
    pub enabled: bool,
    pub max_file_size: u64,
    pub chunk_size: u64,
}

impl Default for PrefetchConfig {
    fn default() -> Self {
        PrefetchConfig { enabled: false, max_file_size: 0, chunk_size: 256 * 1024 }
    }
}

/// A named export, carrying the policy the handler layer consults
/// directly. Identity mapping and the user store live behind
/// [`crate::auth::registry::Registry`] — a share only names which rule to
/// apply.
#[derive(Debug, Clone)]
pub struct Share {
    pub name: String,
    pub read_only: bool,
    pub default_permission: Permission,
    pub prefetch: PrefetchConfig,
    /// Name of the identity-mapping rule this share applies (e.g. `"none"`,
    /// `"root_squash"`, `"all_squash"`); resolved by
    /// [`crate::auth::registry::Registry`].
    pub squash_rule: String,
}

impl Share {
    pub fn is_read_only_for(&self, permission: Permission) -> bool {
        self.read_only || permission == Permission::Read
    }
}
