//! Identity & auth pipeline (spec.md §4.3).
//!
//! A request arrives carrying a raw UID/GID/supplementary-group triple
//! from the ONC-RPC `AUTH_UNIX` credential (decoding that credential is an
//! external collaborator's concern, per spec.md §1 — this module starts
//! from the already-decoded triple). Building the [`AuthContext`] a handler
//! actually consults is a three-step pipeline:
//!
//! 1. [`registry::Registry::lookup_user`] resolves the raw UID against
//!    whatever platform user database the server is configured with.
//! 2. The share's configured [`crate::share::Permission`] and squash rule
//!    are applied to the resolved identity.
//! 3. The result is cached per `(share, uid, gid)` in [`cache::AuthCache`],
//!    since steps 1–2 repeat identically for every request from the same
//!    client/share pair.

pub mod cache;
pub mod registry;

use crate::share::{Permission, Share};

/// The effective, squashed identity a handler authorizes a request
/// against. Distinct from the raw wire credential: `uid`/`gid` here have
/// already had squashing applied.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AuthContext {
    pub uid: u32,
    pub gid: u32,
    pub groups: Vec<u32>,
    pub permission: Permission,
    /// `true` if squashing replaced the caller's original identity
    /// (root_squash hitting uid 0, or all_squash unconditionally).
    pub squashed: bool,
}

impl AuthContext {
    /// An identity with no rights at all, used when lookup or squashing
    /// rejects the request outright (spec.md §4.3 "anonymous denial").
    pub fn denied() -> Self {
        AuthContext { uid: u32::MAX, gid: u32::MAX, groups: Vec::new(), permission: Permission::None, squashed: true }
    }

    pub fn is_denied(&self) -> bool {
        self.permission == Permission::None
    }
}

/// The squash rule named by [`crate::share::Share::squash_rule`], resolved
/// once and reused across requests.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum SquashRule {
    /// No identity mapping: the wire credential is used as-is.
    None,
    /// Replace uid/gid 0 (root) with the share's configured anonymous
    /// identity; every other identity passes through unchanged.
    RootSquash,
    /// Replace every identity, root or not, with the share's configured
    /// anonymous identity.
    AllSquash,
}

impl SquashRule {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "none" => Some(SquashRule::None),
            "root_squash" => Some(SquashRule::RootSquash),
            "all_squash" => Some(SquashRule::AllSquash),
            _ => None,
        }
    }
}

/// The anonymous identity substituted by `root_squash`/`all_squash`
/// (conventionally `nobody`/`nogroup`, but configurable per share).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct AnonymousIdentity {
    pub uid: u32,
    pub gid: u32,
}

impl Default for AnonymousIdentity {
    fn default() -> Self {
        AnonymousIdentity { uid: 65534, gid: 65534 }
    }
}

/// Builds the effective [`AuthContext`] for one request, given the raw
/// wire credential, the share it targets, and the platform user record
/// the registry resolved (or `None` if the uid is unknown to the
/// platform). This is the pure core of the pipeline; [`cache::AuthCache`]
/// wraps it with memoization.
pub fn build_auth_context(
    share: &Share,
    raw_uid: u32,
    raw_gid: u32,
    raw_groups: &[u32],
    user: Option<&registry::UserRecord>,
    squash: SquashRule,
    anon: AnonymousIdentity,
) -> AuthContext {
    let should_squash = match squash {
        SquashRule::None => false,
        SquashRule::RootSquash => raw_uid == 0 || raw_gid == 0,
        SquashRule::AllSquash => true,
    };

    if should_squash {
        return AuthContext {
            uid: anon.uid,
            gid: anon.gid,
            groups: Vec::new(),
            permission: share.default_permission,
            squashed: true,
        };
    }

    let (uid, gid, groups) = match user {
        Some(u) => (u.uid, u.gid, u.groups.clone()),
        None => (raw_uid, raw_gid, raw_groups.to_vec()),
    };

    let permission = if share.is_read_only_for(share.default_permission) {
        Permission::Read.min(share.default_permission)
    } else {
        share.default_permission
    };

    AuthContext { uid, gid, groups, permission, squashed: false }
}

impl PartialOrd for Permission {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Permission {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        fn rank(p: &Permission) -> u8 {
            match p {
                Permission::None => 0,
                Permission::Read => 1,
                Permission::Write => 2,
            }
        }
        rank(self).cmp(&rank(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::share::PrefetchConfig;

    fn share(default_permission: Permission, read_only: bool) -> Share {
        Share {
            name: "export".into(),
            read_only,
            default_permission,
            prefetch: PrefetchConfig::default(),
            squash_rule: "root_squash".into(),
        }
    }

    #[test]
    fn root_squash_replaces_root_only() {
        let s = share(Permission::Write, false);
        let anon = AnonymousIdentity::default();
        let root_ctx = build_auth_context(&s, 0, 0, &[], None, SquashRule::RootSquash, anon);
        assert!(root_ctx.squashed);
        assert_eq!(root_ctx.uid, anon.uid);

        let user_ctx = build_auth_context(&s, 1000, 1000, &[], None, SquashRule::RootSquash, anon);
        assert!(!user_ctx.squashed);
        assert_eq!(user_ctx.uid, 1000);
    }

    #[test]
    fn all_squash_replaces_everyone() {
        let s = share(Permission::Write, false);
        let anon = AnonymousIdentity::default();
        let ctx = build_auth_context(&s, 1000, 1000, &[], None, SquashRule::AllSquash, anon);
        assert!(ctx.squashed);
        assert_eq!(ctx.uid, anon.uid);
    }

    #[test]
    fn read_only_share_never_grants_write_permission() {
        let s = share(Permission::Write, true);
        let anon = AnonymousIdentity::default();
        let ctx = build_auth_context(&s, 1000, 1000, &[], None, SquashRule::None, anon);
        assert_eq!(ctx.permission, Permission::Read);
    }
}
