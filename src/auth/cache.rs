//! Per-`(share, uid, gid)` memoization of [`super::build_auth_context`]
//! (spec.md §4.3 step 3).
//!
//! Resolving a platform user and applying squash rules is pure but not
//! free (a registry lookup may hit a directory service); since the same
//! client repeats the same credential on every request, the result is
//! cached with a bounded size and TTL via `moka`, the same cache crate the
//! payload layer's sibling pieces use elsewhere in this server.

use std::sync::Arc;
use std::time::Duration;

use moka::sync::Cache;

use super::registry::Registry;
use super::{build_auth_context, AnonymousIdentity, AuthContext, SquashRule};
use crate::share::Share;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct Key {
    share: String,
    uid: u32,
    gid: u32,
}

/// Caches built [`AuthContext`]s. Entries expire after `ttl` and the cache
/// never holds more than `max_capacity` entries, evicting least-recently-used
/// ones first — a single misbehaving client cycling through UIDs cannot
/// grow this without bound.
pub struct AuthCache {
    inner: Cache<Key, AuthContext>,
    registry: Arc<dyn Registry>,
}

impl AuthCache {
    pub fn new(registry: Arc<dyn Registry>, max_capacity: u64, ttl: Duration) -> Self {
        let inner = Cache::builder().max_capacity(max_capacity).time_to_live(ttl).build();
        AuthCache { inner, registry }
    }

    /// Returns the cached [`AuthContext`] for this `(share, uid, gid)`,
    /// building and caching it on a miss. `raw_groups` and `squash` are
    /// only consulted on a miss; a cache hit assumes they haven't changed
    /// since the entry was built, which holds for the lifetime of one TCP
    /// connection's worth of identical credentials (spec.md §4.3 "cache
    /// scope").
    pub fn get_or_build(
        &self,
        share: &Share,
        raw_uid: u32,
        raw_gid: u32,
        raw_groups: &[u32],
        squash: SquashRule,
        anon: AnonymousIdentity,
    ) -> AuthContext {
        let key = Key { share: share.name.clone(), uid: raw_uid, gid: raw_gid };
        if let Some(hit) = self.inner.get(&key) {
            return hit;
        }
        let user = self.registry.lookup_user(raw_uid);
        let ctx = build_auth_context(share, raw_uid, raw_gid, raw_groups, user.as_ref(), squash, anon);
        self.inner.insert(key, ctx.clone());
        ctx
    }

    pub fn invalidate_share(&self, share_name: &str) {
        self.inner.invalidate_entries_if(move |k, _v| k.share == share_name).ok();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::registry::{StaticRegistry, UserRecord};
    use crate::share::{Permission, PrefetchConfig};

    fn share() -> Share {
        Share {
            name: "export".into(),
            read_only: false,
            default_permission: Permission::Write,
            prefetch: PrefetchConfig::default(),
            squash_rule: "none".into(),
        }
    }

    #[test]
    fn repeated_lookup_hits_cache() {
        let mut reg = StaticRegistry::new();
        reg.insert(UserRecord { uid: 1000, gid: 1000, groups: vec![] });
        let cache = AuthCache::new(Arc::new(reg), 100, Duration::from_secs(60));
        let s = share();
        let anon = AnonymousIdentity::default();

        let first = cache.get_or_build(&s, 1000, 1000, &[], SquashRule::None, anon);
        let second = cache.get_or_build(&s, 1000, 1000, &[], SquashRule::None, anon);
        assert_eq!(first, second);
    }
}
