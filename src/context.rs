//! Handler context (spec.md §2.8, §5 "Cancellation & timeouts").
//!
//! Every handler call receives a [`HandlerContext`]: the per-request
//! cancellation signal, the client's address, which share the request
//! targets, and the raw (pre-squash) credential carried by the RPC auth
//! flavor. Building the effective [`crate::auth::AuthContext`] from the raw
//! credential happens later, inside each handler, via
//! [`crate::auth::cache::AuthCache`].

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::sync::watch;

/// RPC auth flavor carried by the request, per RFC 1813 / RFC 5531. Only
/// the two flavors spec.md §4.3 distinguishes are modeled; anything else
/// collapses to `Anonymous`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum AuthMethod {
    Unix,
    Anonymous,
}

impl AuthMethod {
    /// Maps an ONC-RPC auth flavor number onto the two buckets the
    /// identity pipeline cares about (spec.md §4.3 step 1).
    pub fn from_flavor(flavor: u32) -> Self {
        if flavor == 1 {
            AuthMethod::Unix
        } else {
            AuthMethod::Anonymous
        }
    }
}

/// The raw, pre-squash credential decoded from the RPC auth body.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawCredential {
    pub uid: u32,
    pub gid: u32,
    pub groups: Vec<u32>,
}

/// A cooperative cancellation signal shared by every task working on one
/// request. Cheap to clone; all clones observe the same underlying flag.
///
/// Built on a `watch` channel rather than `tokio_util::sync::CancellationToken`
/// to avoid a dependency the rest of this crate has no other use for — the
/// same single-purpose-primitive-over-pulling-in-a-crate tradeoff as
/// [`crate::verifier`]'s seed.
#[derive(Debug, Clone)]
pub struct CancellationToken {
    rx: watch::Receiver<bool>,
}

/// The counterpart that triggers a [`CancellationToken`]. Held by whatever
/// owns the request's lifetime (the RPC connection task, a deadline timer,
/// or the server shutdown sequence per spec.md §5).
#[derive(Debug, Clone)]
pub struct CancellationSource {
    tx: Arc<watch::Sender<bool>>,
}

pub fn cancellation_pair() -> (CancellationSource, CancellationToken) {
    let (tx, rx) = watch::channel(false);
    (CancellationSource { tx: Arc::new(tx) }, CancellationToken { rx })
}

impl CancellationSource {
    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }
}

impl CancellationToken {
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once the token is cancelled. Cloned receivers each track
    /// their own "seen" position, so this can be awaited repeatedly (e.g.
    /// once per large-read chunk, spec.md §5 "every 64-256 KiB") without
    /// consuming anything.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        if *rx.borrow() {
            return;
        }
        while rx.changed().await.is_ok() {
            if *rx.borrow() {
                return;
            }
        }
    }

    /// A token that never cancels, for background work that must outlive
    /// the request that triggered it (spec.md §5 "prefetch runs ... with
    /// an independent (non-cancelling) context").
    pub fn never() -> Self {
        let (_tx, rx) = watch::channel(false);
        CancellationToken { rx }
    }
}

/// Everything a procedure handler needs about the request it's serving,
/// beyond the decoded arguments themselves.
#[derive(Clone)]
pub struct HandlerContext {
    pub cancellation: CancellationToken,
    pub client_addr: SocketAddr,
    pub share_name: String,
    pub auth_method: AuthMethod,
    pub credential: RawCredential,
}

impl HandlerContext {
    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }
}
