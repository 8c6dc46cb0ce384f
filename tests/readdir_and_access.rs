//! READDIR cookie/verifier rules (spec.md §4.6, §8 "Cookie verifier") and
//! ACCESS bit translation (spec.md §4.6 ACCESS contract).

mod support;

use nfs3d::handlers::{access, create, mk_dir, read_dir};
use nfs3d::nfs3::types::{AccessMask, CookieVerifier, CreateMode, DirectoryCookie};
use nfs3d::nfs3::NfsStat;

use support::Fixture;

#[tokio::test]
async fn readdir_cookie_zero_always_succeeds() {
    let fx = Fixture::new();
    let ctx = fx.ctx();
    create::create(
        &fx.deps,
        &ctx,
        create::Args { dir: fx.root(), name: "one".into(), mode: CreateMode::Unchecked(support::default_attr()) },
    )
    .await;

    let resp = read_dir::read_dir(
        &fx.deps,
        &ctx,
        read_dir::Args {
            dir: fx.root(),
            cookie: DirectoryCookie(0),
            cookie_verifier: CookieVerifier::zero(),
            max_entries: 100,
        },
    )
    .await;
    assert_eq!(resp.status, NfsStat::Ok);
    assert_eq!(resp.entries.len(), 1);
    assert!(resp.eof);
}

#[tokio::test]
async fn readdir_rejects_stale_verifier_on_nonzero_cookie() {
    let fx = Fixture::new();
    let ctx = fx.ctx();
    create::create(
        &fx.deps,
        &ctx,
        create::Args { dir: fx.root(), name: "one".into(), mode: CreateMode::Unchecked(support::default_attr()) },
    )
    .await;

    let stale_verifier = CookieVerifier([0xAA; 8]);
    let resp = read_dir::read_dir(
        &fx.deps,
        &ctx,
        read_dir::Args {
            dir: fx.root(),
            cookie: DirectoryCookie(1),
            cookie_verifier: stale_verifier,
            max_entries: 100,
        },
    )
    .await;
    assert_eq!(resp.status, NfsStat::BadCookie);
}

#[tokio::test]
async fn readdir_paginates_with_the_verifier_it_returned() {
    let fx = Fixture::new();
    let ctx = fx.ctx();
    for name in ["a", "b", "c"] {
        create::create(
            &fx.deps,
            &ctx,
            create::Args { dir: fx.root(), name: name.into(), mode: CreateMode::Unchecked(support::default_attr()) },
        )
        .await;
    }

    let first_page = read_dir::read_dir(
        &fx.deps,
        &ctx,
        read_dir::Args { dir: fx.root(), cookie: DirectoryCookie(0), cookie_verifier: CookieVerifier::zero(), max_entries: 2 },
    )
    .await;
    assert_eq!(first_page.status, NfsStat::Ok);
    assert_eq!(first_page.entries.len(), 2);
    assert!(!first_page.eof);

    let last_cookie = first_page.entries.last().unwrap().cookie;
    let second_page = read_dir::read_dir(
        &fx.deps,
        &ctx,
        read_dir::Args {
            dir: fx.root(),
            cookie: last_cookie,
            cookie_verifier: first_page.cookie_verifier,
            max_entries: 2,
        },
    )
    .await;
    assert_eq!(second_page.status, NfsStat::Ok);
    assert_eq!(second_page.entries.len(), 1);
    assert!(second_page.eof);
}

#[tokio::test]
async fn readdir_on_a_file_handle_is_not_dir() {
    let fx = Fixture::new();
    let ctx = fx.ctx();
    let file = create::create(
        &fx.deps,
        &ctx,
        create::Args { dir: fx.root(), name: "f".into(), mode: CreateMode::Unchecked(support::default_attr()) },
    )
    .await
    .file
    .unwrap();

    let resp = read_dir::read_dir(
        &fx.deps,
        &ctx,
        read_dir::Args { dir: file, cookie: DirectoryCookie(0), cookie_verifier: CookieVerifier::zero(), max_entries: 10 },
    )
    .await;
    assert_eq!(resp.status, NfsStat::NotDir);
}

#[tokio::test]
async fn access_grants_requested_bits_when_permitted() {
    let fx = Fixture::new();
    let ctx = fx.ctx();
    let dir = mk_dir::mk_dir(&fx.deps, &ctx, mk_dir::Args { dir: fx.root(), name: "d".into(), attr: support::default_attr() })
        .await
        .file
        .unwrap();

    let requested = AccessMask(AccessMask::READ | AccessMask::MODIFY | AccessMask::DELETE);
    let resp = access::access(&fx.deps, &ctx, access::Args { file: dir, requested }).await;
    assert_eq!(resp.status, NfsStat::Ok);
    assert_eq!(resp.granted, requested);
}

#[tokio::test]
async fn access_denies_everything_on_a_denied_identity() {
    let fx = Fixture::with_share(nfs3d::share::Share {
        name: "locked".into(),
        read_only: false,
        default_permission: nfs3d::share::Permission::None,
        prefetch: Default::default(),
        squash_rule: "none".into(),
    });
    let ctx = fx.ctx();

    let requested = AccessMask(AccessMask::READ);
    let resp = access::access(&fx.deps, &ctx, access::Args { file: fx.root(), requested }).await;
    assert_eq!(resp.status, NfsStat::Ok);
    assert_eq!(resp.granted, AccessMask(0));
}
