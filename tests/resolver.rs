use std::sync::Arc;
use std::time::Duration;

use netdial::core::dns::resolver::{resolve, SystemLookup};
use netdial::{AddrFamily, DialError, DialInterrupt};

#[tokio::test]
async fn system_lookup_resolves_literal_v4_inline() {
    let entries = resolve(
        Arc::new(SystemLookup),
        "127.0.0.1",
        8080,
        AddrFamily::Unspec,
        None,
        &DialInterrupt::none(),
        false,
    )
    .await
    .expect("literal addresses resolve without DNS");
    assert_eq!(entries.len(), 1);
    assert!(entries[0].addr.is_ipv4());
    assert_eq!(entries[0].addr.port(), 8080);
}

#[tokio::test]
async fn system_lookup_family_filter_can_empty_the_result() {
    let err = resolve(
        Arc::new(SystemLookup),
        "127.0.0.1",
        8080,
        AddrFamily::V6,
        None,
        &DialInterrupt::none(),
        false,
    )
    .await
    .expect_err("a v4 literal has no v6 addresses");
    assert!(matches!(err, DialError::ResolveFailed { .. }), "{err:?}");
}

#[tokio::test]
async fn system_lookup_resolves_literal_v6_in_background() {
    let entries = resolve(
        Arc::new(SystemLookup),
        "::1",
        443,
        AddrFamily::Unspec,
        Some(Duration::from_secs(5)),
        &DialInterrupt::none(),
        false,
    )
    .await
    .expect("v6 literal resolves");
    assert_eq!(entries.len(), 1);
    assert!(entries[0].addr.is_ipv6());
}
