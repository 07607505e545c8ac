//! # Core Layer Tests: TagRegistry, ServerBuilder
//!
//! Validates the default-tag invariant, overriding, and the builder chain API.

use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use dtp_core::{Endpoint, ServerBuilder, StatusCode, TagRegistry, DEFAULT_ENDPOINT_PACKET_TAG};

fn returning(raw: u32) -> impl Fn(Bytes) -> StatusCode + Send + Sync + 'static {
    move |_| StatusCode::new(raw)
}

/// A new registry answers the default tag with the diagnostic endpoint.
#[test]
fn test_default_tag_resolves() {
    let t = Instant::now();

    let registry = TagRegistry::new();
    assert_eq!(registry.len(), 1);

    let endpoint = registry.resolve(DEFAULT_ENDPOINT_PACKET_TAG).expect("default tag missing");
    assert_eq!(endpoint.handle(Bytes::from_static(b"ping")), StatusCode::SUCCESS);

    println!("test_default_tag_resolves: Testing Overhead = {:?}", t.elapsed());
}

/// Replacing the table with an empty one keeps the default entry.
#[test]
fn test_empty_override_keeps_default() {
    let registry = TagRegistry::from_endpoints(std::iter::empty());
    assert!(registry.contains(0));
    assert_eq!(registry.len(), 1);
}

/// Replacing the table with a non-empty one drops the default entry.
#[test]
fn test_full_override_replaces_default() {
    let endpoint: Arc<dyn Endpoint> = Arc::new(returning(0x8000_0001));
    let registry = TagRegistry::from_endpoints([(7, endpoint)]);

    assert!(!registry.contains(0));
    let resolved = registry.resolve(7).unwrap();
    assert_eq!(resolved.handle(Bytes::new()), StatusCode::new(0x8000_0001));
}

#[test]
fn test_route_overrides_default_tag() {
    let mut registry = TagRegistry::new();
    registry.route(0, returning(5));

    assert_eq!(registry.len(), 1);
    assert_eq!(registry.resolve(0).unwrap().handle(Bytes::new()), StatusCode::new(5));
}

#[test]
fn test_unknown_tag_is_none() {
    let registry = TagRegistry::new();
    assert!(registry.resolve(1).is_none());
    assert!(registry.resolve(u32::MAX).is_none());
}

#[test]
fn test_resolve_shares_endpoint() {
    let mut registry = TagRegistry::new();
    registry.route(3, returning(3));

    let a = registry.resolve(3).unwrap();
    let b = registry.resolve(3).unwrap();
    assert!(Arc::ptr_eq(&a, &b));
}

/// Verifies the `ServerBuilder` fluent API.
#[test]
fn test_server_builder_chain() {
    let builder = ServerBuilder::new()
        .with_port(0)
        .with_thread_pool_size(3)
        .with_clean_termination(false)
        .with_blocking_execution(false)
        .route(11, returning(11));

    assert_eq!(builder.config.port, 0);
    assert_eq!(builder.config.thread_pool_size, 3);
    assert!(!builder.config.clean_termination);
    assert!(!builder.config.blocking_execution);

    let mut tags: Vec<_> = builder.registry.tags().collect();
    tags.sort_unstable();
    assert_eq!(tags, vec![0, 11]);
    assert_eq!(format!("{:?}", builder.registry), "TagRegistry { tags: [0, 11] }");
}
