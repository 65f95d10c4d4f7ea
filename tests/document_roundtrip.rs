//! Document-level integration tests: load, mutate, save, reload.

use portalctl::document;
use portalctl::routing::ROUTES_ENV_VAR;
use portalctl::services::ServiceRegistry;
use portalctl::Error;

mod common;
use common::{GroupFixture, PROXY};

#[test]
fn test_load_mutate_save_reload() {
    let fixture = GroupFixture::new();

    let doc = document::load(&fixture.document_path()).unwrap();
    let mut registry = ServiceRegistry::from_document(doc, Some(PROXY)).unwrap();

    registry
        .add_service_route("/metrics", "group.api", 3002)
        .unwrap();
    document::save(&fixture.document_path(), &registry.to_document()).unwrap();

    let reloaded = document::load(&fixture.document_path()).unwrap();
    let reloaded = ServiceRegistry::from_document(reloaded, Some(PROXY)).unwrap();
    assert_eq!(
        reloaded.routes().serialize_to_line(),
        registry.routes().serialize_to_line()
    );
    assert_eq!(reloaded.routes().len(), 3);
}

#[test]
fn test_saved_document_keeps_both_views_in_sync() {
    let fixture = GroupFixture::new();

    let doc = document::load(&fixture.document_path()).unwrap();
    let mut registry = ServiceRegistry::from_document(doc, Some(PROXY)).unwrap();
    registry.remove_service_routes("group.api");
    registry
        .add_service_route("/app", "group.app", 4000)
        .unwrap();
    document::save(&fixture.document_path(), &registry.to_document()).unwrap();

    let doc = document::load(&fixture.document_path()).unwrap();
    let line = doc.services[PROXY]
        .environment_variable(ROUTES_ENV_VAR)
        .unwrap();
    assert_eq!(line, "/app:group.app:4000");
    assert_eq!(doc.meta.locations.len(), 1);
    assert_eq!(doc.meta.locations["/app"], "group.app:4000");
}

#[test]
fn test_hand_edited_locations_are_rejected() {
    let fixture = GroupFixture::new();

    let mut doc = document::load(&fixture.document_path()).unwrap();
    doc.meta
        .locations
        .insert("/rogue".to_string(), "group.api:1".to_string());
    document::save(&fixture.document_path(), &doc).unwrap();

    let doc = document::load(&fixture.document_path()).unwrap();
    let err = ServiceRegistry::from_document(doc, Some(PROXY)).unwrap_err();
    assert!(matches!(err, Error::Format(_)));
}

#[test]
fn test_duplicate_route_leaves_document_untouched() {
    let fixture = GroupFixture::new();
    let before = std::fs::read_to_string(fixture.document_path()).unwrap();

    let doc = document::load(&fixture.document_path()).unwrap();
    let mut registry = ServiceRegistry::from_document(doc, Some(PROXY)).unwrap();
    let err = registry
        .add_service_route("/api", "group.other", 9999)
        .unwrap_err();
    assert!(matches!(err, Error::DuplicatePath(_)));

    // the failing command aborts before saving; the document is unchanged
    let after = std::fs::read_to_string(fixture.document_path()).unwrap();
    assert_eq!(after, before);
}

#[test]
fn test_unknown_service_lookup_fails_typed() {
    let fixture = GroupFixture::new();
    let doc = document::load(&fixture.document_path()).unwrap();
    let registry = ServiceRegistry::from_document(doc, Some(PROXY)).unwrap();
    let err = registry.service("group.absent").unwrap_err();
    assert!(matches!(err, Error::UnknownBackend(name) if name == "group.absent"));
}
