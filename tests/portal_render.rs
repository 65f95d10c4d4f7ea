//! End-to-end render: registry → sorted routes → spliced site config.

use portalctl::commands::{rebuild, GlobalOpts};
use portalctl::document;
use portalctl::services::ServiceRegistry;
use portalctl::Error;

mod common;
use common::{GroupFixture, PROXY};

fn opts(fixture: &GroupFixture) -> GlobalOpts {
    GlobalOpts {
        directory: fixture.group_dir().to_path_buf(),
        proxy_name: PROXY.to_string(),
        quiet: true,
        overwrite: false,
        no_overwrite: false,
    }
}

const TEMPLATE: &str = "server {\n\
                        \tlisten 80;\n\
                        \tlocation / {\n\
                        \t\troot /www/build;\n\
                        \t}\n\
                        }\n";

#[test]
fn test_rebuild_portal_renders_sorted_blocks() {
    let fixture = GroupFixture::new();
    fixture.write_template(TEMPLATE);

    let doc = document::load(&fixture.document_path()).unwrap();
    let mut registry = ServiceRegistry::from_document(doc, Some(PROXY)).unwrap();
    registry.add_service_route("/", "group.spa", 3005).unwrap();

    let affected = rebuild::run(&registry, &opts(&fixture)).unwrap();
    assert_eq!(affected, vec![PROXY.to_string()]);

    let rendered = std::fs::read_to_string(fixture.rendered_site()).unwrap();

    // every route got a block, the generic ones after the specific ones
    let v2 = rendered.find("location /api/v2 {").unwrap();
    let api = rendered.find("location /api {").unwrap();
    let spa = rendered.find("set $upstream http://group.spa:3005;").unwrap();
    assert!(v2 < api);
    assert!(api < spa);

    // generated blocks land before the template's catch-all
    let catch_all = rendered.rfind("root /www/build;").unwrap();
    assert!(spa < catch_all);

    // template content passes through unchanged
    assert!(rendered.contains("listen 80;"));
    assert!(rendered.starts_with("server {\n"));

    // full block shape for one route
    assert!(rendered.contains(
        "\tlocation /api {\n\
         \t\tset $upstream http://group.api:3000;\n\
         \t\trewrite ^/api/(.*) /$1  break;\n\
         \t\tproxy_pass $upstream;\n\
         \t}\n"
    ));
}

#[test]
fn test_rebuild_without_template_fails_and_writes_nothing() {
    let fixture = GroupFixture::new();

    let doc = document::load(&fixture.document_path()).unwrap();
    let registry = ServiceRegistry::from_document(doc, Some(PROXY)).unwrap();

    let err = rebuild::run(&registry, &opts(&fixture)).unwrap_err();
    assert!(matches!(err, Error::TemplateNotFound(_)));
    assert!(!fixture.rendered_site().exists());
}
