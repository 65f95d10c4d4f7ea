//! Template splicing for the proxy site config.

use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{Error, Result};
use crate::routing::RouteEntry;

/// Root catch-all location line, the preferred insertion point.
static CATCH_ALL_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*location\s+/\s+\{").expect("invalid pattern")
});

/// Server block opener, the fallback insertion point.
static SERVER_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*server\s+\{").expect("invalid pattern"));

/// Render the site config: read `template`, splice one location block per
/// route (most specific first, as produced by `sorted_for_rendering`) and
/// write the result to `output`.
///
/// Fails with [`Error::TemplateNotFound`] when the template is absent; no
/// partial output is written.
pub fn render(template: &Path, output: &Path, routes: &[RouteEntry]) -> Result<()> {
    if !template.is_file() {
        return Err(Error::TemplateNotFound(template.to_path_buf()));
    }
    let contents = fs::read_to_string(template)?;
    let mut lines: Vec<String> = contents.split_inclusive('\n').map(String::from).collect();

    let index = insertion_index(&lines).min(lines.len());
    let blocks = routes.iter().map(location_block);
    lines.splice(index..index, blocks);

    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(output, lines.concat())?;

    tracing::info!(
        template = %template.display(),
        output = %output.display(),
        routes = routes.len(),
        "Rendered proxy site config"
    );
    Ok(())
}

/// Convenience wrapper using the on-disk layout of a proxy service directory:
/// template at `sites-available/<site>`, output at `sites-enabled/<site>`.
pub fn render_site(
    base_dir: &Path,
    proxy_fullname: &str,
    site: &str,
    routes: &[RouteEntry],
) -> Result<()> {
    let service_dir = base_dir.join(proxy_fullname);
    render(
        &service_dir.join("sites-available").join(site),
        &service_dir.join("sites-enabled").join(site),
        routes,
    )
}

/// Index at which generated blocks are spliced in: the root catch-all
/// `location / {` line, else the line after the first `server {` line, else
/// line index 1.
fn insertion_index(lines: &[String]) -> usize {
    if let Some(i) = lines.iter().position(|line| CATCH_ALL_LINE.is_match(line)) {
        return i;
    }
    if let Some(i) = lines.iter().position(|line| SERVER_LINE.is_match(line)) {
        return i + 1;
    }
    1
}

fn location_block(route: &RouteEntry) -> String {
    format!(
        "\tlocation {path} {{\n\
         \t\tset $upstream http://{name}:{port};\n\
         \t\trewrite ^{path}/(.*) /$1  break;\n\
         \t\tproxy_pass $upstream;\n\
         \t}}\n",
        path = route.path(),
        name = route.backend(),
        port = route.port(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn route(path: &str, backend: &str, port: u16) -> RouteEntry {
        RouteEntry::new(path, backend, port).unwrap()
    }

    fn render_str(template: &str, routes: &[RouteEntry]) -> String {
        let dir = tempfile::tempdir().unwrap();
        let template_path = dir.path().join("portal");
        let output_path = dir.path().join("out").join("portal");
        std::fs::write(&template_path, template).unwrap();
        render(&template_path, &output_path, routes).unwrap();
        std::fs::read_to_string(&output_path).unwrap()
    }

    #[test]
    fn test_block_format() {
        let block = location_block(&route("/api", "group.api", 3000));
        assert_eq!(
            block,
            "\tlocation /api {\n\
             \t\tset $upstream http://group.api:3000;\n\
             \t\trewrite ^/api/(.*) /$1  break;\n\
             \t\tproxy_pass $upstream;\n\
             \t}\n"
        );
    }

    #[test]
    fn test_splices_before_catch_all_location() {
        let template = "server {\n\tlisten 80;\n\tlocation / {\n\t\troot /www;\n\t}\n}\n";
        let out = render_str(template, &[route("/api", "a", 1)]);
        let api_pos = out.find("location /api").unwrap();
        let root_pos = out.find("location / {").unwrap();
        assert!(api_pos < root_pos);
        // template lines all survive
        assert!(out.contains("listen 80;"));
        assert!(out.contains("root /www;"));
    }

    #[test]
    fn test_falls_back_to_line_after_server_open() {
        let template = "server {\n\tlisten 80;\n}\n";
        let out = render_str(template, &[route("/api", "a", 1)]);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "server {");
        assert_eq!(lines[1], "\tlocation /api {");
    }

    #[test]
    fn test_falls_back_to_line_index_one() {
        let template = "# no server here\n# just comments\n";
        let out = render_str(template, &[route("/api", "a", 1)]);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "# no server here");
        assert_eq!(lines[1], "\tlocation /api {");
        assert_eq!(lines.last().copied(), Some("# just comments"));
    }

    #[test]
    fn test_generic_route_rendered_after_specific() {
        let template = "server {\n}\n";
        let mut table = crate::routing::RoutingTable::new();
        table.add_route("/x", "a", 1).unwrap();
        table.add_route("/", "b", 2).unwrap();
        let out = render_str(template, &table.sorted_for_rendering());
        assert!(out.find("location /x").unwrap() < out.find("location / {").unwrap());
    }

    #[test]
    fn test_missing_template_is_fatal_without_output() {
        let dir = tempfile::tempdir().unwrap();
        let template = dir.path().join("absent");
        let output = dir.path().join("out").join("portal");
        let err = render(&template, &output, &[]).unwrap_err();
        assert!(matches!(err, Error::TemplateNotFound(_)));
        assert!(!output.exists());
    }
}
