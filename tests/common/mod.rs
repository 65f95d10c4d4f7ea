//! Shared fixtures for integration tests.

use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;

pub const GROUP: &str = "group";
pub const PROXY: &str = "group.nginx";

/// A group directory with a persisted document and a proxy site template.
pub struct GroupFixture {
    _root: TempDir,
    group_dir: PathBuf,
}

impl GroupFixture {
    /// Lay out a group named `group` with an api backend, a redis cache and
    /// two routes on the proxy.
    pub fn new() -> Self {
        let root = TempDir::new().unwrap();
        let group_dir = root.path().join(GROUP);
        fs::create_dir(&group_dir).unwrap();

        let document = concat!(
            "version: '3.7'\n",
            "networks:\n",
            "  group: {driver: bridge}\n",
            "services:\n",
            "  group.nginx:\n",
            "    container_name: group.nginx\n",
            "    image: group.nginx\n",
            "    ports: ['8080:80']\n",
            "    environment:\n",
            "      DYNAMIC_SERVER: '/api/v2:group.api:3001;/api:group.api:3000'\n",
            "  group.api:\n",
            "    container_name: group.api\n",
            "    image: group.api\n",
            "    build: {context: ./group.api/}\n",
            "  group.redis:\n",
            "    container_name: group.redis\n",
            "    image: group.redis\n",
            "x-meta:\n",
            "  main: group.nginx\n",
            "  docker_data:\n",
            "    group.api: {compile-script: node}\n",
            "  locations:\n",
            "    /api: 'group.api:3000'\n",
            "    /api/v2: 'group.api:3001'\n",
        );
        fs::write(group_dir.join("docker-compose.yml"), document).unwrap();
        Self {
            _root: root,
            group_dir,
        }
    }

    pub fn group_dir(&self) -> &std::path::Path {
        &self.group_dir
    }

    pub fn document_path(&self) -> PathBuf {
        self.group_dir.join("docker-compose.yml")
    }

    /// Write the proxy's site template, returning its path.
    #[allow(dead_code)]
    pub fn write_template(&self, contents: &str) -> PathBuf {
        let available = self.group_dir.join(PROXY).join("sites-available");
        fs::create_dir_all(&available).unwrap();
        let path = available.join("portal");
        fs::write(&path, contents).unwrap();
        path
    }

    #[allow(dead_code)]
    pub fn rendered_site(&self) -> PathBuf {
        self.group_dir.join(PROXY).join("sites-enabled").join("portal")
    }
}
