//! Reading and writing the compose document.

use std::fs;
use std::path::Path;

use crate::document::schema::ComposeFile;
use crate::error::Result;

/// File name of the persisted document inside a group directory.
pub const DOCUMENT_NAME: &str = "docker-compose.yml";

/// Read and parse the document at `path`.
pub fn load(path: &Path) -> Result<ComposeFile> {
    let content = fs::read_to_string(path)?;
    Ok(serde_yaml::from_str(&content)?)
}

/// Serialize `doc` and write it to `path`.
pub fn save(path: &Path, doc: &ComposeFile) -> Result<()> {
    let content = serde_yaml::to_string(doc)?;
    fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DOCUMENT_NAME);

        let yaml = concat!(
            "version: '3.7'\n",
            "networks:\n",
            "  group: {driver: bridge}\n",
            "services:\n",
            "  group.nginx:\n",
            "    image: group.nginx\n",
            "    environment:\n",
            "      DYNAMIC_SERVER: ''\n",
            "x-meta:\n",
            "  main: group.nginx\n",
        );
        let doc: ComposeFile = serde_yaml::from_str(yaml).unwrap();

        save(&path, &doc).unwrap();
        let loaded = load(&path).unwrap();
        assert_eq!(loaded, doc);
    }
}
