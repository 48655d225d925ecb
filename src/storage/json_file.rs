use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tempfile::NamedTempFile;

use super::Storage;

/// File-based storage implementation.
///
/// Each key maps to one JSON file under the base directory; `/` in a key
/// becomes a directory separator:
/// ```text
/// data/
///   config/
///     client.json
/// ```
pub struct JsonFileStorage {
    base_path: PathBuf,
}

impl JsonFileStorage {
    pub fn new(base_path: impl AsRef<Path>) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
        }
    }

    /// Path of the file backing `key`.
    ///
    /// Keys must be made of plain path segments so they can't escape the
    /// base directory.
    fn key_file(&self, key: &str) -> Result<PathBuf> {
        let mut path = self.base_path.clone();
        let mut segments = key.split('/').peekable();
        while let Some(segment) = segments.next() {
            if segment.is_empty()
                || segment == "."
                || segment == ".."
                || segment.contains('\\')
                || segment.contains('\0')
            {
                anyhow::bail!("Invalid storage key {key:?}");
            }
            if segments.peek().is_some() {
                path.push(segment);
            } else {
                path.push(format!("{segment}.json"));
            }
        }
        Ok(path)
    }

    fn ensure_dir(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }
        Ok(())
    }
}

impl Storage for JsonFileStorage {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.key_file(key)?;
        match fs::read(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("Failed to read {}", path.display())),
        }
    }

    fn put(&self, key: &str, value: &[u8]) -> Result<()> {
        let path = self.key_file(key)?;
        self.ensure_dir(&path)?;

        // Write next to the target and rename over it so readers never see a
        // partially written file.
        let dir = path.parent().unwrap_or(self.base_path.as_path());
        let mut tmp = NamedTempFile::new_in(dir)
            .with_context(|| format!("Failed to create temp file in {}", dir.display()))?;
        tmp.write_all(value).context("Failed to write temp file")?;
        tmp.as_file().sync_all().context("Failed to sync temp file")?;
        tmp.persist(&path)
            .with_context(|| format!("Failed to replace {}", path.display()))?;

        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        let path = self.key_file(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("Failed to delete {}", path.display())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn key_maps_to_nested_json_file() -> Result<()> {
        let storage = JsonFileStorage::new("/data");
        assert_eq!(
            storage.key_file("config/client")?,
            PathBuf::from("/data/config/client.json")
        );
        Ok(())
    }

    #[test]
    fn rejects_keys_that_escape_base_dir() {
        let storage = JsonFileStorage::new("/data");
        for key in ["", "../etc/passwd", "config//client", "config/./client", "a\\b"] {
            assert!(storage.key_file(key).is_err(), "key {key:?} should be rejected");
        }
    }

    #[test]
    fn put_get_delete() -> Result<()> {
        let dir = TempDir::new()?;
        let storage = JsonFileStorage::new(dir.path());

        assert_eq!(storage.get("config/client")?, None);

        storage.put("config/client", br#"{"a":1}"#)?;
        assert!(dir.path().join("config/client.json").exists());
        assert_eq!(storage.get("config/client")?, Some(br#"{"a":1}"#.to_vec()));

        storage.put("config/client", b"{}")?;
        assert_eq!(storage.get("config/client")?, Some(b"{}".to_vec()));

        storage.delete("config/client")?;
        assert_eq!(storage.get("config/client")?, None);

        Ok(())
    }

    #[test]
    fn delete_missing_key_succeeds() -> Result<()> {
        let dir = TempDir::new()?;
        let storage = JsonFileStorage::new(dir.path());
        storage.delete("config/client")?;
        Ok(())
    }
}
