use crate::core::Storage;
use crate::utils::error::Result;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone)]
pub struct LocalStorage {
    base_path: String,
}

impl LocalStorage {
    pub fn new(base_path: String) -> Self {
        Self { base_path }
    }
}

impl Storage for LocalStorage {
    async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
        // 絕對路徑會取代 base_path
        let full_path = Path::new(&self.base_path).join(path);

        if let Some(parent) = full_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        fs::write(full_path, data)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_write_file_creates_parent_directories() {
        let temp_dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(temp_dir.path().to_str().unwrap().to_string());

        storage
            .write_file("exports/2024/study_results.csv", b"prolific_id\n")
            .await
            .unwrap();

        let written = fs::read(temp_dir.path().join("exports/2024/study_results.csv")).unwrap();
        assert_eq!(written, b"prolific_id\n");
    }

    #[tokio::test]
    async fn test_absolute_path_ignores_base() {
        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("abs.csv");
        let storage = LocalStorage::new("unused-base".to_string());

        storage
            .write_file(target.to_str().unwrap(), b"x")
            .await
            .unwrap();

        assert!(target.exists());
        assert!(!Path::new("unused-base").exists());
    }
}
