use anyhow::Result;
use std::path::{Path, PathBuf};

pub const BASE_PATH_ENV: &str = "REELTRACK_BASE_PATH";

/// Base directory for container deployments; `$REELTRACK_BASE_PATH` or "/app".
pub fn container_base_path() -> PathBuf {
    std::env::var(BASE_PATH_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/app"))
}

#[derive(Debug, Clone)]
pub struct PathManager {
    config_dir: PathBuf,
    data_dir: PathBuf,
    log_dir: PathBuf,
}

impl PathManager {
    pub fn new() -> Result<Self> {
        let base_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?
            .join("reeltrack");
        Ok(Self::at(base_dir))
    }

    /// Config files at `base`, data and logs in subdirectories.
    pub fn at(base: impl Into<PathBuf>) -> Self {
        let base = base.into();
        Self {
            config_dir: base.clone(),
            data_dir: base.join("data"),
            log_dir: base.join("logs"),
        }
    }

    pub fn from_env() -> Self {
        Self::at(container_base_path())
    }

    /// Keep config and logs where they are but store data elsewhere.
    pub fn with_data_dir(mut self, data_dir: impl Into<PathBuf>) -> Self {
        self.data_dir = data_dir.into();
        self
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    /// Where the key-value collection files live.
    pub fn collection_dir(&self) -> PathBuf {
        self.data_dir.join("collection")
    }

    pub fn backup_dir(&self) -> PathBuf {
        self.data_dir.join("backups")
    }

    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join("config.toml")
    }

    pub fn credentials_file(&self) -> PathBuf {
        self.config_dir.join("credentials.toml")
    }

    pub fn log_file(&self) -> PathBuf {
        self.log_dir.join("reeltrack.log")
    }

    pub fn ensure_directories(&self) -> Result<()> {
        std::fs::create_dir_all(&self.config_dir)?;
        std::fs::create_dir_all(&self.data_dir)?;
        std::fs::create_dir_all(&self.log_dir)?;
        std::fs::create_dir_all(self.collection_dir())?;
        Ok(())
    }
}

impl Default for PathManager {
    fn default() -> Self {
        // An explicit base path wins over platform directories
        if std::env::var_os(BASE_PATH_ENV).is_some() {
            return Self::from_env();
        }

        // Otherwise, use platform-specific paths (e.g., ~/.config/reeltrack on Linux)
        Self::new().unwrap_or_else(|_| Self::from_env())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_layout_under_base() {
        let paths = PathManager::at("/srv/reeltrack");
        assert_eq!(paths.config_file(), PathBuf::from("/srv/reeltrack/config.toml"));
        assert_eq!(paths.collection_dir(), PathBuf::from("/srv/reeltrack/data/collection"));
        assert_eq!(paths.log_dir(), Path::new("/srv/reeltrack/logs"));

        let moved = paths.with_data_dir("/mnt/media");
        assert_eq!(moved.collection_dir(), PathBuf::from("/mnt/media/collection"));
        assert_eq!(moved.credentials_file(), PathBuf::from("/srv/reeltrack/credentials.toml"));
    }

    #[test]
    fn test_ensure_directories() {
        let dir = TempDir::new().unwrap();
        let paths = PathManager::at(dir.path().join("reeltrack"));
        paths.ensure_directories().unwrap();
        assert!(paths.collection_dir().is_dir());
        assert!(paths.log_dir().is_dir());
    }
}
