use crate::error::{CliError, Result};
use directories::ProjectDirs;
use radexrs::core::molecules::catalog::MOLECULES;
use radexrs::core::molecules::source::DataDirectory;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Environment variable that overrides the persisted data directory.
pub const DATA_DIR_ENV: &str = "RADEX_DATA_DIR";

#[derive(Debug)]
pub struct DataManager {
    base_path: PathBuf,
}

impl DataManager {
    pub fn new() -> Result<Self> {
        let path = Self::determine_data_path()?;
        debug!("DataManager initialized with path: {:?}", &path);
        Ok(Self { base_path: path })
    }

    pub fn with_custom_path(path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: path.into(),
        }
    }

    pub fn get_data_path(&self) -> &Path {
        &self.base_path
    }

    pub fn source(&self) -> DataDirectory {
        DataDirectory::new(&self.base_path)
    }

    /// Names of catalog data files present in the data directory.
    pub fn available_files(&self) -> Vec<&'static str> {
        MOLECULES
            .iter()
            .map(|m| m.data_file)
            .filter(|file| self.base_path.join(file).is_file())
            .collect()
    }

    pub fn set_custom_path(path: &Path) -> Result<()> {
        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()?.join(path)
        };
        let config_path = Self::get_path_config_file()?;
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(config_path, absolute.to_string_lossy().as_bytes()).map_err(CliError::from)
    }

    pub fn reset_path() -> Result<()> {
        if let Ok(config_path) = Self::get_path_config_file() {
            if config_path.exists() {
                fs::remove_file(config_path)?;
            }
        }
        Ok(())
    }

    fn determine_data_path() -> Result<PathBuf> {
        if let Some(path) = std::env::var_os(DATA_DIR_ENV).filter(|v| !v.is_empty()) {
            debug!("Using data directory from {}.", DATA_DIR_ENV);
            return Ok(PathBuf::from(path));
        }
        match Self::get_path_config_file() {
            Ok(config_path) if config_path.exists() => {
                let custom_path_str = fs::read_to_string(&config_path)?.trim().to_string();
                if custom_path_str.is_empty() {
                    warn!("Custom path config file is empty, falling back to default path.");
                    Self::get_default_data_path()
                } else {
                    Ok(PathBuf::from(custom_path_str))
                }
            }
            _ => Self::get_default_data_path(),
        }
    }

    fn get_path_config_file() -> Result<PathBuf> {
        ProjectDirs::from("org", "radexrs", "radex")
            .map(|dirs| dirs.config_dir().join("path.conf"))
            .ok_or_else(|| CliError::Data("Could not determine config directory path.".to_string()))
    }

    fn get_default_data_path() -> Result<PathBuf> {
        ProjectDirs::from("org", "radexrs", "radex")
            .map(|dirs| dirs.data_dir().to_path_buf())
            .ok_or_else(|| {
                CliError::Data("Could not determine default data directory path.".to_string())
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use radexrs::core::molecules::source::MoleculeSource;
    use serial_test::serial;
    use tempfile::tempdir;

    #[test]
    fn available_files_lists_only_present_catalog_files() {
        let temp_dir = tempdir().unwrap();
        fs::write(temp_dir.path().join("co.dat"), "").unwrap();
        fs::write(temp_dir.path().join("hco+@xpol.dat"), "").unwrap();
        fs::write(temp_dir.path().join("notes.txt"), "").unwrap();

        let manager = DataManager::with_custom_path(temp_dir.path());
        assert_eq!(manager.available_files(), vec!["co.dat", "hco+@xpol.dat"]);
    }

    #[test]
    fn source_reads_from_base_path() {
        let temp_dir = tempdir().unwrap();
        let manager = DataManager::with_custom_path(temp_dir.path());
        assert_eq!(manager.source().root(), temp_dir.path());
        assert!(manager.source().load("co.dat").is_err());
    }

    #[test]
    #[serial]
    fn environment_variable_takes_precedence() {
        let temp_dir = tempdir().unwrap();
        // SAFETY: tests touching the environment are serialized.
        unsafe { std::env::set_var(DATA_DIR_ENV, temp_dir.path()) };
        let manager = DataManager::new();
        unsafe { std::env::remove_var(DATA_DIR_ENV) };
        assert_eq!(manager.unwrap().get_data_path(), temp_dir.path());
    }
}
