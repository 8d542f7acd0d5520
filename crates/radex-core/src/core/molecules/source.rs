use super::lamda::{LamdaError, LamdaFile, RawMoleculeRecord};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DataError {
    #[error("Molecular data file '{name}' not found (looked in '{location}')")]
    NotFound { name: String, location: String },
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("Malformed molecular data in '{name}': {source}")]
    Lamda {
        name: String,
        #[source]
        source: LamdaError,
    },
    #[error("Invalid molecular data in '{name}': {reason}")]
    Invalid { name: String, reason: String },
}

/// Provides raw molecular records by data file name.
///
/// The solver only ever asks for a record by the file name listed in the
/// molecule catalog; where the bytes come from is up to the implementor.
pub trait MoleculeSource: Send + Sync {
    fn load(&self, file_name: &str) -> Result<RawMoleculeRecord, DataError>;
}

/// Reads LAMDA files from a directory on disk.
#[derive(Debug, Clone)]
pub struct DataDirectory {
    root: PathBuf,
}

impl DataDirectory {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl MoleculeSource for DataDirectory {
    fn load(&self, file_name: &str) -> Result<RawMoleculeRecord, DataError> {
        let path = self.root.join(file_name);
        if !path.is_file() {
            return Err(DataError::NotFound {
                name: file_name.to_string(),
                location: self.root.to_string_lossy().to_string(),
            });
        }
        LamdaFile::read_from_path(&path).map_err(|e| match e {
            LamdaError::Io(source) => DataError::Io {
                path: path.to_string_lossy().to_string(),
                source,
            },
            other => DataError::Lamda {
                name: file_name.to_string(),
                source: other,
            },
        })
    }
}

/// Holds LAMDA text in memory, keyed by file name.
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    files: HashMap<String, String>,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, file_name: impl Into<String>, content: impl Into<String>) -> Self {
        self.insert(file_name, content);
        self
    }

    pub fn insert(&mut self, file_name: impl Into<String>, content: impl Into<String>) {
        self.files.insert(file_name.into(), content.into());
    }
}

impl MoleculeSource for InMemorySource {
    fn load(&self, file_name: &str) -> Result<RawMoleculeRecord, DataError> {
        let content = self.files.get(file_name).ok_or_else(|| DataError::NotFound {
            name: file_name.to_string(),
            location: "memory".to_string(),
        })?;
        LamdaFile::parse_str(content).map_err(|source| DataError::Lamda {
            name: file_name.to_string(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    const MINIMAL: &str = "\
!MOLECULE
X
!WEIGHT
10.0
!NLEV
2
1 0.0 1.0 0
2 1.0 3.0 1
!NLIN
1
1 2 1 1.0e-6 29.9792458 1.44
!NPART
1
!PARTNER
1 X-H2
!NCOL
1
!NTEMP
1
!TEMPS
10.0
1 2 1 1.0e-11
";

    #[test]
    fn data_directory_loads_existing_file() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("x.dat"), MINIMAL).unwrap();
        let source = DataDirectory::new(dir.path());
        let record = source.load("x.dat").unwrap();
        assert_eq!(record.name, "X");
        assert_eq!(record.levels.len(), 2);
    }

    #[test]
    fn data_directory_reports_missing_file() {
        let dir = tempdir().unwrap();
        let source = DataDirectory::new(dir.path());
        assert!(matches!(
            source.load("missing.dat"),
            Err(DataError::NotFound { name, .. }) if name == "missing.dat"
        ));
    }

    #[test]
    fn data_directory_wraps_parse_failures_with_file_name() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("bad.dat"), "X\nnot-a-number\n").unwrap();
        let source = DataDirectory::new(dir.path());
        assert!(matches!(
            source.load("bad.dat"),
            Err(DataError::Lamda { name, .. }) if name == "bad.dat"
        ));
    }

    #[test]
    fn in_memory_source_serves_registered_files() {
        let source = InMemorySource::new().with_file("x.dat", MINIMAL);
        assert_eq!(source.load("x.dat").unwrap().transitions.len(), 1);
        assert!(matches!(source.load("y.dat"), Err(DataError::NotFound { .. })));
    }
}
