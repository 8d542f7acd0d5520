use radexrs::engine::config::SessionConfig;
use std::path::PathBuf;

pub struct AppConfig {
    pub data_dir: PathBuf,
    pub runs: Vec<RunConfig>,
}

pub struct RunConfig {
    /// Molecule name as the user wrote it.
    pub label: String,
    pub session: SessionConfig,
    pub output: Option<PathBuf>,
}
