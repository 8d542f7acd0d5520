use clap::{Args, Parser, Subcommand};
use radexrs::core::molecules::catalog::Catalog;
use radexrs::core::radiation::escape::Geometry;
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "radexrs contributors",
    version,
    about = "RADEX CLI - non-LTE excitation and line intensities of interstellar molecules in the escape-probability approximation.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Set the number of threads used to solve a batch of runs.
    /// Defaults to the number of available logical cores.
    #[arg(short = 'j', long, global = true, value_name = "NUM")]
    pub threads: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Solve for level populations and line intensities.
    Run(RunArgs),
    /// List the supported molecules and their catalog names.
    Molecules,
    /// Manage the directory holding the LAMDA molecular data files.
    Data(DataArgs),
}

/// Arguments for the `run` subcommand.
///
/// Without `--config` a single run is described entirely by flags. With a run
/// file, every flag given here overrides the corresponding value of every run
/// in the file.
#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Path to a run file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Directory containing the LAMDA data files.
    #[arg(long, value_name = "PATH")]
    pub data_dir: Option<PathBuf>,

    // --- Molecule ---
    /// Molecule, by catalog name (e.g. 'CO', 'HCO+, v=0'), display name or data file.
    #[arg(short, long, value_name = "NAME")]
    pub molecule: Option<String>,

    /// Catalog whose naming scheme identifies the molecule.
    #[arg(long, value_name = "jpl|cologne")]
    pub catalog: Option<Catalog>,

    // --- Physical conditions ---
    /// Kinetic temperature in K.
    #[arg(short = 't', long, value_name = "K")]
    pub tkin: Option<f64>,

    /// Background radiation temperature in K (0 selects the galactic field).
    #[arg(long, value_name = "K")]
    pub tbg: Option<f64>,

    /// Molecular column density in cm^-2.
    #[arg(short = 'N', long, value_name = "CM^-2")]
    pub column_density: Option<f64>,

    /// Line width (FWHM) in km/s.
    #[arg(short = 'w', long, value_name = "KM/S")]
    pub line_width: Option<f64>,

    /// Collision partner density, repeatable. Example: --density H2=1e4
    #[arg(short = 'd', long = "density", value_name = "PARTNER=CM^-3")]
    pub densities: Vec<String>,

    /// Escape probability geometry (sphere, lvg, slab).
    #[arg(short, long, value_name = "GEOMETRY")]
    pub geometry: Option<Geometry>,

    // --- Output selection ---
    /// Lowest rest frequency to report, in GHz.
    #[arg(long, value_name = "GHZ")]
    pub fmin: Option<f64>,

    /// Highest rest frequency to report, in GHz.
    #[arg(long, value_name = "GHZ")]
    pub fmax: Option<f64>,

    /// Write the line results as CSV to this path. With several runs the run
    /// number is appended to the file name.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,
}

/// Arguments for the `data` subcommand.
#[derive(Args, Debug)]
pub struct DataArgs {
    #[command(subcommand)]
    pub command: DataCommands,
}

/// Available commands for data management.
#[derive(Subcommand, Debug)]
pub enum DataCommands {
    /// Show the absolute path to the molecular data directory.
    Path,
    /// Set a custom absolute path for the molecular data directory.
    SetPath {
        /// The directory containing the LAMDA data files.
        #[arg(required = true)]
        path: PathBuf,
    },
    /// Reset the data path to its default, OS-specific location.
    ResetPath,
}
