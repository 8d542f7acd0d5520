use super::defaults::DefaultsConfig;
use super::file::{FileConfig, FileRunConfig};
use super::models::{AppConfig, RunConfig};
use crate::cli::RunArgs;
use crate::data::DataManager;
use crate::error::{CliError, Result};
use radexrs::core::molecules::catalog::{self, Catalog, MoleculeId};
use radexrs::core::molecules::partner::CollisionPartner;
use radexrs::core::radiation::escape::Geometry;
use radexrs::engine::config::SessionConfigBuilder;
use std::path::PathBuf;
use tracing::debug;

pub fn build_config(args: &RunArgs, data_manager: &DataManager) -> Result<AppConfig> {
    let defaults = DefaultsConfig::default();

    let file_config = if let Some(config_path) = &args.config {
        FileConfig::from_file(config_path)?
    } else {
        FileConfig::default()
    };

    let data_dir = args
        .data_dir
        .clone()
        .or(file_config.data_dir)
        .unwrap_or_else(|| data_manager.get_data_path().to_path_buf());
    let solver = file_config.solver.unwrap_or_default();

    let file_runs = if file_config.run.is_empty() {
        vec![FileRunConfig::default()]
    } else {
        file_config.run
    };
    let total = file_runs.len();
    debug!("Building {} run(s).", total);

    let cli_densities = parse_densities(&args.densities)?;

    let runs = file_runs
        .into_iter()
        .enumerate()
        .map(|(index, file_run)| -> Result<RunConfig> {
            let label = args
                .molecule
                .clone()
                .or(file_run.molecule.clone())
                .ok_or_else(|| {
                    CliError::Config(format!(
                        "Run {}: a molecule is required either in the run file or via --molecule.",
                        index + 1
                    ))
                })?;

            let catalog = match args.catalog {
                Some(catalog) => catalog,
                None => parse_catalog(file_run.catalog.as_deref().unwrap_or(defaults.catalog))?,
            };
            let geometry = match args.geometry {
                Some(geometry) => geometry,
                None => {
                    parse_geometry(file_run.geometry.as_deref().unwrap_or(defaults.geometry))?
                }
            };
            let molecule = resolve_molecule(&label, catalog)?;

            let partners = if cli_densities.is_empty() {
                file_run
                    .densities
                    .iter()
                    .map(|(name, &density)| -> Result<_> {
                        Ok((parse_partner(name)?, density))
                    })
                    .collect::<Result<Vec<_>>>()?
            } else {
                cli_densities.clone()
            };

            let mut builder = SessionConfigBuilder::new()
                .molecule(molecule)
                .catalog(catalog)
                .tbg(args.tbg.or(file_run.tbg).unwrap_or(defaults.tbg))
                .frequency_range(
                    args.fmin.or(file_run.fmin).unwrap_or(defaults.fmin),
                    args.fmax.or(file_run.fmax).unwrap_or(defaults.fmax),
                )
                .geometry(geometry)
                .solver(solver);
            if let Some(tkin) = args.tkin.or(file_run.tkin) {
                builder = builder.tkin(tkin);
            }
            if let Some(column_density) = args.column_density.or(file_run.column_density) {
                builder = builder.column_density(column_density);
            }
            if let Some(line_width) = args.line_width.or(file_run.line_width) {
                builder = builder.line_width(line_width);
            }
            for (partner, density) in partners {
                builder = builder.partner(partner, density);
            }
            let session = builder
                .build()
                .map_err(|e| CliError::Config(format!("Run {}: {}", index + 1, e)))?;

            let output = match &args.output {
                Some(path) => Some(numbered_output_path(path, index + 1, total)),
                None => file_run.output.clone(),
            };

            Ok(RunConfig {
                label,
                session,
                output,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(AppConfig { data_dir, runs })
}

fn resolve_molecule(name: &str, catalog: Catalog) -> Result<MoleculeId> {
    catalog::find_by_catalog_name(name, catalog)
        .or_else(|| catalog::find_by_name(name))
        .ok_or_else(|| {
            CliError::Argument(format!(
                "Unknown molecule '{}'. Run 'radex molecules' to list the supported names.",
                name
            ))
        })
}

fn parse_catalog(value: &str) -> Result<Catalog> {
    value
        .parse()
        .map_err(|e| CliError::Config(format!("Invalid catalog '{}': {}", value, e)))
}

fn parse_geometry(value: &str) -> Result<Geometry> {
    value
        .parse()
        .map_err(|e| CliError::Config(format!("Invalid geometry '{}': {}", value, e)))
}

fn parse_partner(value: &str) -> Result<CollisionPartner> {
    value
        .parse()
        .map_err(|_| CliError::Argument(format!("Unknown collision partner '{}'.", value)))
}

fn parse_densities(pairs: &[String]) -> Result<Vec<(CollisionPartner, f64)>> {
    pairs
        .iter()
        .map(|pair| -> Result<(CollisionPartner, f64)> {
            let (name, value) = pair.split_once('=').ok_or_else(|| {
                CliError::Argument(format!(
                    "Invalid --density format: '{}'. Expected PARTNER=VALUE.",
                    pair
                ))
            })?;
            let density = value.trim().parse().map_err(|_| {
                CliError::Argument(format!("Invalid density value for {}: {}", name, value))
            })?;
            Ok((parse_partner(name.trim())?, density))
        })
        .collect()
}

/// `out.csv` becomes `out-2.csv` for the second of several runs.
fn numbered_output_path(path: &std::path::Path, index: usize, total: usize) -> PathBuf {
    if total <= 1 {
        return path.to_path_buf();
    }
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match path.extension() {
        Some(ext) => format!("{}-{}.{}", stem, index, ext.to_string_lossy()),
        None => format!("{}-{}", stem, index),
    };
    path.with_file_name(name)
}
