use crate::cli::RunArgs;
use crate::config::{AppConfig, RunConfig, build_config};
use crate::data::DataManager;
use crate::error::{CliError, Result};
use crate::utils::progress::CliProgressHandler;
use crate::utils::table;
use radexrs::core::molecules::source::DataDirectory;
use radexrs::engine::error::RadexError;
use radexrs::engine::progress::ProgressReporter;
use radexrs::workflows::export;
use radexrs::workflows::session::RadexSession;
use rayon::prelude::*;
use tracing::{error, info};

pub fn run(args: RunArgs) -> Result<()> {
    info!("Initializing data manager...");
    let data_manager = DataManager::new()?;

    info!("Merging run definitions from file and CLI arguments...");
    let app = build_config(&args, &data_manager)?;
    if !app.data_dir.is_dir() {
        return Err(CliError::Data(format!(
            "Molecular data directory does not exist: {:?}.\nHint: pass --data-dir, set RADEX_DATA_DIR or run 'radex data set-path <DIR>'.",
            app.data_dir
        )));
    }
    info!(
        "Solving {} run(s) with data from {:?}",
        app.runs.len(),
        app.data_dir
    );

    let outcomes = if app.runs.len() == 1 {
        vec![solve_with_spinner(&app)]
    } else {
        solve_runs(&app)
    };

    let total = outcomes.len();
    let mut failed = 0;
    for (index, (run, outcome)) in app.runs.iter().zip(outcomes).enumerate() {
        if total > 1 {
            println!("=== Run {} of {} ===", index + 1, total);
        }
        match outcome {
            Ok(session) => {
                print!("{}", table::format_session_report(&run.label, &session));
                write_output(run, &session)?;
            }
            Err(e) => {
                failed += 1;
                error!("Run {} ({}) failed: {}", index + 1, run.label, e);
                eprintln!("✗ Run {} ({}) failed: {}", index + 1, run.label, e);
            }
        }
    }

    if failed > 0 {
        return Err(CliError::RunsFailed { failed, total });
    }
    Ok(())
}

fn solve_with_spinner(app: &AppConfig) -> std::result::Result<RadexSession, RadexError> {
    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());
    let source = DataDirectory::new(&app.data_dir);
    let outcome = RadexSession::with_reporter(app.runs[0].session.clone(), source, &reporter);
    progress_handler.finish();
    outcome
}

/// Solves every run independently on the rayon pool, preserving run order.
pub fn solve_runs(app: &AppConfig) -> Vec<std::result::Result<RadexSession, RadexError>> {
    let source = DataDirectory::new(&app.data_dir);
    app.runs
        .par_iter()
        .map(|run| RadexSession::new(run.session.clone(), source.clone()))
        .collect()
}

fn write_output(run: &RunConfig, session: &RadexSession) -> Result<()> {
    if let Some(path) = &run.output {
        export::write_csv_path(path, session.results())?;
        info!("Wrote {} line(s) to {:?}", session.results().len(), path);
        println!("✓ Results written to: {}", path.display());
    }
    Ok(())
}
