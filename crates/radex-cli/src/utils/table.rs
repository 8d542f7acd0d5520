use radexrs::core::molecules::catalog::{self, Catalog, MOLECULES};
use radexrs::workflows::session::RadexSession;
use std::fmt::Write;

/// Human-readable report of one solved session: parameters, warnings and a
/// fixed-width line table.
pub fn format_session_report(label: &str, session: &RadexSession) -> String {
    let config = &session.config;
    let mut out = String::new();

    let effective = catalog::molecule(session.effective_molecule()).map_or("?", |m| m.name);
    let _ = writeln!(out, "* Molecule        : {} ({})", label, effective);
    let _ = writeln!(out, "* Catalog         : {}", config.catalog);
    let _ = writeln!(out, "* T(kin)      [K] : {:.3}", config.tkin);
    for (partner, density) in &config.partners {
        let _ = writeln!(out, "* n({:<5}) [cm-3] : {:.3e}", partner.to_string(), density);
    }
    let _ = writeln!(out, "* T(background)   : {:.3}", config.tbg);
    let _ = writeln!(out, "* N       [cm-2]  : {:.3e}", config.column_density);
    let _ = writeln!(out, "* Line width [km/s]: {:.3}", config.line_width);
    let _ = writeln!(out, "* Geometry        : {}", config.geometry);
    let _ = writeln!(out, "* Iterations      : {}", session.iterations());
    for warning in session.warnings() {
        let _ = writeln!(out, "! {}", warning);
    }

    let _ = writeln!(
        out,
        "{:>8} {:>8} {:>9} {:>14} {:>12} {:>9} {:>11} {:>11} {:>11} {:>11} {:>12}",
        "UP",
        "LOW",
        "E_UP",
        "FREQ",
        "WAVEL",
        "T_EX",
        "TAU",
        "T_R",
        "POP UP",
        "POP LOW",
        "FLUX"
    );
    let _ = writeln!(
        out,
        "{:>8} {:>8} {:>9} {:>14} {:>12} {:>9} {:>11} {:>11} {:>11} {:>11} {:>12}",
        "", "", "(K)", "(GHz)", "(um)", "(K)", "", "(K)", "", "", "(K*km/s)"
    );
    let populations = session.populations();
    let transitions = &session.data().transitions;
    for result in session.results() {
        let line = &transitions[result.line];
        let _ = writeln!(
            out,
            "{:>8} {:>8} {:>9.1} {:>14.4} {:>12.4} {:>9.3} {:>11.3e} {:>11.3e} {:>11.3e} {:>11.3e} {:>12.3e}",
            truncate(&result.upper, 8),
            truncate(&result.lower, 8),
            result.upper_energy_k,
            result.frequency_ghz,
            result.wavelength_um,
            result.tex,
            result.tau,
            result.radiation_temperature,
            populations[line.upper],
            populations[line.lower],
            result.flux_k_kms
        );
    }
    out
}

/// The supported molecules with their catalog names and data files.
pub fn format_catalog() -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:>3}  {:<11} {:<10} {:<16} {}",
        "#", "NAME", "JPL", "COLOGNE", "DATA FILE"
    );
    for (index, entry) in MOLECULES.iter().enumerate() {
        let _ = writeln!(
            out,
            "{:>3}  {:<11} {:<10} {:<16} {}",
            index,
            entry.name,
            entry.catalog_name(Catalog::Jpl).unwrap_or("-"),
            entry.catalog_name(Catalog::Cologne).unwrap_or("-"),
            entry.data_file
        );
    }
    out
}

fn truncate(label: &str, width: usize) -> &str {
    match label.char_indices().nth(width) {
        Some((end, _)) => &label[..end],
        None => label,
    }
}
