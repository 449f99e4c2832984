use std::{env, error::Error, path::PathBuf, process};

use config::ReportConfig;
use report::run_report;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

pub mod aggregate;
pub mod boundaries;
pub mod config;
pub mod error;
pub mod income;
pub mod join;
pub mod permits;
pub mod report;
pub mod temporal;
pub mod zipcodes;

/// Borough names as the permit export spells them, in `Borough` order.
pub const BOROUGHS: [&'static str; 5] = [
    "Manhattan",
    "Brooklyn",
    "Queens",
    "Bronx",
    "Staten Island",
];

pub const PERMITS_FILE: &str = "permits.csv";
pub const BOUNDARIES_FILE: &str = "zipcodes.geojson";
pub const INCOME_FILE: &str = "income.csv";
pub const REPORT_DIR: &str = "report";

fn main() {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder().with_env_filter(env).init();

    if let Err(e) = run() {
        error!(error = %e, "report failed");
        process::exit(1);
    }
}

/// Inputs are read from the directory given as the first argument, or the
/// working directory when there is none.
fn run() -> Result<(), Box<dyn Error>> {
    let dir = match env::args().nth(1) {
        Some(dir) => PathBuf::from(dir),
        None => env::current_dir()?,
    };
    let config = ReportConfig::in_dir(dir);
    info!(permits = %config.permits_path.display(), "building permit report");
    let summary = run_report(&config)?;
    info!(
        permits = summary.permits,
        rejected = summary.rejected,
        zip_excluded = summary.zip_excluded,
        "done"
    );
    Ok(())
}
