use std::path::PathBuf;

use crate::{boundaries::Crs, temporal::WeekStart, BOUNDARIES_FILE, INCOME_FILE, PERMITS_FILE, REPORT_DIR};

/// Where the inputs live and how the report lays things out.
#[derive(Debug, Clone)]
pub struct ReportConfig {
    pub permits_path: PathBuf,
    pub boundaries_path: PathBuf,
    pub income_path: PathBuf,
    pub output_dir: PathBuf,
    /// Feature property holding the ZIP id in the boundary file.
    pub zip_property: String,
    /// Boundaries are reprojected into this before joining.
    pub target_crs: Crs,
    pub week_start: WeekStart,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            permits_path: PathBuf::from(PERMITS_FILE),
            boundaries_path: PathBuf::from(BOUNDARIES_FILE),
            income_path: PathBuf::from(INCOME_FILE),
            output_dir: PathBuf::from(REPORT_DIR),
            zip_property: "postalCode".to_owned(),
            target_crs: Crs::wgs84(),
            week_start: WeekStart::Sunday,
        }
    }
}

impl ReportConfig {
    /// Default file names, resolved under `dir`.
    pub fn in_dir<P: Into<PathBuf>>(dir: P) -> Self {
        let dir = dir.into();
        Self {
            permits_path: dir.join(PERMITS_FILE),
            boundaries_path: dir.join(BOUNDARIES_FILE),
            income_path: dir.join(INCOME_FILE),
            output_dir: dir.join(REPORT_DIR),
            ..Self::default()
        }
    }
}
