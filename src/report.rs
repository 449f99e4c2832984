use std::{fs, path::Path};

use csv::Writer;
use itertools::Itertools;
use tracing::{info, info_span, warn};

use crate::{
    aggregate::{self, month_axis, month_label, weekday_axis, weekday_label, AggregateCount},
    boundaries::load_boundaries,
    config::ReportConfig,
    error::Result,
    income::load_income,
    join::choropleth,
    permits::{load_permits, Borough},
    zipcodes::expand,
};

pub const CHOROPLETH_FILE: &str = "choropleth.geojson";

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReportSummary {
    pub permits: usize,
    pub rejected: usize,
    pub inverted_windows: usize,
    pub zip_rows: usize,
    pub zip_excluded: usize,
    pub boundaries: usize,
    pub boundaries_without_permits: usize,
    pub boundaries_without_income: usize,
}

fn write_counts(dir: &Path, name: &str, rows: &[AggregateCount]) -> Result<()> {
    let mut writer = Writer::from_path(dir.join(name))?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn run_report(config: &ReportConfig) -> Result<ReportSummary> {
    let span = info_span!("report", out = %config.output_dir.display());
    let _enter = span.enter();

    // Every input is read and joined before anything lands in the output dir.
    let load = load_permits(&config.permits_path)?;
    let boundaries = load_boundaries(&config.boundaries_path, &config.zip_property)?
        .to_crs(&config.target_crs)?;
    if boundaries.is_empty() {
        warn!(path = %config.boundaries_path.display(), "boundary file has no features");
    }
    let income = load_income(&config.income_path)?;

    let permits = load.permits;
    let inverted_windows = permits.iter().filter(|p| p.ends_before_start()).count();
    if inverted_windows > 0 {
        warn!(inverted_windows, "permits ending before they start are counted as given");
    }

    let expansion = expand(&permits);
    if !expansion.excluded.is_empty() {
        let reasons = expansion.excluded.iter().map(|e| e.reason.to_string()).counts();
        warn!(excluded = expansion.excluded.len(), ?reasons, "zip codes left out of the zip counts");
    }

    let zip_counts = aggregate::by_zip_code(&expansion.rows);
    if zip_counts.is_empty() {
        warn!("no permit carries a usable zip code");
    }
    info!(zip_codes = zip_counts.len(), zip_rows = zip_counts.total(), "counted zip codes");
    let map = choropleth(&boundaries, &config.target_crs, &zip_counts, &income)?;

    fs::create_dir_all(&config.output_dir)?;
    let out = config.output_dir.as_path();

    let start_weekdays = aggregate::by_start_weekday(&permits);
    write_counts(
        out,
        "weekday_start.csv",
        &AggregateCount::rows(weekday_axis(&start_weekdays, config.week_start), weekday_label),
    )?;
    let end_weekdays = aggregate::by_end_weekday(&permits);
    write_counts(
        out,
        "weekday_end.csv",
        &AggregateCount::rows(weekday_axis(&end_weekdays, config.week_start), weekday_label),
    )?;
    write_counts(
        out,
        "month.csv",
        &AggregateCount::rows(month_axis(&aggregate::by_start_month(&permits)), month_label),
    )?;
    write_counts(
        out,
        "year.csv",
        &AggregateCount::rows(aggregate::by_start_year(&permits).iter(), |y| y.to_string()),
    )?;
    write_counts(
        out,
        "borough.csv",
        &AggregateCount::rows(
            aggregate::by_borough(&permits).with_axis(Borough::ALL),
            |b| b.to_string(),
        ),
    )?;
    write_counts(
        out,
        "hour_start.csv",
        &AggregateCount::rows(aggregate::by_start_hour(&permits).with_axis(0..24), |h| h.to_string()),
    )?;
    write_counts(
        out,
        "hour_entry.csv",
        &AggregateCount::rows(aggregate::by_entry_hour(&permits).with_axis(0..24), |h| h.to_string()),
    )?;
    // Most frequent first, the way the category chart reads.
    let categories = aggregate::by_category(&permits);
    let categories = categories.iter().sorted_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));
    write_counts(
        out,
        "category.csv",
        &AggregateCount::rows(categories, |c| c.to_string()),
    )?;

    write_counts(
        out,
        "zipcode.csv",
        &AggregateCount::rows(zip_counts.iter(), |z| z.to_string()),
    )?;
    fs::write(out.join(CHOROPLETH_FILE), map.to_geojson().to_string())?;

    let summary = ReportSummary {
        permits: permits.len(),
        rejected: load.rejected.len(),
        inverted_windows,
        zip_rows: expansion.rows.len(),
        zip_excluded: expansion.excluded.len(),
        boundaries: boundaries.len(),
        boundaries_without_permits: map.without_permits,
        boundaries_without_income: map.without_income,
    };
    info!(?summary, "report written");
    Ok(summary)
}
