use std::{
    collections::{hash_map::Entry, HashMap},
    io::Read,
    path::Path,
};

use csv::ReaderBuilder;
use tracing::{info, warn};

use crate::{
    error::{ReportError, Result},
    zipcodes::ZipCode,
};

#[derive(serde::Serialize, serde::Deserialize)]
struct IncomeRow {
    #[serde(rename = "zip_code", alias = "Zip", alias = "ZipCode")]
    zip: ZipCode,
    #[serde(rename = "avg_income", alias = "Avg. Income/H/hold")]
    avg_income: String,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IncomeRecord {
    pub zip: ZipCode,
    pub avg_income: f64,
}

/// `$52,345.10`, `52345.1` and `52,345` all read as the same amount.
pub fn parse_currency(text: &str) -> Result<f64> {
    let cleaned: String = text
        .trim()
        .chars()
        .filter(|c| !matches!(c, '$' | ',' | ' '))
        .collect();
    cleaned
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ReportError::Income(text.to_owned()))
}

pub fn read_income<R: Read>(mut rdr: csv::Reader<R>) -> Result<HashMap<ZipCode, f64>> {
    let mut map = HashMap::new();
    for result in rdr.deserialize::<IncomeRow>() {
        let row = result?;
        let record = IncomeRecord {
            zip: row.zip,
            avg_income: parse_currency(&row.avg_income)?,
        };
        match map.entry(record.zip) {
            Entry::Vacant(slot) => {
                slot.insert(record.avg_income);
            }
            // One row per zip code; later repeats are reported and ignored.
            Entry::Occupied(kept) => {
                warn!(
                    zip = %record.zip,
                    kept = *kept.get(),
                    ignored = record.avg_income,
                    "duplicate income row"
                );
            }
        }
    }
    Ok(map)
}

pub fn load_income<P: AsRef<Path>>(path: P) -> Result<HashMap<ZipCode, f64>> {
    let rdr = ReaderBuilder::new().has_headers(true).from_path(&path)?;
    let map = read_income(rdr)?;
    info!(path = %path.as_ref().display(), zip_codes = map.len(), "loaded income");
    Ok(map)
}
