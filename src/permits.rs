use std::{fmt, io::Read, path::Path, str::FromStr};

use chrono::NaiveDateTime;
use csv::ReaderBuilder;
use tracing::{debug, info, warn};

use crate::{
    error::{ReportError, Result},
    temporal::{parse_timestamp, CalendarFields},
    BOROUGHS,
};

/// A row of the permit export as it sits on disk.
#[derive(serde::Serialize, serde::Deserialize, Debug, Clone)]
pub struct PermitRow {
    #[serde(rename = "EventID", default)]
    pub event_id: String,
    #[serde(rename = "EventType", default)]
    pub event_type: String,
    #[serde(rename = "StartDateTime")]
    pub start: String,
    #[serde(rename = "EndDateTime")]
    pub end: String,
    #[serde(rename = "EnteredOn")]
    pub entered: String,
    #[serde(rename = "Borough")]
    pub borough: String,
    #[serde(rename = "Category", default)]
    pub category: String,
    #[serde(rename = "SubCategoryName", default)]
    pub sub_category: String,
    #[serde(rename = "ZipCode(s)")]
    pub zip_codes: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Borough {
    Manhattan,
    Brooklyn,
    Queens,
    Bronx,
    StatenIsland,
}

impl Borough {
    pub const ALL: [Borough; 5] = [
        Borough::Manhattan,
        Borough::Brooklyn,
        Borough::Queens,
        Borough::Bronx,
        Borough::StatenIsland,
    ];

    pub fn name(&self) -> &'static str {
        BOROUGHS[*self as usize]
    }
}

impl fmt::Display for Borough {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Borough {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        Borough::ALL
            .into_iter()
            .find(|b| b.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ReportError::UnknownBorough(s.to_owned()))
    }
}

/// A permit checked at ingestion: typed borough, parsed timestamps.
#[derive(Debug, Clone, PartialEq)]
pub struct Permit {
    pub event_id: String,
    pub event_type: String,
    pub category: String,
    pub sub_category: String,
    pub borough: Borough,
    /// Raw field, possibly several comma-separated codes.
    pub zip_codes: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub entered: NaiveDateTime,
}

impl Permit {
    pub fn from_row(row: PermitRow) -> Result<Self> {
        let start = parse_timestamp("StartDateTime", &row.start)?;
        let end = parse_timestamp("EndDateTime", &row.end)?;
        let entered = parse_timestamp("EnteredOn", &row.entered)?;
        let borough = row.borough.parse()?;

        Ok(Self {
            event_id: row.event_id,
            event_type: row.event_type,
            category: row.category,
            sub_category: row.sub_category,
            borough,
            zip_codes: row.zip_codes,
            start,
            end,
            entered,
        })
    }

    pub fn start_fields(&self) -> CalendarFields {
        CalendarFields::derive(&self.start)
    }

    pub fn end_fields(&self) -> CalendarFields {
        CalendarFields::derive(&self.end)
    }

    pub fn entry_fields(&self) -> CalendarFields {
        CalendarFields::derive(&self.entered)
    }

    pub fn ends_before_start(&self) -> bool {
        self.end < self.start
    }
}

/// A permit row that failed the ingestion checks.
#[derive(Debug)]
pub struct Rejected {
    /// 1 based data line, header excluded.
    pub line: usize,
    pub error: ReportError,
}

#[derive(Debug, Default)]
pub struct PermitLoad {
    pub permits: Vec<Permit>,
    pub rejected: Vec<Rejected>,
}

pub fn load_permits<P: AsRef<Path>>(path: P) -> Result<PermitLoad> {
    let rdr = ReaderBuilder::new().has_headers(true).from_path(&path)?;
    let load = read_permits(rdr)?;
    info!(
        path = %path.as_ref().display(),
        permits = load.permits.len(),
        rejected = load.rejected.len(),
        "loaded permits"
    );
    Ok(load)
}

pub fn read_permits<R: Read>(mut rdr: csv::Reader<R>) -> Result<PermitLoad> {
    let mut load = PermitLoad::default();

    for (i, result) in rdr.deserialize::<PermitRow>().enumerate() {
        let line = i + 1;
        let outcome = result.map_err(ReportError::from).and_then(Permit::from_row);
        match outcome {
            Ok(permit) => {
                if permit.ends_before_start() {
                    debug!(line, event = %permit.event_id, "permit ends before it starts");
                }
                load.permits.push(permit);
            }
            Err(error) => {
                warn!(line, %error, "rejecting permit");
                load.rejected.push(Rejected { line, error });
            }
        }
    }

    Ok(load)
}
