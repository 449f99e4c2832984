use std::{fmt, sync::OnceLock};

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{error::MalformedKey, permits::Permit};

const DELIMITER: char = ',';

fn zip_pattern() -> &'static Regex {
    static ZIP: OnceLock<Regex> = OnceLock::new();
    ZIP.get_or_init(|| Regex::new(r"^\d{5}$").unwrap())
}

/// Numeric ZIP code tabulation area id, the key every join runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ZipCode(pub u32);

impl ZipCode {
    pub fn parse(token: &str) -> Result<Self, MalformedKey> {
        let token = token.trim();
        if token.is_empty() {
            return Err(MalformedKey::Empty);
        }
        if !zip_pattern().is_match(token) {
            return Err(MalformedKey::NotNumeric(token.to_owned()));
        }
        token
            .parse::<u32>()
            .map(ZipCode)
            .map_err(|_| MalformedKey::NotNumeric(token.to_owned()))
    }

    /// Numeric ids from JSON or spreadsheet exports, where `10001.0` is
    /// as good as `10001`. Fractions, negatives and anything past five
    /// digits are rejected.
    pub fn from_number(n: f64) -> Result<Self, MalformedKey> {
        if n.is_finite() && n.fract() == 0.0 && (0.0..=99_999.0).contains(&n) {
            Ok(ZipCode(n as u32))
        } else {
            Err(MalformedKey::NotNumeric(n.to_string()))
        }
    }
}

impl fmt::Display for ZipCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:05}", self.0)
    }
}

impl Serialize for ZipCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

// Accepts `"10001"`, `10001` and `10001.0`, some exports store the id as a number.
impl<'de> Deserialize<'de> for ZipCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Num(f64),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Num(n) => ZipCode::from_number(n),
            Raw::Text(s) => ZipCode::parse(&s),
        }
        .map_err(serde::de::Error::custom)
    }
}

/// One permit per ZIP code it names. `permit.zip_codes` holds just `zip`.
#[derive(Debug, Clone, PartialEq)]
pub struct ZipPermit {
    pub zip: ZipCode,
    pub permit: Permit,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExcludedZip {
    pub event_id: String,
    pub reason: MalformedKey,
}

#[derive(Debug, Default)]
pub struct Expansion {
    pub rows: Vec<ZipPermit>,
    pub excluded: Vec<ExcludedZip>,
}

/// Splits a raw ZIP field. Every token comes back, good or bad, in order.
pub fn split_zip_field(field: &str) -> Vec<Result<ZipCode, MalformedKey>> {
    if field.trim().is_empty() {
        return vec![Err(MalformedKey::Empty)];
    }

    field
        .split(DELIMITER)
        .map(|token| {
            if token.trim().is_empty() {
                Err(MalformedKey::EmptyToken(field.to_owned()))
            } else {
                ZipCode::parse(token)
            }
        })
        .collect()
}

pub fn expand(permits: &[Permit]) -> Expansion {
    let mut expansion = Expansion::default();

    for permit in permits {
        for token in split_zip_field(&permit.zip_codes) {
            match token {
                Ok(zip) => {
                    let mut row = permit.clone();
                    row.zip_codes = zip.to_string();
                    expansion.rows.push(ZipPermit { zip, permit: row });
                }
                Err(reason) => expansion.excluded.push(ExcludedZip {
                    event_id: permit.event_id.clone(),
                    reason,
                }),
            }
        }
    }

    expansion
}
