use chrono::{Datelike, Month, NaiveDate, NaiveDateTime, Timelike, Weekday};

use crate::error::ParseError;

/// 24 hour layout, e.g. `01/02/2018 14:00:00`.
const LAYOUT_24H: &str = "%m/%d/%Y %H:%M:%S";
/// The open-data export writes `01/02/2018 02:00:00 PM`.
const LAYOUT_12H: &str = "%m/%d/%Y %I:%M:%S %p";

pub const MONTHS: [Month; 12] = [
    Month::January,
    Month::February,
    Month::March,
    Month::April,
    Month::May,
    Month::June,
    Month::July,
    Month::August,
    Month::September,
    Month::October,
    Month::November,
    Month::December,
];

/// Which day opens the week when weekday counts are laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WeekStart {
    #[default]
    Sunday,
    Monday,
}

impl WeekStart {
    pub fn days(&self) -> [Weekday; 7] {
        let first = match self {
            WeekStart::Sunday => Weekday::Sun,
            WeekStart::Monday => Weekday::Mon,
        };
        let mut days = [first; 7];
        for i in 1..7 {
            days[i] = days[i - 1].succ();
        }
        days
    }
}

pub fn parse_timestamp(field: &'static str, text: &str) -> Result<NaiveDateTime, ParseError> {
    let trimmed = text.trim();
    NaiveDateTime::parse_from_str(trimmed, LAYOUT_24H)
        .or_else(|_| NaiveDateTime::parse_from_str(trimmed, LAYOUT_12H))
        .map_err(|_| ParseError {
            field,
            text: text.to_owned(),
        })
}

/// Calendar fields derived from a single timestamp. Wall clock, no zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarFields {
    pub date: NaiveDate,
    pub weekday: Weekday,
    pub month: Month,
    pub iso_year: i32,
    pub hour: u32,
}

impl CalendarFields {
    pub fn derive(dt: &NaiveDateTime) -> Self {
        let date = dt.date();
        Self {
            date,
            weekday: date.weekday(),
            month: MONTHS[date.month0() as usize],
            iso_year: date.iso_week().year(),
            hour: dt.hour(),
        }
    }
}

pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}
