use std::collections::BTreeMap;

use chrono::{Month, Weekday};
use itertools::Itertools;

use crate::{
    permits::{Borough, Permit},
    temporal::{weekday_name, WeekStart, MONTHS},
    zipcodes::{ZipCode, ZipPermit},
};

/// Distinct key to number of records carrying it. Keys that never occur are
/// absent, see [`Counts::with_axis`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Counts<K: Ord> {
    counts: BTreeMap<K, u64>,
}

impl<K: Ord> Default for Counts<K> {
    fn default() -> Self {
        Self { counts: BTreeMap::new() }
    }
}

pub fn count_by<T, K, F>(items: &[T], key: F) -> Counts<K>
where
    K: Ord + Clone + std::hash::Hash,
    F: Fn(&T) -> K,
{
    Counts {
        counts: items
            .iter()
            .map(key)
            .counts()
            .into_iter()
            .map(|(k, n)| (k, n as u64))
            .collect(),
    }
}

impl<K: Ord + Clone> Counts<K> {
    pub fn get(&self, key: &K) -> Option<u64> {
        self.counts.get(key).copied()
    }

    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, u64)> + '_ {
        self.counts.iter().map(|(k, n)| (k, *n))
    }

    /// Every key of `axis` in the order given, missing ones as zero.
    /// Keys outside `axis` are dropped.
    pub fn with_axis<I: IntoIterator<Item = K>>(&self, axis: I) -> Vec<(K, u64)> {
        axis.into_iter()
            .map(|k| {
                let n = self.get(&k).unwrap_or(0);
                (k, n)
            })
            .collect()
    }

    /// One key per counted record.
    pub fn expand_back(&self) -> Vec<K> {
        self.counts
            .iter()
            .flat_map(|(k, n)| std::iter::repeat(k.clone()).take(*n as usize))
            .collect()
    }
}

/// Weekday counts laid out for display, first day per `start`.
pub fn weekday_axis(counts: &Counts<WeekdayKey>, start: WeekStart) -> Vec<(Weekday, u64)> {
    counts
        .with_axis(start.days().map(WeekdayKey))
        .into_iter()
        .map(|(k, n)| (k.0, n))
        .collect()
}

/// January through December, zero filled.
pub fn month_axis(counts: &Counts<MonthKey>) -> Vec<(Month, u64)> {
    counts
        .with_axis(MONTHS.map(MonthKey))
        .into_iter()
        .map(|(k, n)| (k.0, n))
        .collect()
}

// Calendar order. chrono leaves Weekday unordered since weeks start on different days.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WeekdayKey(pub Weekday);

impl Ord for WeekdayKey {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0
            .num_days_from_sunday()
            .cmp(&other.0.num_days_from_sunday())
    }
}

impl PartialOrd for WeekdayKey {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MonthKey(pub Month);

impl Ord for MonthKey {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.number_from_month().cmp(&other.0.number_from_month())
    }
}

impl PartialOrd for MonthKey {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

pub fn by_start_weekday(permits: &[Permit]) -> Counts<WeekdayKey> {
    count_by(permits, |p| WeekdayKey(p.start_fields().weekday))
}

pub fn by_end_weekday(permits: &[Permit]) -> Counts<WeekdayKey> {
    count_by(permits, |p| WeekdayKey(p.end_fields().weekday))
}

pub fn by_start_month(permits: &[Permit]) -> Counts<MonthKey> {
    count_by(permits, |p| MonthKey(p.start_fields().month))
}

pub fn by_start_year(permits: &[Permit]) -> Counts<i32> {
    count_by(permits, |p| p.start_fields().iso_year)
}

pub fn by_borough(permits: &[Permit]) -> Counts<Borough> {
    count_by(permits, |p| p.borough)
}

pub fn by_zip_code(rows: &[ZipPermit]) -> Counts<ZipCode> {
    count_by(rows, |r| r.zip)
}

pub fn by_start_hour(permits: &[Permit]) -> Counts<u32> {
    count_by(permits, |p| p.start_fields().hour)
}

pub fn by_entry_hour(permits: &[Permit]) -> Counts<u32> {
    count_by(permits, |p| p.entry_fields().hour)
}

pub fn by_category(permits: &[Permit]) -> Counts<String> {
    count_by(permits, |p| p.category.clone())
}

/// A flat `key,count` line, what the report writes for every grouping.
#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct AggregateCount {
    pub key: String,
    pub count: u64,
}

impl AggregateCount {
    pub fn rows<K, I, F>(pairs: I, label: F) -> Vec<AggregateCount>
    where
        I: IntoIterator<Item = (K, u64)>,
        F: Fn(&K) -> String,
    {
        pairs
            .into_iter()
            .map(|(k, count)| AggregateCount { key: label(&k), count })
            .collect()
    }
}

pub fn weekday_label(day: &Weekday) -> String {
    weekday_name(*day).to_owned()
}

pub fn month_label(month: &Month) -> String {
    month.name().to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{permits::tests::read, zipcodes::expand};

    fn permit_line(i: usize, start: &str, borough: &str, zips: &str) -> String {
        format!(
            "{},Shooting Permit,{},12/31/2018 23:00:00,12/01/2017 09:12:45,{},Film,Feature,\"{}\"\n",
            i, start, borough, zips
        )
    }

    fn permits(starts: &[&str]) -> Vec<Permit> {
        let body: String = starts
            .iter()
            .enumerate()
            .map(|(i, s)| permit_line(i, s, "Manhattan", "10001"))
            .collect();
        read(&body).permits
    }

    #[test]
    fn two_tuesdays_and_one_more() {
        let permits = permits(&[
            "01/02/2018 10:00:00",
            "01/02/2018 14:00:00",
            "01/09/2018 09:00:00",
        ]);
        let counts = by_start_weekday(&permits);
        assert_eq!(counts.len(), 1);
        assert_eq!(counts.get(&WeekdayKey(Weekday::Tue)), Some(3));
    }

    #[test]
    fn weekday_counts_sum_to_records() {
        let permits = permits(&[
            "01/01/2018 10:00:00",
            "01/02/2018 10:00:00",
            "01/06/2018 10:00:00",
            "01/07/2018 10:00:00",
            "03/15/2018 10:00:00",
            "07/04/2018 10:00:00",
        ]);
        assert_eq!(by_start_weekday(&permits).total(), permits.len() as u64);
    }

    #[test]
    fn absent_keys_are_not_zero_filled() {
        let permits = permits(&["01/02/2018 10:00:00", "03/02/2018 10:00:00"]);
        let counts = by_start_month(&permits);
        assert_eq!(counts.len(), 2);
        assert_eq!(counts.get(&MonthKey(Month::February)), None);

        let axis = month_axis(&counts);
        assert_eq!(axis.len(), 12);
        assert_eq!(axis[1], (Month::February, 0));
        assert_eq!(axis[2], (Month::March, 1));
    }

    #[test]
    fn month_axis_is_calendar_order() {
        let starts: Vec<String> = (1..=12)
            .rev()
            .map(|m| format!("{:02}/10/2018 10:00:00", m))
            .collect();
        let starts: Vec<&str> = starts.iter().map(|s| s.as_str()).collect();
        let counts = by_start_month(&permits(&starts));

        let names: Vec<String> = month_axis(&counts).iter().map(|(m, _)| month_label(m)).collect();
        assert_eq!(
            names,
            vec![
                "January", "February", "March", "April", "May", "June", "July", "August",
                "September", "October", "November", "December"
            ]
        );
        let keyed: Vec<Month> = counts.iter().map(|(k, _)| k.0).collect();
        assert_eq!(keyed, MONTHS.to_vec());
    }

    #[test]
    fn weekday_axis_follows_week_start() {
        let counts = by_start_weekday(&permits(&["01/07/2018 10:00:00"]));
        let sunday_first = weekday_axis(&counts, WeekStart::Sunday);
        assert_eq!(sunday_first[0], (Weekday::Sun, 1));
        let monday_first = weekday_axis(&counts, WeekStart::Monday);
        assert_eq!(monday_first[6], (Weekday::Sun, 1));
        assert_eq!(monday_first[0], (Weekday::Mon, 0));
    }

    #[test]
    fn counting_is_idempotent() {
        let body: String = [
            ("01/02/2018 10:00:00", "Manhattan", "10001,10002"),
            ("02/02/2018 10:00:00", "Brooklyn", "11201"),
            ("02/03/2019 10:00:00", "Brooklyn", "11201,10001"),
            ("05/20/2019 10:00:00", "Queens", "11101"),
        ]
        .iter()
        .enumerate()
        .map(|(i, (s, b, z))| permit_line(i, s, b, z))
        .collect();
        let permits = read(&body).permits;

        let boroughs = by_borough(&permits);
        assert_eq!(count_by(&boroughs.expand_back(), |b| *b), boroughs);

        let zips = by_zip_code(&expand(&permits).rows);
        assert_eq!(zips.get(&ZipCode(10001)), Some(2));
        assert_eq!(count_by(&zips.expand_back(), |z| *z), zips);

        let years = by_start_year(&permits);
        assert_eq!(years.get(&2018), Some(2));
        assert_eq!(count_by(&years.expand_back(), |y| *y), years);
    }

    #[test]
    fn hours_and_categories() {
        let permits = permits(&["01/02/2018 10:00:00", "01/02/2018 02:30:00 PM"]);
        let hours = by_start_hour(&permits);
        assert_eq!(hours.get(&10), Some(1));
        assert_eq!(hours.get(&14), Some(1));
        assert_eq!(by_entry_hour(&permits).get(&9), Some(2));
        assert_eq!(by_category(&permits).get(&"Film".to_owned()), Some(2));
    }

    #[test]
    fn rows_keep_axis_order() {
        let counts = by_start_weekday(&permits(&["01/02/2018 10:00:00"]));
        let rows = AggregateCount::rows(weekday_axis(&counts, WeekStart::Sunday), weekday_label);
        assert_eq!(rows.len(), 7);
        assert_eq!(rows[0].key, "Sunday");
        assert_eq!(rows[2], AggregateCount { key: "Tuesday".to_owned(), count: 1 });
    }

    #[test]
    fn counts_past_u32_are_written_whole() {
        let big = u64::from(u32::MAX) + 2;
        let rows = AggregateCount::rows(vec![(2018, big)], |y: &i32| y.to_string());

        let mut writer = csv::Writer::from_writer(vec![]);
        writer.serialize(&rows[0]).unwrap();
        let text = String::from_utf8(writer.into_inner().unwrap()).unwrap();
        assert_eq!(text, format!("key,count\n2018,{}\n", big));
    }
}
