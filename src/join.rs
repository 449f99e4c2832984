use std::collections::HashMap;

use geo::MultiPolygon;
use geojson::{Feature, FeatureCollection, GeoJson, Geometry};
use tracing::warn;

use crate::{
    aggregate::Counts,
    boundaries::{BoundarySet, Crs},
    error::{ReportError, Result},
    zipcodes::ZipCode,
};

/// Anything keyed by ZIP code that can sit on the right of a join.
pub trait ZipValues<V> {
    fn value(&self, zip: &ZipCode) -> Option<V>;
}

impl ZipValues<u64> for Counts<ZipCode> {
    fn value(&self, zip: &ZipCode) -> Option<u64> {
        self.get(zip)
    }
}

impl<V: Clone> ZipValues<V> for HashMap<ZipCode, V> {
    fn value(&self, zip: &ZipCode) -> Option<V> {
        self.get(zip).cloned()
    }
}

/// A boundary with whatever matched it. `None` is "no data", which a
/// zero count is not.
#[derive(Debug, Clone, PartialEq)]
pub struct Joined<V> {
    pub zip: ZipCode,
    pub geometry: MultiPolygon<f64>,
    pub value: Option<V>,
}

fn check_crs(boundaries: &BoundarySet, expected: &Crs) -> Result<()> {
    if &boundaries.crs != expected {
        return Err(ReportError::JoinMismatch {
            expected: expected.clone(),
            found: boundaries.crs.clone(),
        });
    }
    Ok(())
}

/// Keeps every boundary, in order, whether or not `values` knows its ZIP.
pub fn left_join<V, T: ZipValues<V>>(
    boundaries: &BoundarySet,
    expected: &Crs,
    values: &T,
) -> Result<Vec<Joined<V>>> {
    check_crs(boundaries, expected)?;

    Ok(boundaries
        .boundaries
        .iter()
        .map(|b| Joined {
            zip: b.zip,
            geometry: b.geometry.clone(),
            value: values.value(&b.zip),
        })
        .collect())
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChoroplethRow {
    pub zip: ZipCode,
    pub geometry: MultiPolygon<f64>,
    pub permits: Option<u64>,
    pub avg_income: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Choropleth {
    pub rows: Vec<ChoroplethRow>,
    pub without_permits: usize,
    pub without_income: usize,
}

/// Permit counts and income side by side on each ZIP boundary.
pub fn choropleth(
    boundaries: &BoundarySet,
    expected: &Crs,
    counts: &Counts<ZipCode>,
    income: &HashMap<ZipCode, f64>,
) -> Result<Choropleth> {
    let permits = left_join(boundaries, expected, counts)?;
    let incomes = left_join(boundaries, expected, income)?;

    let rows: Vec<ChoroplethRow> = permits
        .into_iter()
        .zip(incomes)
        .map(|(p, i)| ChoroplethRow {
            zip: p.zip,
            geometry: p.geometry,
            permits: p.value,
            avg_income: i.value,
        })
        .collect();

    let without_permits = rows.iter().filter(|r| r.permits.is_none()).count();
    let without_income = rows.iter().filter(|r| r.avg_income.is_none()).count();
    if without_permits > 0 || without_income > 0 {
        warn!(without_permits, without_income, boundaries = rows.len(), "boundaries with no data");
    }

    Ok(Choropleth {
        rows,
        without_permits,
        without_income,
    })
}

impl Choropleth {
    pub fn to_geojson(&self) -> GeoJson {
        let features: Vec<Feature> = self
            .rows
            .iter()
            .map(|row| {
                let mut feature = Feature {
                    bbox: None,
                    geometry: Some(Geometry::new(geojson::Value::from(&row.geometry))),
                    id: None,
                    properties: None,
                    foreign_members: None,
                };
                feature.set_property("zip_code", row.zip.to_string());
                feature.set_property("permits", row.permits);
                feature.set_property("avg_income", row.avg_income);
                feature
            })
            .collect();

        GeoJson::from(features.into_iter().collect::<FeatureCollection>())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        aggregate::count_by,
        boundaries::{read_boundaries, tests::TWO_ZIPS},
    };

    fn one_zip() -> BoundarySet {
        let mut set = read_boundaries(TWO_ZIPS, "postalCode").unwrap();
        set.boundaries.truncate(1);
        set
    }

    #[test]
    fn matched_boundary_gets_count() {
        let counts = count_by(&[ZipCode(10001); 5], |z| *z);
        let joined: Vec<Joined<u64>> = left_join(&one_zip(), &Crs::wgs84(), &counts).unwrap();
        assert_eq!(joined.len(), 1);
        assert_eq!(joined[0].value, Some(5));
    }

    #[test]
    fn unmatched_boundary_is_no_data_not_zero() {
        let empty = Counts::<ZipCode>::default();
        let joined: Vec<Joined<u64>> = left_join(&one_zip(), &Crs::wgs84(), &empty).unwrap();
        assert_eq!(joined.len(), 1);
        assert_eq!(joined[0].value, None);
    }

    #[test]
    fn keeps_boundary_cardinality() {
        let set = read_boundaries(TWO_ZIPS, "postalCode").unwrap();
        let counts = count_by(
            &[ZipCode(10001), ZipCode(10002), ZipCode(10003), ZipCode(10001)],
            |z| *z,
        );
        let joined: Vec<Joined<u64>> = left_join(&set, &Crs::wgs84(), &counts).unwrap();
        assert_eq!(joined.len(), set.len());
        assert_eq!(joined[0].value, Some(2));
        assert_eq!(joined[1].value, None);
    }

    #[test]
    fn crs_mismatch_fails_fast() {
        let empty = Counts::<ZipCode>::default();
        let err = left_join::<u64, _>(&one_zip(), &Crs::parse("EPSG:2263"), &empty).unwrap_err();
        assert!(matches!(err, ReportError::JoinMismatch { .. }));
    }

    #[test]
    fn choropleth_carries_both_measures() {
        let set = read_boundaries(TWO_ZIPS, "postalCode").unwrap();
        let counts = count_by(&[ZipCode(11201)], |z| *z);
        let income = HashMap::from([(ZipCode(10001), 91_000.0)]);

        let map = choropleth(&set, &Crs::wgs84(), &counts, &income).unwrap();
        assert_eq!(map.rows.len(), 2);
        assert_eq!(map.rows[0].permits, None);
        assert_eq!(map.rows[0].avg_income, Some(91_000.0));
        assert_eq!(map.rows[1].permits, Some(1));
        assert_eq!(map.without_permits, 1);
        assert_eq!(map.without_income, 1);

        let GeoJson::FeatureCollection(fc) = map.to_geojson() else {
            panic!("expected a feature collection");
        };
        assert_eq!(fc.features.len(), 2);
        assert_eq!(fc.features[0].property("permits"), Some(&serde_json::Value::Null));
        assert_eq!(
            fc.features[1].property("zip_code"),
            Some(&serde_json::Value::from("11201"))
        );
    }
}
