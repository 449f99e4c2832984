use std::{fmt, path::Path};

use geo::{Coord, MapCoords, MultiPolygon, Polygon};
use geojson::{FeatureCollection, GeoJson, JsonValue, Value};
use proj::Proj;
use tracing::info;

use crate::{
    error::{MalformedKey, ReportError, Result},
    zipcodes::ZipCode,
};

/// Coordinate reference system, stored as an authority code such as
/// `EPSG:4326`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Crs(String);

impl Crs {
    pub fn wgs84() -> Self {
        Crs("EPSG:4326".to_owned())
    }

    /// Understands `EPSG:2263`, `urn:ogc:def:crs:EPSG::2263` and the
    /// OGC CRS84 urn, which is WGS84 with lon/lat order.
    pub fn parse(name: &str) -> Self {
        let name = name.trim();
        if name.ends_with("CRS84") {
            return Crs::wgs84();
        }
        if let Some(idx) = name.find("EPSG") {
            let code = name[idx + 4..].trim_start_matches(':');
            return Crs(format!("EPSG:{}", code));
        }
        Crs(name.to_owned())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ZipBoundary {
    pub zip: ZipCode,
    pub geometry: MultiPolygon<f64>,
}

/// ZIP areas sharing one reference system.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundarySet {
    pub crs: Crs,
    pub boundaries: Vec<ZipBoundary>,
}

impl BoundarySet {
    pub fn len(&self) -> usize {
        self.boundaries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boundaries.is_empty()
    }

    /// Reprojects into `target`. A set already in `target` comes back as is.
    pub fn to_crs(&self, target: &Crs) -> Result<BoundarySet> {
        if &self.crs == target {
            return Ok(self.clone());
        }

        let proj = Proj::new_known_crs(self.crs.as_str(), target.as_str(), None)?;
        let boundaries = self
            .boundaries
            .iter()
            .map(|b| {
                let geometry = b.geometry.try_map_coords(|c: Coord<f64>| {
                    proj.convert((c.x, c.y)).map(|(x, y)| Coord { x, y })
                })?;
                Ok::<_, ReportError>(ZipBoundary { zip: b.zip, geometry })
            })
            .collect::<Result<Vec<_>>>()?;

        info!(from = %self.crs, to = %target, boundaries = boundaries.len(), "reprojected boundaries");
        Ok(BoundarySet {
            crs: target.clone(),
            boundaries,
        })
    }
}

/// Legacy GeoJSON `crs` member; RFC 7946 files without one are WGS84.
fn collection_crs(fc: &FeatureCollection) -> Crs {
    fc.foreign_members
        .as_ref()
        .and_then(|m| m.get("crs"))
        .and_then(|crs| crs.get("properties"))
        .and_then(|p| p.get("name"))
        .and_then(JsonValue::as_str)
        .map(Crs::parse)
        .unwrap_or_else(Crs::wgs84)
}

fn zip_property(value: Option<&JsonValue>) -> Option<std::result::Result<ZipCode, MalformedKey>> {
    match value? {
        JsonValue::String(s) => Some(ZipCode::parse(s)),
        JsonValue::Number(n) => n.as_f64().map(ZipCode::from_number),
        _ => None,
    }
}

fn geometry_kind(value: &Value) -> &'static str {
    match value {
        Value::Point(_) => "Point",
        Value::MultiPoint(_) => "MultiPoint",
        Value::LineString(_) => "LineString",
        Value::MultiLineString(_) => "MultiLineString",
        Value::Polygon(_) => "Polygon",
        Value::MultiPolygon(_) => "MultiPolygon",
        Value::GeometryCollection(_) => "GeometryCollection",
    }
}

pub fn read_boundaries(text: &str, zip_property_name: &str) -> Result<BoundarySet> {
    let fc = match text.parse::<GeoJson>()? {
        GeoJson::FeatureCollection(fc) => fc,
        _ => {
            return Err(ReportError::Boundary {
                index: 0,
                reason: "expected a FeatureCollection".to_owned(),
            })
        }
    };
    let crs = collection_crs(&fc);

    let mut boundaries = Vec::with_capacity(fc.features.len());
    for (index, feature) in fc.features.into_iter().enumerate() {
        let zip = zip_property(feature.property(zip_property_name)).ok_or_else(|| {
            ReportError::Boundary {
                index,
                reason: format!("missing {} property", zip_property_name),
            }
        })??;

        let value = feature.geometry.map(|g| g.value).ok_or_else(|| ReportError::Boundary {
            index,
            reason: "no geometry".to_owned(),
        })?;
        let geometry = match value {
            Value::Polygon(_) => MultiPolygon::new(vec![Polygon::try_from(value)?]),
            Value::MultiPolygon(_) => MultiPolygon::try_from(value)?,
            other => {
                return Err(ReportError::Boundary {
                    index,
                    reason: format!("unsupported geometry {}", geometry_kind(&other)),
                })
            }
        };

        boundaries.push(ZipBoundary { zip, geometry });
    }

    Ok(BoundarySet { crs, boundaries })
}

pub fn load_boundaries<P: AsRef<Path>>(path: P, zip_property_name: &str) -> Result<BoundarySet> {
    let set = read_boundaries(&std::fs::read_to_string(&path)?, zip_property_name)?;
    info!(path = %path.as_ref().display(), crs = %set.crs, boundaries = set.len(), "loaded boundaries");
    Ok(set)
}
