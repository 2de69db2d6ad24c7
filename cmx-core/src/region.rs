use crate::error::FixtureError;
use csv::ReaderBuilder;
use serde::{Deserialize, Serialize};

/// Embedded bounding boxes for the named regions the results are split into.
pub static REGION_BOUNDS_CSV: &str = include_str!("../../fixtures/region_bounds.csv");

/// Axis-aligned latitude/longitude box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl BoundingBox {
    /// Box spanning both corners, in any order.
    pub fn from_corners(a: (f64, f64), b: (f64, f64)) -> Self {
        Self {
            south: a.0.min(b.0),
            west: a.1.min(b.1),
            north: a.0.max(b.0),
            east: a.1.max(b.1),
        }
    }

    /// Smallest box covering every `(latitude, longitude)`, or `None` when
    /// there are no finite coordinates.
    pub fn covering<I>(coordinates: I) -> Option<Self>
    where
        I: IntoIterator<Item = (f64, f64)>,
    {
        coordinates
            .into_iter()
            .filter(|(lat, lon)| lat.is_finite() && lon.is_finite())
            .fold(None, |acc: Option<BoundingBox>, (lat, lon)| {
                Some(match acc {
                    None => BoundingBox {
                        south: lat,
                        west: lon,
                        north: lat,
                        east: lon,
                    },
                    Some(b) => BoundingBox {
                        south: b.south.min(lat),
                        west: b.west.min(lon),
                        north: b.north.max(lat),
                        east: b.east.max(lon),
                    },
                })
            })
    }
}

/// A named region and its fixed framing box.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionBounds {
    pub region: String,
    pub name: String,
    #[serde(flatten)]
    pub bounds: BoundingBox,
}

#[derive(Deserialize)]
struct RegionRow {
    region: String,
    name: String,
    south: f64,
    west: f64,
    north: f64,
    east: f64,
}

/// Static region → bounding box table used for viewport framing and the
/// region boundary overlay.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RegionBoundsTable {
    regions: Vec<RegionBounds>,
}

impl RegionBoundsTable {
    /// The table embedded in the binary.
    pub fn builtin() -> Result<Self, FixtureError> {
        Self::parse_region_bounds_csv(REGION_BOUNDS_CSV)
    }

    /// Parse a CSV table of region bounds.
    ///
    /// Expected CSV columns: region, name, south, west, north, east
    pub fn parse_region_bounds_csv(csv_object: &str) -> Result<Self, FixtureError> {
        let mut regions: Vec<RegionBounds> = Vec::new();
        let mut rdr = ReaderBuilder::new()
            .delimiter(b',')
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(csv_object.as_bytes());
        for row in rdr.deserialize() {
            let row: RegionRow = row?;
            let entry = RegionBounds {
                region: row.region,
                name: row.name,
                bounds: BoundingBox {
                    south: row.south,
                    west: row.west,
                    north: row.north,
                    east: row.east,
                },
            };
            let b = entry.bounds;
            if b.south > b.north || b.west > b.east {
                return Err(FixtureError::InvalidBounds {
                    region: entry.region,
                    reason: "south/west corner lies beyond north/east corner".to_string(),
                });
            }
            if regions.iter().any(|r| r.region == entry.region) {
                return Err(FixtureError::DuplicateRegion(entry.region));
            }
            regions.push(entry);
        }
        Ok(Self { regions })
    }

    pub fn get(&self, region: &str) -> Option<&BoundingBox> {
        self.regions
            .iter()
            .find(|r| r.region == region)
            .map(|r| &r.bounds)
    }

    pub fn entry(&self, region: &str) -> Option<&RegionBounds> {
        self.regions.iter().find(|r| r.region == region)
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}
