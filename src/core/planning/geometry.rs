//! Burst footprints from the geolocation grid of a TOPS annotation document.
//!
//! The grid is a flat list of points laid out line by line. Every line carries
//! [`POINTS_PER_LINE`] points and consecutive lines bound one burst, so burst `b`
//! (1-based) has its corners at fixed offsets from `(b - 1) * POINTS_PER_LINE`.
use geo::{Coord, LineString, Polygon};
use quick_xml::Reader;
use quick_xml::events::Event;
use std::collections::BTreeSet;

use crate::error::{Error, Result};
use crate::types::SubSwath;

/// Grid points per azimuth line of an IW annotation.
pub const POINTS_PER_LINE: usize = 21;

const TOP_RIGHT: usize = 0;
const TOP_LEFT: usize = 20;
const BOTTOM_LEFT: usize = 41;
const BOTTOM_RIGHT: usize = 21;

/// One geolocation grid point (geographic degrees)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridPoint {
    pub line: i64,
    pub pixel: i64,
    pub latitude: f64,
    pub longitude: f64,
}

/// Parsed `geolocationGrid` of one annotation document
#[derive(Debug, Clone, Default)]
pub struct GeolocationGrid {
    pub points: Vec<GridPoint>,
}

impl GeolocationGrid {
    /// Number of bursts described by the grid: distinct line markers minus one.
    pub fn burst_count(&self) -> usize {
        let lines: BTreeSet<i64> = self.points.iter().map(|p| p.line).collect();
        lines.len().saturating_sub(1)
    }
}

/// Footprint of one burst of one sub-swath
#[derive(Debug, Clone, PartialEq)]
pub struct BurstFootprint {
    pub subswath: SubSwath,
    /// 1-based, contiguous within a sub-swath
    pub burst: u32,
    /// Closed ring: top-right, top-left, bottom-left, bottom-right, (lon, lat)
    pub polygon: Polygon<f64>,
}

impl BurstFootprint {
    /// The four corners in ring order, without the closing point.
    pub fn corners(&self) -> [Coord<f64>; 4] {
        let ring = &self.polygon.exterior().0;
        [ring[0], ring[1], ring[2], ring[3]]
    }
}

/// Parse the `geolocationGrid` section of an annotation XML document.
pub fn parse_geolocation_grid(xml: &str, source_name: &str) -> Result<GeolocationGrid> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);
    let mut buf = Vec::new();
    let mut curr = String::new();
    let mut in_grid = false;
    let mut in_point = false;
    let mut line: Option<i64> = None;
    let mut pixel: Option<i64> = None;
    let mut latitude: Option<f64> = None;
    let mut longitude: Option<f64> = None;
    let mut grid = GeolocationGrid::default();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(ref e) => {
                let tag = String::from_utf8_lossy(e.local_name().as_ref()).to_string();
                match tag.as_str() {
                    "geolocationGrid" => in_grid = true,
                    "geolocationGridPoint" if in_grid => {
                        in_point = true;
                        line = None;
                        pixel = None;
                        latitude = None;
                        longitude = None;
                    }
                    _ => {}
                }
                curr = tag;
            }
            Event::End(ref e) => {
                let tag = String::from_utf8_lossy(e.local_name().as_ref()).to_string();
                match tag.as_str() {
                    "geolocationGrid" => in_grid = false,
                    "geolocationGridPoint" if in_point => {
                        in_point = false;
                        match (line, latitude, longitude) {
                            (Some(line), Some(latitude), Some(longitude)) => {
                                grid.points.push(GridPoint {
                                    line,
                                    pixel: pixel.unwrap_or(0),
                                    latitude,
                                    longitude,
                                })
                            }
                            _ => {
                                return Err(Error::malformed(
                                    source_name,
                                    format!(
                                        "grid point {} lacks line/latitude/longitude",
                                        grid.points.len()
                                    ),
                                ));
                            }
                        }
                    }
                    _ => {}
                }
                curr.clear();
            }
            Event::Text(e) if in_point => {
                let txt = e.unescape()?;
                let txt = txt.trim();
                match curr.as_str() {
                    "line" => line = Some(parse_number(txt, "line", source_name)?),
                    "pixel" => pixel = Some(parse_number(txt, "pixel", source_name)?),
                    "latitude" => latitude = Some(parse_number(txt, "latitude", source_name)?),
                    "longitude" => longitude = Some(parse_number(txt, "longitude", source_name)?),
                    _ => {}
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(grid)
}

fn parse_number<T: std::str::FromStr>(txt: &str, field: &str, source_name: &str) -> Result<T> {
    txt.parse::<T>()
        .map_err(|_| Error::malformed(source_name, format!("invalid {field} value `{txt}`")))
}

/// Build the burst footprints of one sub-swath from its geolocation grid.
///
/// Fails with `MalformedMetadata` unless the grid holds exactly
/// [`POINTS_PER_LINE`] points per line marker, laid out line by line.
pub fn burst_footprints(
    grid: &GeolocationGrid,
    subswath: SubSwath,
    source_name: &str,
) -> Result<Vec<BurstFootprint>> {
    let total = grid.burst_count();
    if total == 0 {
        return Err(Error::malformed(
            source_name,
            "geolocation grid has fewer than two lines",
        ));
    }
    let required = (total + 1) * POINTS_PER_LINE;
    if grid.points.len() != required {
        return Err(Error::malformed(
            source_name,
            format!(
                "{} bursts need {} grid points, found {}",
                total,
                required,
                grid.points.len()
            ),
        ));
    }
    for (row, points) in grid.points.chunks(POINTS_PER_LINE).enumerate() {
        let line = points[0].line;
        if let Some(stray) = points.iter().find(|p| p.line != line) {
            return Err(Error::malformed(
                source_name,
                format!(
                    "grid row {} mixes lines {} and {}; expected {} points per line",
                    row, line, stray.line, POINTS_PER_LINE
                ),
            ));
        }
    }

    let corner = |idx: usize| {
        let p = &grid.points[idx];
        Coord {
            x: p.longitude,
            y: p.latitude,
        }
    };

    let footprints = (0..total)
        .map(|i| {
            let base = i * POINTS_PER_LINE;
            let ring = vec![
                corner(base + TOP_RIGHT),
                corner(base + TOP_LEFT),
                corner(base + BOTTOM_LEFT),
                corner(base + BOTTOM_RIGHT),
            ];
            BurstFootprint {
                subswath,
                burst: (i + 1) as u32,
                polygon: Polygon::new(LineString::from(ring), vec![]),
            }
        })
        .collect();

    Ok(footprints)
}

/// Parse an annotation document and return its burst footprints.
pub fn footprints_from_annotation(
    xml: &str,
    subswath: SubSwath,
    source_name: &str,
) -> Result<Vec<BurstFootprint>> {
    let grid = parse_geolocation_grid(xml, source_name)?;
    burst_footprints(&grid, subswath, source_name)
}
