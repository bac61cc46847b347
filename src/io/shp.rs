//! Shapefile reading and conversion into `geo` geometries.

use std::path::Path;

use anyhow::{Context, Result, bail};
use geo::{Coord, LineString, MultiPolygon, Polygon};
use shapefile::{self as shp, Shape, dbase::{FieldValue, Record}};

use crate::{
    grid::{CountyLayer, LandFractionLayer},
    types::GeoId,
};

/// Reads all shapes + attribute records from a given `.shp` file path.
pub(crate) fn read_shapefile(path: &Path) -> Result<Vec<(Shape, Record)>> {
    let mut reader = shp::Reader::from_path(path)
        .with_context(|| format!("[io::shp] Failed to open shapefile: {}", path.display()))?;

    let mut items = Vec::with_capacity(reader.shape_count()?);
    for result in reader.iter_shapes_and_records() {
        let (shape, record) = result.context("[io::shp] Error reading shape+record")?;
        items.push((shape, record));
    }
    Ok(items)
}

/// Reads county polygons keyed by their `id_field` attribute (normally `GEOID`).
pub fn read_county_layer(path: &Path, id_field: &str) -> Result<CountyLayer> {
    let items = read_shapefile(path)?;
    let mut geo_ids = Vec::with_capacity(items.len());
    let mut shapes = Vec::with_capacity(items.len());

    for (shape, record) in items {
        let Some(polygon) = shape_to_multipolygon(shape)
            .with_context(|| format!("[io::shp] Bad county geometry in {}", path.display()))?
        else { continue };
        geo_ids.push(GeoId::county(&get_text_field(&record, id_field)?));
        shapes.push(polygon);
    }

    tracing::debug!("[io::shp] read {} counties from {}", geo_ids.len(), path.display());
    Ok(CountyLayer::new(geo_ids, shapes)?)
}

/// Reads land-fraction polygons carrying a numeric `frac_field` attribute (normally `frac`).
pub fn read_land_fraction_layer(path: &Path, frac_field: &str) -> Result<LandFractionLayer> {
    let items = read_shapefile(path)?;
    let mut fracs = Vec::with_capacity(items.len());
    let mut shapes = Vec::with_capacity(items.len());

    for (shape, record) in items {
        let Some(polygon) = shape_to_multipolygon(shape)
            .with_context(|| format!("[io::shp] Bad land-fraction geometry in {}", path.display()))?
        else { continue };
        fracs.push(get_numeric_field(&record, frac_field)?);
        shapes.push(polygon);
    }

    tracing::debug!("[io::shp] read {} land-fraction polygons from {}", fracs.len(), path.display());
    Ok(LandFractionLayer::new(fracs, shapes)?)
}

/// Reads every polygon of a shapefile, ignoring attributes (state or coast outlines).
pub fn read_boundary_layer(path: &Path) -> Result<Vec<MultiPolygon<f64>>> {
    let mut shapes = Vec::new();
    for (shape, _) in read_shapefile(path)? {
        if let Some(polygon) = shape_to_multipolygon(shape)
            .with_context(|| format!("[io::shp] Bad boundary geometry in {}", path.display()))?
        {
            shapes.push(polygon);
        }
    }
    Ok(shapes)
}

/// Convert a polygon-like shape; null shapes are skipped, anything else is an error.
fn shape_to_multipolygon(shape: Shape) -> Result<Option<MultiPolygon<f64>>> {
    match shape {
        Shape::Polygon(polygon) => Ok(Some(shp_to_geo(&polygon))),
        Shape::NullShape => Ok(None),
        other => bail!("found non-Polygon shape in layer: {:?}", other.shapetype()),
    }
}

/// Get the value of a character (or integral numeric) field from a Record.
fn get_text_field(record: &Record, field: &str) -> Result<String> {
    match record.get(field) {
        Some(FieldValue::Character(Some(s))) => Ok(s.trim().to_string()),
        Some(FieldValue::Numeric(Some(n))) => Ok(format!("{}", *n as i64)),
        Some(FieldValue::Integer(n)) => Ok(n.to_string()),
        _ => bail!("missing or invalid character field: {}", field),
    }
}

/// Get the value of a numeric field from a Record.
fn get_numeric_field(record: &Record, field: &str) -> Result<f64> {
    match record.get(field) {
        Some(FieldValue::Numeric(Some(n))) => Ok(*n),
        Some(FieldValue::Float(Some(n))) => Ok(*n as f64),
        Some(FieldValue::Double(n)) => Ok(*n),
        Some(FieldValue::Integer(n)) => Ok(*n as f64),
        _ => bail!("missing or invalid numeric field: {}", field),
    }
}

/// Convert shapefile::Polygon to geo::MultiPolygon<f64>
pub(crate) fn shp_to_geo(p: &shp::Polygon) -> MultiPolygon<f64> {
    /// Ensure first and last are the same for geo::LineString coords
    fn ensure_closed(coords: &mut Vec<Coord<f64>>) {
        if let (Some(&first), Some(&last)) = (coords.first(), coords.last()) {
            if first != last { coords.push(first) }
        }
    }

    /// Get the signed area of a geo::Coord list (negative for clockwise)
    fn signed_area(pts: &[Coord<f64>]) -> f64 {
        pts.windows(2)
            .map(|w| w[0].x * w[1].y - w[1].x * w[0].y)
            .sum::<f64>() / 2.0
    }

    let mut polygons: Vec<Polygon<f64>> = Vec::new();
    let mut exterior: Option<LineString<f64>> = None;
    let mut holes: Vec<LineString<f64>> = Vec::new();

    // Shapefile stores each clockwise exterior followed by its counter-clockwise holes.
    for ring in p.rings() {
        let mut coords = ring.points().iter()
            .map(|pt| Coord { x: pt.x, y: pt.y })
            .collect::<Vec<_>>();
        ensure_closed(&mut coords);
        let is_exterior = signed_area(&coords) < 0.0;
        let ring = LineString(coords);

        if is_exterior {
            if let Some(ext) = exterior.take() {
                polygons.push(Polygon::new(ext, std::mem::take(&mut holes)));
            }
            exterior = Some(ring);
        } else {
            holes.push(ring);
        }
    }
    if let Some(ext) = exterior {
        polygons.push(Polygon::new(ext, holes));
    }

    MultiPolygon(polygons)
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::Area;

    fn square(x0: f64, y0: f64, size: f64, clockwise: bool) -> Vec<shp::Point> {
        let mut pts = vec![
            shp::Point { x: x0, y: y0 },
            shp::Point { x: x0, y: y0 + size },
            shp::Point { x: x0 + size, y: y0 + size },
            shp::Point { x: x0 + size, y: y0 },
            shp::Point { x: x0, y: y0 },
        ];
        if !clockwise { pts.reverse() }
        pts
    }

    #[test]
    fn exterior_with_hole_becomes_one_polygon() {
        let polygon = shp::Polygon::with_rings(vec![
            shp::PolygonRing::Outer(square(0.0, 0.0, 4.0, true)),
            shp::PolygonRing::Inner(square(1.0, 1.0, 1.0, false)),
        ]);
        let mp = shp_to_geo(&polygon);
        assert_eq!(mp.0.len(), 1);
        assert_eq!(mp.0[0].interiors().len(), 1);
        assert!((mp.unsigned_area() - 15.0).abs() < 1e-12);
    }

    #[test]
    fn two_exteriors_become_two_polygons() {
        let polygon = shp::Polygon::with_rings(vec![
            shp::PolygonRing::Outer(square(0.0, 0.0, 1.0, true)),
            shp::PolygonRing::Outer(square(5.0, 5.0, 1.0, true)),
        ]);
        assert_eq!(shp_to_geo(&polygon).0.len(), 2);
    }
}
