//! Polygon to SVG path conversion.

use geo::{Coord, CoordsIter, LineString, MultiPolygon};

/// Projection function: lon/lat -> SVG coords (x,y)
pub(crate) type Projection = dyn Fn(&Coord<f64>) -> (f64, f64);

/// Plate carrée projection of `bounds` into a `width`-wide canvas with `margin`,
/// preserving aspect (Y down). Returns the projection and the canvas height.
pub(crate) fn fit_projection(bounds: geo::Rect<f64>, width: f64, margin: f64) -> (Box<Projection>, f64) {
    let scale = (width - 2.0 * margin) / bounds.width().max(f64::EPSILON);
    let height = bounds.height() * scale + 2.0 * margin;
    let project = move |coord: &Coord<f64>| -> (f64, f64) {
        let x = margin + (coord.x - bounds.min().x) * scale;
        let y = margin + (bounds.max().y - coord.y) * scale;
        (x, y)
    };
    (Box::new(project), height)
}

/// Build a compact SVG path string for a MultiPolygon (exteriors + holes).
pub(crate) fn multipolygon_to_path(shape: &MultiPolygon<f64>, project: &Projection) -> String {
    let mut out = String::new();
    for polygon in &shape.0 {
        ring_to_path(polygon.exterior(), project, &mut out);
        for interior in polygon.interiors() {
            ring_to_path(interior, project, &mut out);
        }
    }
    out
}

/// Append a ring as an SVG subpath: "M x,y L x,y ... Z"
fn ring_to_path(ring: &LineString<f64>, project: &Projection, out: &mut String) {
    let mut coords = ring.coords_iter().map(|coord| project(&coord));
    if let Some((x, y)) = coords.next() {
        out.push_str(&format!(" M{x:.3},{y:.3}"));
        for (x, y) in coords {
            out.push_str(&format!(" L{x:.3},{y:.3}"));
        }
        out.push('Z');
    }
}

#[cfg(test)]
mod tests {
    use geo::{Rect, polygon};

    use super::*;

    #[test]
    fn projection_flips_y_and_keeps_aspect() {
        let bounds = Rect::new((0.0, 0.0), (2.0, 1.0));
        let (project, height) = fit_projection(bounds, 220.0, 10.0);
        assert_eq!(height, 120.0);
        assert_eq!(project(&Coord { x: 0.0, y: 1.0 }), (10.0, 10.0));
        assert_eq!(project(&Coord { x: 2.0, y: 0.0 }), (210.0, 110.0));
    }

    #[test]
    fn path_includes_holes() {
        let shape = MultiPolygon::new(vec![polygon!(
            exterior: [(x: 0.0, y: 0.0), (x: 4.0, y: 0.0), (x: 4.0, y: 4.0), (x: 0.0, y: 4.0)],
            interiors: [[(x: 1.0, y: 1.0), (x: 2.0, y: 1.0), (x: 2.0, y: 2.0), (x: 1.0, y: 2.0)]],
        )]);
        let identity = |c: &Coord<f64>| (c.x, c.y);
        let path = multipolygon_to_path(&shape, &identity);
        assert_eq!(path.matches('M').count(), 2);
        assert!(path.starts_with(" M0.000,0.000 L4.000,0.000"));
    }
}
