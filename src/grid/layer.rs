use geo::{BoundingRect, MultiPolygon, Rect};
use rstar::{AABB, RTree};

use crate::{
    grid::{BoundingBox, GridError},
    types::GeoId,
};

/// Polygons with an R-tree over their bounding boxes.
#[derive(Debug, Clone)]
pub(crate) struct Polygons {
    shapes: Vec<MultiPolygon<f64>>,
    rtree: RTree<BoundingBox>,
}

impl Polygons {
    /// Index a set of polygons; empty polygons get no R-tree entry.
    pub(crate) fn new(shapes: Vec<MultiPolygon<f64>>) -> Self {
        Self {
            rtree: RTree::bulk_load(
                shapes.iter().enumerate()
                    .filter_map(|(i, shape)| shape.bounding_rect().map(|rect| BoundingBox::new(i, rect)))
                    .collect()
            ),
            shapes,
        }
    }

    #[inline] pub(crate) fn len(&self) -> usize { self.shapes.len() }

    #[inline] pub(crate) fn shapes(&self) -> &[MultiPolygon<f64>] { &self.shapes }

    /// Indices of polygons whose bounding boxes intersect `envelope`.
    pub(crate) fn query(&self, envelope: &AABB<[f64; 2]>) -> impl Iterator<Item = usize> + '_ {
        self.rtree.locate_in_envelope_intersecting(envelope).map(BoundingBox::idx)
    }

    /// Bounding rectangle of all polygons.
    pub(crate) fn bounds(&self) -> Option<Rect<f64>> {
        self.shapes.iter()
            .filter_map(|shape| shape.bounding_rect())
            .reduce(|a, b| Rect::new(
                (a.min().x.min(b.min().x), a.min().y.min(b.min().y)),
                (a.max().x.max(b.max().x), a.max().y.max(b.max().y)),
            ))
    }
}

/// County polygons keyed by `GEOID`, in lon/lat degrees.
#[derive(Debug, Clone)]
pub struct CountyLayer {
    geo_ids: Vec<GeoId>,
    polygons: Polygons,
}

impl CountyLayer {
    pub fn new(geo_ids: Vec<GeoId>, shapes: Vec<MultiPolygon<f64>>) -> Result<Self, GridError> {
        if geo_ids.len() != shapes.len() {
            return Err(GridError::LayerLengthMismatch { layer: "county", shapes: shapes.len(), attributes: geo_ids.len() });
        }
        Ok(Self { geo_ids, polygons: Polygons::new(shapes) })
    }

    #[inline] pub fn len(&self) -> usize { self.polygons.len() }

    #[inline] pub fn is_empty(&self) -> bool { self.len() == 0 }

    #[inline] pub fn geo_ids(&self) -> &[GeoId] { &self.geo_ids }

    #[inline] pub fn shapes(&self) -> &[MultiPolygon<f64>] { self.polygons.shapes() }

    #[inline] pub(crate) fn polygons(&self) -> &Polygons { &self.polygons }
}

/// Polygons carrying the fraction of their area that is cropland (or land), 0..=1.
#[derive(Debug, Clone)]
pub struct LandFractionLayer {
    fracs: Vec<f64>,
    polygons: Polygons,
}

impl LandFractionLayer {
    pub fn new(fracs: Vec<f64>, shapes: Vec<MultiPolygon<f64>>) -> Result<Self, GridError> {
        if fracs.len() != shapes.len() {
            return Err(GridError::LayerLengthMismatch { layer: "land fraction", shapes: shapes.len(), attributes: fracs.len() });
        }
        if let Some((index, &value)) = fracs.iter().enumerate().find(|(_, v)| !v.is_finite()) {
            return Err(GridError::InvalidLandFraction { index, value });
        }
        Ok(Self { fracs, polygons: Polygons::new(shapes) })
    }

    #[inline] pub fn len(&self) -> usize { self.polygons.len() }

    #[inline] pub fn is_empty(&self) -> bool { self.len() == 0 }

    #[inline] pub fn fracs(&self) -> &[f64] { &self.fracs }

    #[inline] pub(crate) fn polygons(&self) -> &Polygons { &self.polygons }
}
