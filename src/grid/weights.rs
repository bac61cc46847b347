use anyhow::Result;
use geo::{Area, BooleanOps, BoundingRect, MultiPolygon};
use polars::prelude::*;
use rstar::RTree;

use crate::{
    grid::{
        BoundingBox, CountyLayer, GridAxes, LandFractionLayer, WeightConfig,
        axes::GridCell,
        bbox::envelope_of,
    },
    types::GEOID_COL,
};

pub const LAT_COL: &str = "latitude";
pub const LON_COL: &str = "longitude";
pub const AREA_FRAC_COL: &str = "area_frac";
pub const COUNTY_WEIGHT_COL: &str = "county_weight";
pub const WITHIN_COUNTY_WEIGHT_COL: &str = "within_county_weight";

// Piece columns that never reach the output.
const FRAC_COL: &str = "frac";
const AREA_COL: &str = "area";
const TOTAL_AREA_COL: &str = "total_area";
const TOTAL_WEIGHT_COL: &str = "total_weight";

/// One surviving piece of the county ∩ cell ∩ land-fraction overlay.
#[derive(Debug, Clone, Copy)]
struct Piece {
    county: usize,
    cell: usize,
    frac: f64,
    area: f64,
}

/// Area-weighted attribution of grid cells to counties.
///
/// Each cell inside the configured bounding box becomes a rectangle centered on
/// its grid point. Rectangles are intersected with the counties, then with the
/// land-fraction polygons; pieces no larger than `area_threshold` are dropped.
/// Per county (polygons sharing a `GEOID` count as one county):
///
/// - `area_frac` is the piece area over the county's total piece area,
/// - `county_weight` is the land fraction times `area_frac`,
/// - `within_county_weight` is `county_weight` over the county's total, or 0
///   when that total is 0.
///
/// Returns one row per (county, cell) pair with `GEOID`, `latitude` and
/// `longitude` (indices into the grid axes) and `within_county_weight`, sorted
/// by county then cell. Counties without surviving pieces are absent.
pub fn compute_weights(
    axes: &GridAxes,
    counties: &CountyLayer,
    fracs: &LandFractionLayer,
    config: &WeightConfig,
) -> Result<DataFrame> {
    let cells = axes.cells_within(&config.bbox());
    tracing::info!("[grid] {} grid cells inside the bounding box, {} counties, {} land-fraction polygons",
        cells.len(), counties.len(), fracs.len());

    let pieces = overlay(&cells, counties, fracs, config.area_threshold);
    tracing::debug!("[grid] {} overlay pieces above {} deg²", pieces.len(), config.area_threshold);

    let weights = normalize(pieces_frame(&pieces, counties, &cells)?, config.keep_intermediate)?;

    let uncovered = weights.clone().lazy()
        .group_by([col(GEOID_COL)])
        .agg([col(WITHIN_COUNTY_WEIGHT_COL).sum()])
        .filter(col(WITHIN_COUNTY_WEIGHT_COL).eq(lit(0.0)))
        .collect()?
        .height();
    if uncovered > 0 {
        tracing::debug!("[grid] {uncovered} counties have no land-fraction coverage; their weights are 0");
    }

    tracing::info!("[grid] {} (county, cell) weights", weights.height());
    Ok(weights)
}

/// Intersect cells with counties, then with land-fraction polygons.
fn overlay(cells: &[GridCell], counties: &CountyLayer, fracs: &LandFractionLayer, area_threshold: f64) -> Vec<Piece> {
    let cell_tree = RTree::bulk_load(
        cells.iter().enumerate()
            .map(|(i, cell)| BoundingBox::new(i, cell.rect))
            .collect()
    );

    let mut pieces = Vec::new();
    for (county, shape) in counties.shapes().iter().enumerate() {
        let Some(rect) = shape.bounding_rect() else { continue };

        for cand in cell_tree.locate_in_envelope_intersecting(&envelope_of(&rect)) {
            let cell = cand.idx();
            let county_cell = shape.intersection(&MultiPolygon::new(vec![cells[cell].rect.to_polygon()]));
            let Some(piece_rect) = county_cell.bounding_rect() else { continue };

            for frac_idx in fracs.polygons().query(&envelope_of(&piece_rect)) {
                let piece = county_cell.intersection(&fracs.polygons().shapes()[frac_idx]);
                let area = piece.unsigned_area();
                if area > area_threshold {
                    pieces.push(Piece { county, cell, frac: fracs.fracs()[frac_idx], area });
                }
            }
        }
    }
    pieces
}

/// One row per overlay piece, keyed by `GEOID` and grid indices.
fn pieces_frame(pieces: &[Piece], counties: &CountyLayer, cells: &[GridCell]) -> Result<DataFrame> {
    Ok(DataFrame::new(vec![
        Column::new(GEOID_COL.into(), pieces.iter().map(|p| counties.geo_ids()[p.county].id().to_string()).collect::<Vec<_>>()),
        Column::new(LAT_COL.into(), pieces.iter().map(|p| cells[p.cell].lat_index as i64).collect::<Vec<_>>()),
        Column::new(LON_COL.into(), pieces.iter().map(|p| cells[p.cell].lon_index as i64).collect::<Vec<_>>()),
        Column::new(FRAC_COL.into(), pieces.iter().map(|p| p.frac).collect::<Vec<_>>()),
        Column::new(AREA_COL.into(), pieces.iter().map(|p| p.area).collect::<Vec<_>>()),
    ])?)
}

/// Nested per-county normalization of the pieces, summed per (county, cell) pair.
fn normalize(pieces: DataFrame, keep_intermediate: bool) -> Result<DataFrame> {
    let area_totals = pieces.clone().lazy()
        .group_by([col(GEOID_COL)])
        .agg([col(AREA_COL).sum().alias(TOTAL_AREA_COL)]);

    let weighted = pieces.lazy()
        .inner_join(area_totals, col(GEOID_COL), col(GEOID_COL))
        .with_columns([(col(AREA_COL) / col(TOTAL_AREA_COL)).alias(AREA_FRAC_COL)])
        .with_columns([(col(FRAC_COL) * col(AREA_FRAC_COL)).alias(COUNTY_WEIGHT_COL)]);

    let weight_totals = weighted.clone()
        .group_by([col(GEOID_COL)])
        .agg([col(COUNTY_WEIGHT_COL).sum().alias(TOTAL_WEIGHT_COL)]);

    let mut output = vec![col(GEOID_COL), col(LAT_COL), col(LON_COL)];
    if keep_intermediate {
        output.extend([col(AREA_FRAC_COL), col(COUNTY_WEIGHT_COL)]);
    }
    output.push(col(WITHIN_COUNTY_WEIGHT_COL));

    Ok(weighted
        .inner_join(weight_totals, col(GEOID_COL), col(GEOID_COL))
        // A county with no land fraction divides 0 by 0.
        .with_columns([(col(COUNTY_WEIGHT_COL) / col(TOTAL_WEIGHT_COL)).fill_nan(lit(0.0)).alias(WITHIN_COUNTY_WEIGHT_COL)])
        .group_by([col(GEOID_COL), col(LAT_COL), col(LON_COL)])
        .agg([
            col(AREA_FRAC_COL).sum(),
            col(COUNTY_WEIGHT_COL).sum(),
            col(WITHIN_COUNTY_WEIGHT_COL).sum(),
        ])
        .sort([GEOID_COL, LAT_COL, LON_COL], SortMultipleOptions::default())
        .select(output)
        .collect()?)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use approx::assert_relative_eq;
    use geo::polygon;

    use super::*;
    use crate::types::GeoId;

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> MultiPolygon<f64> {
        MultiPolygon::new(vec![polygon![(x: x0, y: y0), (x: x1, y: y0), (x: x1, y: y1), (x: x0, y: y1)]])
    }

    /// 1° grid with centers at -100, -99 and 30, 31 (0..360 longitudes).
    fn axes() -> GridAxes {
        GridAxes::new(vec![30.0, 31.0], vec![260.0, 261.0]).unwrap()
    }

    fn weight_sums(df: &DataFrame, column: &str) -> BTreeMap<String, f64> {
        let ids = df.column(GEOID_COL).unwrap().str().unwrap();
        let values = df.column(column).unwrap().f64().unwrap();
        let mut sums = BTreeMap::new();
        for (id, value) in ids.into_no_null_iter().zip(values.into_no_null_iter()) {
            *sums.entry(id.to_string()).or_insert(0.0) += value;
        }
        sums
    }

    #[test]
    fn weights_sum_to_one_per_county() {
        // County A spans four cells; county B sits inside one cell.
        let counties = CountyLayer::new(
            vec![GeoId::county("1001"), GeoId::county("1003")],
            vec![rect(-100.25, 30.0, -99.0, 31.25), rect(-99.4, 30.6, -99.1, 30.9)],
        ).unwrap();
        let fracs = LandFractionLayer::new(
            vec![0.2, 0.8],
            vec![rect(-101.0, 29.0, -99.5, 32.0), rect(-99.5, 29.0, -98.0, 32.0)],
        ).unwrap();
        let config = WeightConfig { keep_intermediate: true, ..WeightConfig::default() };

        let df = compute_weights(&axes(), &counties, &fracs, &config).unwrap();
        for sums in [weight_sums(&df, WITHIN_COUNTY_WEIGHT_COL), weight_sums(&df, AREA_FRAC_COL)] {
            assert_eq!(sums.len(), 2);
            for total in sums.values() {
                assert_relative_eq!(*total, 1.0, epsilon = 1e-9);
            }
        }

        // County B lies in the lon 261 (index 1), lat 31 (index 1) cell only.
        let ids = df.column(GEOID_COL).unwrap().str().unwrap();
        let b_rows = (0..df.height()).filter(|&i| ids.get(i) == Some("01003")).collect::<Vec<_>>();
        assert_eq!(b_rows.len(), 1);
        assert_eq!(df.column(LAT_COL).unwrap().i64().unwrap().get(b_rows[0]), Some(1));
        assert_eq!(df.column(LON_COL).unwrap().i64().unwrap().get(b_rows[0]), Some(1));
    }

    #[test]
    fn land_fraction_skews_weights() {
        // Equal areas in two cells; the eastern half is three times as cropped.
        let counties = CountyLayer::new(vec![GeoId::county("1001")], vec![rect(-100.5, 30.0, -98.5, 30.5)]).unwrap();
        let fracs = LandFractionLayer::new(
            vec![0.25, 0.75],
            vec![rect(-101.0, 29.0, -99.5, 32.0), rect(-99.5, 29.0, -98.0, 32.0)],
        ).unwrap();

        let df = compute_weights(&axes(), &counties, &fracs, &WeightConfig::default()).unwrap();
        assert_eq!(df.get_column_names().len(), 4);
        let lons = df.column(LON_COL).unwrap().i64().unwrap();
        let weights = df.column(WITHIN_COUNTY_WEIGHT_COL).unwrap().f64().unwrap();
        for i in 0..df.height() {
            let expected = if lons.get(i) == Some(0) { 0.25 } else { 0.75 };
            assert_relative_eq!(weights.get(i).unwrap(), expected, epsilon = 1e-9);
        }
    }

    #[test]
    fn zero_land_fraction_gives_zero_weight() {
        let counties = CountyLayer::new(vec![GeoId::county("1001")], vec![rect(-100.25, 30.0, -99.75, 30.25)]).unwrap();
        let fracs = LandFractionLayer::new(vec![0.0], vec![rect(-101.0, 29.0, -98.0, 32.0)]).unwrap();

        let df = compute_weights(&axes(), &counties, &fracs, &WeightConfig::default()).unwrap();
        assert_eq!(df.height(), 1);
        assert_eq!(df.column(WITHIN_COUNTY_WEIGHT_COL).unwrap().f64().unwrap().get(0), Some(0.0));
    }

    #[test]
    fn county_without_pieces_is_absent() {
        let counties = CountyLayer::new(
            vec![GeoId::county("1001"), GeoId::county("6037")],
            vec![rect(-100.25, 30.0, -99.75, 30.25), rect(-118.5, 34.0, -118.0, 34.5)],
        ).unwrap();
        let fracs = LandFractionLayer::new(vec![0.5], vec![rect(-101.0, 29.0, -98.0, 32.0)]).unwrap();

        let df = compute_weights(&axes(), &counties, &fracs, &WeightConfig::default()).unwrap();
        let ids = df.column(GEOID_COL).unwrap().str().unwrap().into_no_null_iter().collect::<Vec<_>>();
        assert_eq!(ids, vec!["01001"]);
    }

    #[test]
    fn polygons_sharing_a_geoid_form_one_county() {
        let counties = CountyLayer::new(
            vec![GeoId::county("1001"), GeoId::county("1001")],
            vec![rect(-100.25, 30.0, -99.75, 30.25), rect(-99.25, 30.0, -98.75, 30.25)],
        ).unwrap();
        let fracs = LandFractionLayer::new(vec![1.0], vec![rect(-101.0, 29.0, -98.0, 32.0)]).unwrap();

        let df = compute_weights(&axes(), &counties, &fracs, &WeightConfig::default()).unwrap();
        assert_eq!(df.height(), 2);
        let sums = weight_sums(&df, WITHIN_COUNTY_WEIGHT_COL);
        assert_relative_eq!(sums["01001"], 1.0, epsilon = 1e-9);
    }

    #[test]
    fn slivers_below_threshold_are_dropped() {
        // The county grazes the western cell with a 1e-5 x 1e-6 sliver.
        let counties = CountyLayer::new(vec![GeoId::county("1001")], vec![rect(-99.50001, 30.0, -99.0, 30.000001)]).unwrap();
        let fracs = LandFractionLayer::new(vec![1.0], vec![rect(-101.0, 29.0, -98.0, 32.0)]).unwrap();

        let df = compute_weights(&axes(), &counties, &fracs, &WeightConfig::default()).unwrap();
        assert_eq!(df.height(), 1);
        assert_eq!(df.column(LON_COL).unwrap().i64().unwrap().get(0), Some(1));
    }

    #[test]
    fn pieces_of_one_cell_are_summed() {
        // Two land-fraction polygons split the county inside a single cell.
        let counties = CountyLayer::new(vec![GeoId::county("1001")], vec![rect(-100.25, 30.0, -99.75, 30.25)]).unwrap();
        let fracs = LandFractionLayer::new(
            vec![0.5, 1.0],
            vec![rect(-101.0, 29.0, -100.0, 32.0), rect(-100.0, 29.0, -98.0, 32.0)],
        ).unwrap();
        let config = WeightConfig { keep_intermediate: true, ..WeightConfig::default() };

        let df = compute_weights(&axes(), &counties, &fracs, &config).unwrap();
        assert_eq!(df.height(), 1);
        assert_relative_eq!(df.column(AREA_FRAC_COL).unwrap().f64().unwrap().get(0).unwrap(), 1.0, epsilon = 1e-9);
        assert_relative_eq!(df.column(COUNTY_WEIGHT_COL).unwrap().f64().unwrap().get(0).unwrap(), 0.75, epsilon = 1e-9);
        assert_relative_eq!(df.column(WITHIN_COUNTY_WEIGHT_COL).unwrap().f64().unwrap().get(0).unwrap(), 1.0, epsilon = 1e-9);
    }
}
