use std::{io::Write, path::Path};

use ahash::AHashMap;
use anyhow::{Result, anyhow, bail};
use geo::MultiPolygon;
use polars::frame::DataFrame;
use serde::{Deserialize, Serialize};

use crate::{
    grid::CountyLayer,
    io::svg::{MISSING_FILL, Projection, SvgWriter, escape_text, fit_projection, multipolygon_to_path},
    plot::ColorRamp,
    types::GeoId,
    verify::{AGVAR_COL, GEOID_COL},
};

/// Number of swatches in the legend bar.
const LEGEND_STEPS: usize = 40;
const LEGEND_HEIGHT: f64 = 60.0;
const TITLE_HEIGHT: f64 = 30.0;

/// Map of one score column over county polygons.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Choropleth {
    /// Score column to draw (a model name, `SPR`, `CRPS`, ...).
    pub column: String,
    /// Sub-variable to draw when the table is keyed by `AgVar`.
    pub agvar: Option<String>,
    /// Value mapped to the low end of the ramp.
    pub vmin: f64,
    /// Value mapped to the high end of the ramp.
    pub vmax: f64,
    pub ramp: ColorRamp,
    pub title: Option<String>,
    /// Canvas width in pixels; height follows the map's aspect.
    pub width: f64,
    pub margin: f64,
}

impl Default for Choropleth {
    fn default() -> Self {
        Self {
            column: String::new(),
            agvar: None,
            vmin: 0.0,
            vmax: 1.0,
            ramp: ColorRamp::default(),
            title: None,
            width: 1200.0,
            margin: 10.0,
        }
    }
}

impl Choropleth {
    pub fn new(column: impl Into<String>, vmin: f64, vmax: f64) -> Self {
        Self { column: column.into(), vmin, vmax, ..Default::default() }
    }

    /// Score per county, restricted to `agvar` when the table carries an `AgVar` column.
    pub fn values(&self, scores: &DataFrame) -> Result<AHashMap<GeoId, f64>> {
        let geo_ids = scores.column(GEOID_COL)
            .map_err(|_| anyhow!("[plot] Score table has no {GEOID_COL} column"))?
            .str()?;
        let values = scores.column(&self.column)
            .map_err(|_| anyhow!("[plot] Score table has no column {:?}", self.column))?
            .cast(&polars::prelude::DataType::Float64)?;
        let values = values.f64()?;

        let agvars = match (scores.column(AGVAR_COL).ok(), &self.agvar) {
            (Some(column), Some(_)) => Some(column.str()?),
            (Some(column), None) => {
                let distinct = column.str()?.into_iter().flatten().collect::<std::collections::BTreeSet<_>>();
                if distinct.len() > 1 {
                    bail!("[plot] Score table holds several {AGVAR_COL} values ({}); pick one",
                        distinct.into_iter().collect::<Vec<_>>().join(", "));
                }
                None
            }
            (None, Some(agvar)) => bail!("[plot] Cannot select {AGVAR_COL} {agvar:?}: score table has no {AGVAR_COL} column"),
            (None, None) => None,
        };

        let mut out = AHashMap::with_capacity(scores.height());
        for row in 0..scores.height() {
            if let (Some(agvars), Some(wanted)) = (agvars, &self.agvar) {
                if agvars.get(row) != Some(wanted.as_str()) { continue }
            }
            if let (Some(geo_id), Some(value)) = (geo_ids.get(row), values.get(row)) {
                out.insert(GeoId::county(geo_id), value);
            }
        }
        Ok(out)
    }

    /// Render the map to an SVG file. Counties without a score are light gray;
    /// `overlays` (state lines, coasts) are stroked on top without fill.
    pub fn write_svg(
        &self,
        scores: &DataFrame,
        counties: &CountyLayer,
        overlays: &[MultiPolygon<f64>],
        path: &Path,
    ) -> Result<()> {
        let values = self.values(scores)?;
        let bounds = counties.polygons().bounds()
            .ok_or_else(|| anyhow!("[plot] Could not determine bounds; nothing to draw."))?;

        let (project, map_height) = fit_projection(bounds, self.width, self.margin);
        let top = if self.title.is_some() { TITLE_HEIGHT } else { 0.0 };
        let height = top + map_height + LEGEND_HEIGHT;

        let mut writer = SvgWriter::new(path)?;
        writer.write_header(self.width, height, &bounds)?;
        writer.write_styles()?;

        if let Some(title) = &self.title {
            writeln!(writer, r#"<text class="title" x="{:.1}" y="22">{}</text>"#, self.margin, escape_text(title))?;
        }

        writeln!(writer, r#"<g transform="translate(0,{top:.1})">"#)?;
        let mut matched = 0usize;
        for (geo_id, shape) in counties.geo_ids().iter().zip(counties.shapes()) {
            let fill = match values.get(geo_id) {
                Some(&value) => { matched += 1; self.ramp.color(value, self.vmin, self.vmax) }
                None => MISSING_FILL,
            };
            writeln!(writer, r#"<path class="cty" fill="{fill}" d="{}"><title>{}</title></path>"#,
                multipolygon_to_path(shape, &project), geo_id)?;
        }
        draw_outlines(&mut writer, overlays, &project)?;
        writeln!(writer, "</g>")?;

        self.write_legend(&mut writer, top + map_height)?;
        writer.write_footer()?;
        writer.flush()?;

        tracing::info!("[plot] drew {} counties ({} with a {} value) to {}",
            counties.len(), matched, self.column, path.display());
        Ok(())
    }

    /// Horizontal color bar with `vmin`, midpoint and `vmax` ticks.
    fn write_legend(&self, writer: &mut impl Write, y: f64) -> Result<()> {
        let bar_width = (self.width - 2.0 * self.margin) / 2.0;
        let step = bar_width / LEGEND_STEPS as f64;
        let y = y + 10.0;

        for i in 0..LEGEND_STEPS {
            let t = (i as f64 + 0.5) / LEGEND_STEPS as f64;
            let color = self.ramp.color(self.vmin + t * (self.vmax - self.vmin), self.vmin, self.vmax);
            writeln!(writer, r#"<rect x="{:.2}" y="{y:.1}" width="{:.2}" height="16" fill="{color}"/>"#,
                self.margin + i as f64 * step, step + 0.5)?;
        }

        for (t, anchor) in [(0.0, "start"), (0.5, "middle"), (1.0, "end")] {
            let value = self.vmin + t * (self.vmax - self.vmin);
            writeln!(writer, r#"<text class="tick" x="{:.2}" y="{:.1}" text-anchor="{anchor}">{}</text>"#,
                self.margin + t * bar_width, y + 32.0, format_tick(value))?;
        }
        Ok(())
    }
}

fn draw_outlines(writer: &mut impl Write, shapes: &[MultiPolygon<f64>], project: &Projection) -> Result<()> {
    for shape in shapes {
        writeln!(writer, r#"<path class="bnd" d="{}"/>"#, multipolygon_to_path(shape, project))?;
    }
    Ok(())
}

fn format_tick(value: f64) -> String {
    if value != 0.0 && (value.abs() < 1e-2 || value.abs() >= 1e4) {
        format!("{value:.2e}")
    } else {
        format!("{value:.2}")
    }
}
