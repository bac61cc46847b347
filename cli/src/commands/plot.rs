use anyhow::Result;

use agverify::Choropleth;

use crate::cli::{Cli, PlotArgs};

pub fn run(_cli: &Cli, args: &PlotArgs) -> Result<()> {
    let out_path = args.output.clone().unwrap_or("./map.svg".into());
    agverify::check_overwrite(&out_path, args.force)?;

    let scores = agverify::read_score_table(&args.scores)?;
    let counties = agverify::read_county_layer(&args.counties, &args.id_field)?;
    let overlays = args.overlay.iter()
        .map(|path| agverify::read_boundary_layer(path))
        .collect::<Result<Vec<_>>>()?
        .into_iter()
        .flatten()
        .collect::<Vec<_>>();

    let plot = Choropleth {
        agvar: args.agvar.clone(),
        ramp: args.ramp,
        title: args.title.clone(),
        ..Choropleth::new(&args.column, args.vmin, args.vmax)
    };

    tracing::info!("[plot] drawing {} to {}", args.column, out_path.display());
    plot.write_svg(&scores, &counties, &overlays, &out_path)
}
