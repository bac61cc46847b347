use std::path::PathBuf;

use agverify::{ColorRamp, Metric, TruthSource};

/// Verification statistics and grid-to-county weights (argument schema only)
#[derive(clap::Parser, Debug)]
#[command(name = "agverify", version, about, propagate_version = true)]
pub struct Cli {
    /// Increase output verbosity (-v, -vv); RUST_LOG takes precedence
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Score every model column against a truth series with one metric
    Verify(VerifyArgs),

    /// Ensemble statistics: spread-skill ratio, rank histogram or CRPS
    Ensemble(EnsembleArgs),

    /// Divide two score tables model by model
    Ratio(RatioArgs),

    /// Attribute climate-model grid cells to counties
    Weights(WeightsArgs),

    /// Draw one score column as a county choropleth (SVG)
    Plot(PlotArgs),
}

/// Starting point for verification settings.
#[derive(clap::ValueEnum, Clone, Copy, Debug, Default)]
pub enum Preset {
    /// GDD / precipitation variables against GMFD, 1956-2005, grouped by AgVar
    Agvar,
    /// Yields against USDA, 1950-2005, at least 40 valid years
    #[default]
    YieldUsda,
    /// Yields against GMFD, 1956-2005, at least 40 valid years
    YieldGmfd,
}

/// Verification settings shared by `verify` and `ensemble`.
#[derive(clap::Args, Debug)]
pub struct ConfigArgs {
    /// Preset defaults (ignored when --config is given)
    #[arg(long, value_enum, default_value_t = Preset::default())]
    pub preset: Preset,

    /// JSON file with verification settings
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Truth series: gmfd or usda
    #[arg(long)]
    pub truth: Option<TruthSource>,

    /// First year (inclusive)
    #[arg(long)]
    pub year_min: Option<i32>,

    /// Last year (inclusive)
    #[arg(long)]
    pub year_max: Option<i32>,

    /// Minimum valid truth years per county
    #[arg(long)]
    pub min_valid_years: Option<i32>,

    /// Skip the valid-years check
    #[arg(long, conflicts_with = "min_valid_years")]
    pub no_min_valid_years: bool,

    /// Group by AgVar as well as GEOID
    #[arg(long)]
    pub by_agvar: bool,

    /// Model columns to score (comma separated); all numeric columns by default
    #[arg(long, value_delimiter = ',')]
    pub models: Vec<String>,
}

#[derive(clap::Args, Debug)]
pub struct VerifyArgs {
    /// Observation table (CSV)
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub input: PathBuf,

    /// Metric: r2, mse, rmse, mae, mdae, pearson, spearman, sdratio, madratio, var
    #[arg(short, long)]
    pub metric: Metric,

    #[command(flatten)]
    pub config: ConfigArgs,

    /// Output table (.csv, .json or .parquet), defaults to "./scores_<metric>.csv"
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub output: Option<PathBuf>,

    /// Overwrite an existing output
    #[arg(long)]
    pub force: bool,
}

/// Ensemble statistic to compute.
#[derive(clap::ValueEnum, Clone, Copy, Debug)]
pub enum EnsembleStat {
    /// Spread-skill ratio
    Spr,
    /// Rank histogram
    Rank,
    /// Continuous ranked probability score
    Crps,
}

#[derive(clap::Args, Debug)]
pub struct EnsembleArgs {
    /// Observation table (CSV)
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub input: PathBuf,

    /// Statistic to compute
    #[arg(short, long, value_enum, default_value_t = EnsembleStat::Spr)]
    pub stat: EnsembleStat,

    /// Name of the ensemble-mean column
    #[arg(long)]
    pub ensemble_mean: Option<String>,

    #[command(flatten)]
    pub config: ConfigArgs,

    /// Output table, defaults to "./ensemble_<stat>.csv"
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub output: Option<PathBuf>,

    /// Overwrite an existing output
    #[arg(long)]
    pub force: bool,
}

#[derive(clap::Args, Debug)]
pub struct RatioArgs {
    /// Score table in the numerator
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub numerator: PathBuf,

    /// Score table in the denominator
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub denominator: PathBuf,

    /// Output table, defaults to "./ratio.csv"
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub output: Option<PathBuf>,

    /// Overwrite an existing output
    #[arg(long)]
    pub force: bool,
}

#[derive(clap::Args, Debug)]
pub struct WeightsArgs {
    /// Grid coordinate file (.json, or .nc with the netcdf feature)
    #[arg(value_hint = clap::ValueHint::FilePath, required_unless_present = "names")]
    pub grid: Option<PathBuf>,

    /// Name-list file selecting the grid by --index (one file name per line)
    #[arg(long, requires = "index", conflicts_with = "grid", value_hint = clap::ValueHint::FilePath)]
    pub names: Option<PathBuf>,

    /// 1-based index into the name list
    #[arg(long)]
    pub index: Option<usize>,

    /// Directory holding the datasets of the name list, defaults to "."
    #[arg(long, value_hint = clap::ValueHint::DirPath)]
    pub data_dir: Option<PathBuf>,

    /// County polygons (shapefile)
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub counties: PathBuf,

    /// County identifier attribute
    #[arg(long, default_value = "GEOID")]
    pub id_field: String,

    /// Land-fraction polygons (shapefile)
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub fracs: PathBuf,

    /// Land-fraction attribute
    #[arg(long, default_value = "frac")]
    pub frac_field: String,

    /// JSON file with weighting settings
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Also write area_frac and county_weight
    #[arg(long)]
    pub keep_intermediate: bool,

    /// Output directory, defaults to "."
    #[arg(short, long, value_hint = clap::ValueHint::DirPath)]
    pub output: Option<PathBuf>,

    /// Overwrite an existing output
    #[arg(long)]
    pub force: bool,
}

#[derive(clap::Args, Debug)]
pub struct PlotArgs {
    /// Score table (CSV)
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub scores: PathBuf,

    /// Score column to draw
    #[arg(short, long)]
    pub column: String,

    /// County polygons (shapefile)
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub counties: PathBuf,

    /// County identifier attribute
    #[arg(long, default_value = "GEOID")]
    pub id_field: String,

    /// AgVar to draw when the table is grouped by AgVar
    #[arg(long)]
    pub agvar: Option<String>,

    /// Low end of the color scale
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub vmin: f64,

    /// High end of the color scale
    #[arg(long, default_value_t = 1.0, allow_negative_numbers = true)]
    pub vmax: f64,

    /// Color ramp: sequential or diverging
    #[arg(long, default_value = "sequential")]
    pub ramp: ColorRamp,

    /// Map title
    #[arg(long)]
    pub title: Option<String>,

    /// Boundary shapefiles drawn on top (states, coast)
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub overlay: Vec<PathBuf>,

    /// Output SVG, defaults to "./map.svg"
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub output: Option<PathBuf>,

    /// Overwrite an existing output
    #[arg(long)]
    pub force: bool,
}
