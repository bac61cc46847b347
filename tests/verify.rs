//! End-to-end verification: observation CSV on disk through scoring, ratios and plotting inputs.

use std::fs;

use agverify::{
    Metric, TruthSource, VerifyConfig, compose_ratio, read_observations, read_score_table,
    spread_skill, verify, write_table,
};
use approx::assert_relative_eq;

const HIGH_RES: &str = "\
AgVar,GEOID,Year,GMFD,USDA,CCSM4,MIROC5,ensemble_mean
gdd,1001,1999,9.0,,9.0,9.0,9.0
gdd,1001,2000,1.0,,1.0,1.5,1.25
gdd,1001,2001,2.0,,2.0,2.5,2.25
gdd,1001,2002,3.0,,4.0,3.5,3.75
gdd,17031,2000,4.0,,4.5,3.0,3.75
gdd,17031,2001,5.0,,5.5,6.0,5.75
gdd,17031,2002,6.0,,NaN,6.5,6.5
prcp,1001,2000,10.0,,11.0,9.0,10.0
prcp,1001,2001,12.0,,12.0,13.0,12.5
prcp,1001,2002,14.0,,13.0,15.0,14.0
";

fn config() -> VerifyConfig {
    VerifyConfig { year_min: 2000, year_max: 2002, ..VerifyConfig::agvar() }
}

#[test]
fn scores_round_trip_through_csv() {
    let tmp = tempfile::tempdir().unwrap();
    let input = tmp.path().join("obs.csv");
    fs::write(&input, HIGH_RES).unwrap();

    let observations = read_observations(&input).unwrap();
    let mut scores = verify(&observations, Metric::Rmse, &config()).unwrap();
    assert_eq!(scores.height(), 3);
    let names = scores.get_column_names().into_iter().map(|n| n.to_string()).collect::<Vec<_>>();
    assert_eq!(names, vec!["AgVar", "GEOID", "CCSM4", "MIROC5", "ensemble_mean"]);

    let out = tmp.path().join("scores_rmse.csv");
    write_table(&mut scores, &out).unwrap();
    let back = read_score_table(&out).unwrap();
    assert_eq!(back.column("GEOID").unwrap().str().unwrap().get(0), Some("01001"));

    // gdd/01001 CCSM4 errors 0, 0, 1 over 2000-2002.
    let ccsm = back.column("CCSM4").unwrap().f64().unwrap();
    assert_relative_eq!(ccsm.get(0).unwrap(), (1.0f64 / 3.0).sqrt(), epsilon = 1e-12);

    let ratio = compose_ratio(&back, &back).unwrap();
    for name in ["CCSM4", "MIROC5", "ensemble_mean"] {
        for value in ratio.column(name).unwrap().f64().unwrap().into_no_null_iter() {
            assert_relative_eq!(value, 1.0);
        }
    }
}

#[test]
fn rows_with_nan_models_are_skipped() {
    let tmp = tempfile::tempdir().unwrap();
    let input = tmp.path().join("obs.csv");
    fs::write(&input, HIGH_RES).unwrap();
    let observations = read_observations(&input).unwrap();

    // gdd/17031 keeps only 2000 and 2001: MIROC5 errors -1, 1.
    let scores = verify(&observations, Metric::Mse, &config()).unwrap();
    let miroc = scores.column("MIROC5").unwrap().f64().unwrap();
    assert_relative_eq!(miroc.get(1).unwrap(), 1.0);
}

#[test]
fn ensemble_spread_skill_per_agvar() {
    let tmp = tempfile::tempdir().unwrap();
    let input = tmp.path().join("obs.csv");
    fs::write(&input, HIGH_RES).unwrap();
    let observations = read_observations(&input).unwrap();

    let spr = spread_skill(&observations, &config()).unwrap();
    assert_eq!(spr.height(), 3);
    assert!(spr.column("SPR").unwrap().f64().unwrap().into_no_null_iter().all(|v| v.is_finite() && v > 0.0));
}

#[test]
fn usda_preset_needs_usda_values() {
    let tmp = tempfile::tempdir().unwrap();
    let input = tmp.path().join("obs.csv");
    fs::write(&input, HIGH_RES).unwrap();
    let observations = read_observations(&input).unwrap();

    // Every USDA value is missing, so every row is dropped.
    let config = VerifyConfig { truth: TruthSource::Usda, min_valid_years: None, ..config() };
    let scores = verify(&observations, Metric::Mse, &config).unwrap();
    assert_eq!(scores.height(), 0);
}
