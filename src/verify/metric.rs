use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::verify::VerifyError;

/// A verification statistic of one model series against the truth series.
///
/// Inputs must be free of missing values and of equal length; rows with a
/// missing truth or model value are removed before scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    /// Coefficient of determination of the model against the truth.
    R2,
    /// Mean squared error.
    Mse,
    /// Root mean squared error.
    Rmse,
    /// Mean absolute error.
    Mae,
    /// Median absolute error.
    Mdae,
    /// Pearson correlation coefficient.
    Pearson,
    /// Spearman rank correlation coefficient.
    Spearman,
    /// Standard deviation of the model over that of the truth.
    SdRatio,
    /// Median absolute deviation of the model over that of the truth.
    MadRatio,
    /// Variance of the model series (truth is ignored).
    Variance,
}

impl Metric {
    pub const ALL: [Metric; 10] = [
        Metric::R2,
        Metric::Mse,
        Metric::Rmse,
        Metric::Mae,
        Metric::Mdae,
        Metric::Pearson,
        Metric::Spearman,
        Metric::SdRatio,
        Metric::MadRatio,
        Metric::Variance,
    ];

    /// Lookup name of this metric.
    pub fn name(&self) -> &'static str {
        match self {
            Metric::R2 => "r2",
            Metric::Mse => "mse",
            Metric::Rmse => "rmse",
            Metric::Mae => "mae",
            Metric::Mdae => "mdae",
            Metric::Pearson => "pearson",
            Metric::Spearman => "spearman",
            Metric::SdRatio => "sdratio",
            Metric::MadRatio => "madratio",
            Metric::Variance => "var",
        }
    }

    /// Evaluate the metric on aligned truth/model series.
    pub fn compute(&self, truth: &[f64], model: &[f64]) -> f64 {
        debug_assert_eq!(truth.len(), model.len(), "truth/model length mismatch");
        match self {
            Metric::R2 => r2(truth, model),
            Metric::Mse => mse(truth, model),
            Metric::Rmse => mse(truth, model).sqrt(),
            Metric::Mae => mae(truth, model),
            Metric::Mdae => mdae(truth, model),
            Metric::Pearson => pearson(truth, model),
            Metric::Spearman => spearman(truth, model),
            Metric::SdRatio => variance(model).sqrt() / variance(truth).sqrt(),
            Metric::MadRatio => mad(model) / mad(truth),
            Metric::Variance => variance(model),
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Metric {
    type Err = VerifyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase();
        let alias = match key.as_str() {
            "sdr" => Some(Metric::SdRatio),
            "madr" => Some(Metric::MadRatio),
            "variance" => Some(Metric::Variance),
            _ => None,
        };

        alias
            .or_else(|| Metric::ALL.into_iter().find(|metric| metric.name() == key))
            .ok_or_else(|| VerifyError::UnknownMetric {
                name: s.to_string(),
                valid: Metric::ALL.map(|metric| metric.name()).join(", "),
            })
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() { return f64::NAN }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population variance (ddof = 0).
pub(crate) fn variance(values: &[f64]) -> f64 {
    let m = mean(values);
    mean(&values.iter().map(|v| (v - m).powi(2)).collect::<Vec<_>>())
}

/// Median; the mean of the two central values for even lengths.
fn median(values: &[f64]) -> f64 {
    if values.is_empty() { return f64::NAN }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Median absolute deviation from the median (unscaled; the scale cancels in ratios).
fn mad(values: &[f64]) -> f64 {
    let m = median(values);
    median(&values.iter().map(|v| (v - m).abs()).collect::<Vec<_>>())
}

pub(crate) fn mse(truth: &[f64], model: &[f64]) -> f64 {
    mean(&truth.iter().zip(model).map(|(t, m)| (t - m).powi(2)).collect::<Vec<_>>())
}

fn mae(truth: &[f64], model: &[f64]) -> f64 {
    mean(&truth.iter().zip(model).map(|(t, m)| (t - m).abs()).collect::<Vec<_>>())
}

fn mdae(truth: &[f64], model: &[f64]) -> f64 {
    median(&truth.iter().zip(model).map(|(t, m)| (t - m).abs()).collect::<Vec<_>>())
}

/// 1 - SSres/SStot. A constant truth scores 1.0 on a perfect fit and 0.0 otherwise.
fn r2(truth: &[f64], model: &[f64]) -> f64 {
    if truth.len() < 2 { return f64::NAN }
    let m = mean(truth);
    let ss_res: f64 = truth.iter().zip(model).map(|(t, p)| (t - p).powi(2)).sum();
    let ss_tot: f64 = truth.iter().map(|t| (t - m).powi(2)).sum();
    if ss_tot == 0.0 {
        return if ss_res == 0.0 { 1.0 } else { 0.0 };
    }
    1.0 - ss_res / ss_tot
}

/// Pearson correlation; NaN if either series is constant.
fn pearson(x: &[f64], y: &[f64]) -> f64 {
    if x.len() < 2 { return f64::NAN }
    let (mx, my) = (mean(x), mean(y));
    let mut cov = 0.0;
    let mut vx = 0.0;
    let mut vy = 0.0;
    for (a, b) in x.iter().zip(y) {
        cov += (a - mx) * (b - my);
        vx += (a - mx).powi(2);
        vy += (b - my).powi(2);
    }
    if vx == 0.0 || vy == 0.0 { return f64::NAN }
    (cov / (vx.sqrt() * vy.sqrt())).clamp(-1.0, 1.0)
}

fn spearman(x: &[f64], y: &[f64]) -> f64 {
    pearson(&ranks(x), &ranks(y))
}

/// 1-based ranks, ties receiving the average of the ranks they span.
fn ranks(values: &[f64]) -> Vec<f64> {
    let mut order = (0..values.len()).collect::<Vec<_>>();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

    let mut out = vec![0.0; values.len()];
    let mut start = 0;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len() && values[order[end]] == values[order[start]] {
            end += 1;
        }
        let rank = (start + end + 1) as f64 / 2.0; // mean of start+1 ..= end
        for &i in &order[start..end] {
            out[i] = rank;
        }
        start = end;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const TRUTH: [f64; 3] = [1.0, 2.0, 3.0];
    const MODEL: [f64; 3] = [1.0, 2.0, 4.0];

    #[test]
    fn lookup_by_name_and_alias() {
        assert_eq!("mse".parse::<Metric>().unwrap(), Metric::Mse);
        assert_eq!("RMSE".parse::<Metric>().unwrap(), Metric::Rmse);
        assert_eq!("sdR".parse::<Metric>().unwrap(), Metric::SdRatio);
        assert_eq!("madR".parse::<Metric>().unwrap(), Metric::MadRatio);
        for metric in Metric::ALL {
            assert_eq!(metric.name().parse::<Metric>().unwrap(), metric);
        }
    }

    #[test]
    fn unknown_metric_lists_valid_names() {
        let err = "crps".parse::<Metric>().unwrap_err();
        match err {
            VerifyError::UnknownMetric { name, valid } => {
                assert_eq!(name, "crps");
                assert!(valid.contains("pearson"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn error_metrics() {
        assert_relative_eq!(Metric::Mse.compute(&TRUTH, &MODEL), 1.0 / 3.0);
        assert_relative_eq!(Metric::Rmse.compute(&TRUTH, &MODEL), (1.0f64 / 3.0).sqrt());
        assert_relative_eq!(Metric::Mae.compute(&TRUTH, &MODEL), 1.0 / 3.0);
        assert_relative_eq!(Metric::Mdae.compute(&TRUTH, &MODEL), 0.0);
        assert_relative_eq!(Metric::Mdae.compute(&[0.0, 0.0, 0.0, 0.0], &[1.0, 2.0, 3.0, 4.0]), 2.5);
    }

    #[test]
    fn r2_matches_definition() {
        // SSres = 1, SStot = 2
        assert_relative_eq!(Metric::R2.compute(&TRUTH, &MODEL), 0.5);
        assert_relative_eq!(Metric::R2.compute(&TRUTH, &TRUTH), 1.0);
        assert_relative_eq!(Metric::R2.compute(&[2.0, 2.0], &[2.0, 2.0]), 1.0);
        assert_relative_eq!(Metric::R2.compute(&[2.0, 2.0], &[1.0, 3.0]), 0.0);
    }

    #[test]
    fn correlations() {
        assert_relative_eq!(Metric::Pearson.compute(&TRUTH, &[2.0, 4.0, 6.0]), 1.0);
        assert_relative_eq!(Metric::Pearson.compute(&TRUTH, &[3.0, 2.0, 1.0]), -1.0);
        assert!(Metric::Pearson.compute(&TRUTH, &[5.0, 5.0, 5.0]).is_nan());
        // Monotone but non-linear: rank correlation is perfect.
        assert_relative_eq!(Metric::Spearman.compute(&TRUTH, &[1.0, 10.0, 100.0]), 1.0);
    }

    #[test]
    fn ties_share_average_rank() {
        assert_eq!(ranks(&[10.0, 20.0, 20.0, 5.0]), vec![2.0, 3.5, 3.5, 1.0]);
    }

    #[test]
    fn spread_ratios() {
        assert_relative_eq!(Metric::SdRatio.compute(&TRUTH, &[2.0, 4.0, 6.0]), 2.0);
        assert_relative_eq!(Metric::MadRatio.compute(&TRUTH, &[2.0, 4.0, 6.0]), 2.0);
        assert_relative_eq!(Metric::Variance.compute(&TRUTH, &[2.0, 4.0, 6.0]), 8.0 / 3.0);
    }

    #[test]
    fn empty_input_is_nan() {
        assert!(Metric::Mse.compute(&[], &[]).is_nan());
        assert!(Metric::Variance.compute(&[], &[]).is_nan());
    }
}
