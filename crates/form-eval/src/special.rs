//! Special functions and order statistics used by the evaluators.

use std::f64::consts::PI;

const LANCZOS_G: f64 = 7.0;
const LANCZOS: [f64; 9] = [
    0.999_999_999_999_809_9,
    676.520_368_121_885_1,
    -1_259.139_216_722_402_8,
    771.323_428_777_653_1,
    -176.615_029_162_140_6,
    12.507_343_278_686_905,
    -0.138_571_095_265_720_12,
    9.984_369_578_019_572e-6,
    1.505_632_735_149_311_6e-7,
];

/// Natural log of the gamma function (Lanczos approximation).
pub fn ln_gamma(x: f64) -> f64 {
    if x < 0.5 {
        return (PI / (PI * x).sin()).ln() - ln_gamma(1.0 - x);
    }
    let x = x - 1.0;
    let mut acc = LANCZOS[0];
    for (i, coef) in LANCZOS.iter().enumerate().skip(1) {
        acc += coef / (x + i as f64);
    }
    let t = x + LANCZOS_G + 0.5;
    0.5 * (2.0 * PI).ln() + (x + 0.5) * t.ln() - t + acc.ln()
}

/// Regularised lower incomplete gamma `P(a, x)`.
pub fn regularized_gamma_p(a: f64, x: f64) -> f64 {
    if x <= 0.0 {
        return 0.0;
    }
    if !x.is_finite() {
        return 1.0;
    }
    if x < a + 1.0 {
        let mut term = 1.0 / a;
        let mut sum = term;
        let mut denom = a;
        for _ in 0..500 {
            denom += 1.0;
            term *= x / denom;
            sum += term;
            if term.abs() < sum.abs() * 1e-15 {
                break;
            }
        }
        (sum.ln() + a * x.ln() - x - ln_gamma(a)).exp().clamp(0.0, 1.0)
    } else {
        // Lentz continued fraction for Q(a, x).
        let tiny = 1e-300;
        let mut b = x + 1.0 - a;
        let mut c = 1.0 / tiny;
        let mut d = 1.0 / b;
        let mut h = d;
        for i in 1..500 {
            let an = -(i as f64) * (i as f64 - a);
            b += 2.0;
            d = an * d + b;
            if d.abs() < tiny {
                d = tiny;
            }
            c = b + an / c;
            if c.abs() < tiny {
                c = tiny;
            }
            d = 1.0 / d;
            let delta = d * c;
            h *= delta;
            if (delta - 1.0).abs() < 1e-15 {
                break;
            }
        }
        let q = (a * x.ln() - x - ln_gamma(a)).exp() * h;
        (1.0 - q).clamp(0.0, 1.0)
    }
}

/// Chi-square CDF with `dof` degrees of freedom.
pub fn chi2_cdf(x: f64, dof: usize) -> f64 {
    regularized_gamma_p(dof as f64 / 2.0, x / 2.0)
}

/// Wilson-Hilferty approximation of the chi-square median.
pub fn chi2_median(dof: usize) -> f64 {
    let k = dof as f64;
    k * (1.0 - 2.0 / (9.0 * k)).powi(3)
}

/// Logistic function.
pub fn sigmoid(x: f64) -> f64 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}

/// Share of `reference` values greater than or equal to `value`.
///
/// Used to turn "higher is more anomalous" scores into typicality.
pub fn upper_tail_share(reference: &[f64], value: f64) -> f64 {
    if reference.is_empty() {
        return 0.0;
    }
    let count = reference.iter().filter(|r| **r >= value).count();
    count as f64 / reference.len() as f64
}

/// Median of a sample; zero when empty.
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Sample standard deviation; zero below two values.
pub fn std_dev(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / n as f64;
    (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64).sqrt()
}

/// Euclidean distance.
pub fn euclidean(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y).powi(2))
        .sum::<f64>()
        .sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ln_gamma_matches_factorials() {
        assert!((ln_gamma(1.0)).abs() < 1e-12);
        assert!((ln_gamma(5.0) - 24f64.ln()).abs() < 1e-10);
        assert!((ln_gamma(0.5) - PI.sqrt().ln()).abs() < 1e-10);
    }

    #[test]
    fn chi2_cdf_known_values() {
        // P(chi2_1 <= 3.841) = 0.95
        assert!((chi2_cdf(3.841_458_820_694_124, 1) - 0.95).abs() < 1e-6);
        // P(chi2_2 <= x) = 1 - exp(-x/2)
        assert!((chi2_cdf(2.0, 2) - (1.0 - (-1.0f64).exp())).abs() < 1e-10);
        // P(chi2_4 <= x) = 1 - exp(-x/2)(1 + x/2)
        assert!((chi2_cdf(30.0, 4) - (1.0 - (-15.0f64).exp() * 16.0)).abs() < 1e-9);
        assert_eq!(chi2_cdf(0.0, 3), 0.0);
    }

    #[test]
    fn tail_share_counts_ties() {
        let reference = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(upper_tail_share(&reference, 2.0), 0.75);
        assert_eq!(upper_tail_share(&reference, 10.0), 0.0);
        assert_eq!(upper_tail_share(&reference, -1.0), 1.0);
    }

    #[test]
    fn median_of_even_sample() {
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), 2.5);
    }
}
