//! Numeric reductions shared by the detectors.
//!
//! Everything here is a pure function over `f64` slices. Conventions match
//! the detectors' contracts: population vs. sample standard deviation are
//! separate functions, percentile interpolates linearly between order
//! statistics, and the exponentially-weighted moments follow the
//! adjusted-weights / unbiased-variance convention.

/// Arithmetic mean. NaN on an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation (divide by n). NaN on an empty slice.
pub fn stddev(values: &[f64]) -> f64 {
    let m = mean(values);
    let var = values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / values.len() as f64;
    var.sqrt()
}

/// Sample standard deviation (divide by n-1). NaN for fewer than two values.
pub fn sample_stddev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return f64::NAN;
    }
    let m = mean(values);
    let var = values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / (values.len() - 1) as f64;
    var.sqrt()
}

/// Median: middle order statistic, averaging the two middles for even n.
pub fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let n = sorted.len();
    if n == 0 {
        return f64::NAN;
    }
    if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    }
}

/// Percentile in [0, 100] with linear interpolation between order statistics.
pub fn percentile(values: &[f64], pct: f64) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let n = sorted.len();
    if n == 0 {
        return f64::NAN;
    }
    if n == 1 {
        return sorted[0];
    }
    let rank = pct / 100.0 * (n - 1) as f64;
    let lo = rank.floor() as usize;
    let frac = rank - lo as f64;
    if lo + 1 >= n {
        return sorted[n - 1];
    }
    sorted[lo] + frac * (sorted[lo + 1] - sorted[lo])
}

/// Exponentially-weighted moving mean and standard deviation.
///
/// `com` is the center of mass; the decay factor is `1 - 1/(1 + com)`.
/// Weights are adjusted (each prefix is renormalized over the full weight
/// sum) and the variance carries the unbiased weighted correction, so the
/// stddev of the first point is NaN.
pub fn ewm_mean_std(values: &[f64], com: f64) -> (Vec<f64>, Vec<f64>) {
    let n = values.len();
    let alpha = 1.0 / (1.0 + com);
    let decay = 1.0 - alpha;

    let mut means = Vec::with_capacity(n);
    let mut stds = Vec::with_capacity(n);

    for t in 0..n {
        let mut w_sum = 0.0;
        let mut w_sq_sum = 0.0;
        let mut weighted = 0.0;
        for i in 0..=t {
            let w = decay.powi((t - i) as i32);
            w_sum += w;
            w_sq_sum += w * w;
            weighted += w * values[i];
        }
        let m = weighted / w_sum;
        means.push(m);

        let denom = w_sum * w_sum - w_sq_sum;
        if denom <= 0.0 {
            stds.push(f64::NAN);
            continue;
        }
        let mut dev = 0.0;
        for i in 0..=t {
            let w = decay.powi((t - i) as i32);
            let d = values[i] - m;
            dev += w * d * d;
        }
        let var = (w_sum * w_sum / denom) * (dev / w_sum);
        stds.push(var.sqrt());
    }

    (means, stds)
}

/// Ordinary least-squares fit of y on x. Returns (slope, intercept).
/// A degenerate x column (zero variance) yields a horizontal fit.
pub fn ols_fit(x: &[f64], y: &[f64]) -> (f64, f64) {
    let mx = mean(x);
    let my = mean(y);
    let mut sxx = 0.0;
    let mut sxy = 0.0;
    for (xi, yi) in x.iter().zip(y) {
        sxx += (xi - mx) * (xi - mx);
        sxy += (xi - mx) * (yi - my);
    }
    if sxx == 0.0 {
        return (0.0, my);
    }
    let slope = sxy / sxx;
    (slope, my - slope * mx)
}

// ── Student-t inverse survival function ───────────────────────────

/// Lanczos approximation of ln(Gamma(x)) for x > 0.
fn ln_gamma(x: f64) -> f64 {
    const COEFFS: [f64; 6] = [
        76.18009172947146,
        -86.50532032941677,
        24.01409824083091,
        -1.231739572450155,
        0.1208650973866179e-2,
        -0.5395239384953e-5,
    ];
    let mut ser = 1.000000000190015;
    let mut denom = x;
    for c in COEFFS {
        denom += 1.0;
        ser += c / denom;
    }
    let tmp = x + 5.5;
    (x + 0.5) * tmp.ln() - tmp + (2.5066282746310005 * ser / x).ln()
}

/// Continued-fraction evaluation for the incomplete beta function.
fn betacf(a: f64, b: f64, x: f64) -> f64 {
    const MAX_ITER: usize = 200;
    const EPS: f64 = 3.0e-14;
    const FPMIN: f64 = 1.0e-300;

    let qab = a + b;
    let qap = a + 1.0;
    let qam = a - 1.0;
    let mut c = 1.0;
    let mut d = 1.0 - qab * x / qap;
    if d.abs() < FPMIN {
        d = FPMIN;
    }
    d = 1.0 / d;
    let mut h = d;
    for m in 1..=MAX_ITER {
        let m = m as f64;
        let m2 = 2.0 * m;
        let aa = m * (b - m) * x / ((qam + m2) * (a + m2));
        d = 1.0 + aa * d;
        if d.abs() < FPMIN {
            d = FPMIN;
        }
        c = 1.0 + aa / c;
        if c.abs() < FPMIN {
            c = FPMIN;
        }
        d = 1.0 / d;
        h *= d * c;
        let aa = -(a + m) * (qab + m) * x / ((a + m2) * (qap + m2));
        d = 1.0 + aa * d;
        if d.abs() < FPMIN {
            d = FPMIN;
        }
        c = 1.0 + aa / c;
        if c.abs() < FPMIN {
            c = FPMIN;
        }
        d = 1.0 / d;
        let delta = d * c;
        h *= delta;
        if (delta - 1.0).abs() < EPS {
            break;
        }
    }
    h
}

/// Regularized incomplete beta function I_x(a, b).
fn incomplete_beta(a: f64, b: f64, x: f64) -> f64 {
    if x <= 0.0 {
        return 0.0;
    }
    if x >= 1.0 {
        return 1.0;
    }
    let bt = (ln_gamma(a + b) - ln_gamma(a) - ln_gamma(b) + a * x.ln() + b * (1.0 - x).ln()).exp();
    if x < (a + 1.0) / (a + b + 2.0) {
        bt * betacf(a, b, x) / a
    } else {
        1.0 - bt * betacf(b, a, 1.0 - x) / b
    }
}

/// Upper-tail probability P(T > t) for the Student-t distribution.
fn students_t_sf(t: f64, df: f64) -> f64 {
    let x = df / (df + t * t);
    let tail = 0.5 * incomplete_beta(df / 2.0, 0.5, x);
    if t >= 0.0 {
        tail
    } else {
        1.0 - tail
    }
}

/// Inverse survival function of the Student-t distribution: the t with
/// P(T > t) = q, for q in (0, 0.5] and df > 0. Solved by bisection on the
/// survival function, which is strictly decreasing in t.
pub fn students_t_isf(q: f64, df: f64) -> f64 {
    let mut lo = 0.0;
    let mut hi = 2.0;
    while students_t_sf(hi, df) > q {
        hi *= 2.0;
        if hi > 1.0e12 {
            break;
        }
    }
    for _ in 0..200 {
        let mid = 0.5 * (lo + hi);
        if students_t_sf(mid, df) > q {
            lo = mid;
        } else {
            hi = mid;
        }
        if hi - lo < 1.0e-12 * hi.max(1.0) {
            break;
        }
    }
    0.5 * (lo + hi)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() <= tol
    }

    #[test]
    fn mean_and_stddev_flavors() {
        let v = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_eq!(mean(&v), 5.0);
        assert!(close(stddev(&v), 2.0, 1e-12));
        assert!(close(sample_stddev(&v), 2.13809, 1e-5));
        assert!(sample_stddev(&[3.0]).is_nan());
    }

    #[test]
    fn median_odd_and_even() {
        assert_eq!(median(&[3.0, 1.0, 2.0]), 2.0);
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), 2.5);
    }

    #[test]
    fn percentile_interpolates_linearly() {
        let v = [1.0, 2.0, 3.0, 4.0];
        assert!(close(percentile(&v, 25.0), 1.75, 1e-12));
        assert!(close(percentile(&v, 75.0), 3.25, 1e-12));
        assert!(close(percentile(&v, 0.0), 1.0, 1e-12));
        assert!(close(percentile(&v, 100.0), 4.0, 1e-12));
        assert_eq!(percentile(&[7.0], 50.0), 7.0);
    }

    #[test]
    fn ewm_matches_adjusted_unbiased_convention() {
        let (means, stds) = ewm_mean_std(&[1.0, 2.0, 3.0], 1.0);
        assert!(close(means[0], 1.0, 1e-12));
        assert!(close(means[1], 5.0 / 3.0, 1e-12));
        assert!(close(means[2], 2.428571, 1e-6));
        assert!(stds[0].is_nan());
        assert!(close(stds[1], 0.707107, 1e-6));
        assert!(close(stds[2], 0.963624, 1e-6));

        // Two points: unbiased weighted std collapses to the sample std.
        let (_, stds) = ewm_mean_std(&[0.0, 10.0], 1.0);
        assert!(close(stds[1], 7.071068, 1e-6));
    }

    #[test]
    fn ols_fits_exact_line() {
        let x = [1.0, 2.0, 3.0, 4.0];
        let y = [3.0, 5.0, 7.0, 9.0];
        let (m, c) = ols_fit(&x, &y);
        assert!(close(m, 2.0, 1e-12));
        assert!(close(c, 1.0, 1e-12));

        let (m, c) = ols_fit(&[2.0, 2.0, 2.0], &[1.0, 2.0, 3.0]);
        assert_eq!(m, 0.0);
        assert_eq!(c, 2.0);
    }

    #[test]
    fn t_isf_matches_table_values() {
        assert!(close(students_t_isf(0.025, 10.0), 2.228139, 1e-4));
        assert!(close(students_t_isf(0.05, 5.0), 2.015048, 1e-4));
        assert!(close(students_t_isf(0.005, 30.0), 2.750000, 1e-4));
        assert!(close(students_t_isf(0.05, 1.0), 6.313752, 1e-3));
    }
}
