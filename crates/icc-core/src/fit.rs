//! Gauss–Newton approximation of a sampled [`Curve`] by the seven-parameter
//! parametric form (§4.7). Unlike the rest of this crate, this module has
//! no precedent to follow in the ICC payload formats themselves — it is a
//! general-purpose numerical fit, built directly from the algorithm
//! description rather than adapted from an existing decoder.

use crate::curve::{Curve, ParametricCurve};

const MAX_ITERATIONS: usize = 8;
const BREAKPOINT_CANDIDATES: usize = 33;

/// Samples `curve` at `N` points and fits the seven-parameter parametric
/// form to them by Gauss–Newton refinement of the exponential segment,
/// with the breakpoint and linear segment chosen by an outer sweep.
///
/// Returns `None` ("unfit") if no candidate breakpoint converges to a
/// curve satisfying the post-conditions (`a > 0`, `g > 0`, finite error),
/// or if `tolerance` is given and no candidate meets it.
pub fn approximate(
    curve: &Curve<'_>,
    sample_count: usize,
    tolerance: Option<f64>,
) -> Option<(ParametricCurve, f64)> {
    let n = sample_count.max(256);
    let xs: Vec<f64> = (0..n).map(|i| i as f64 / (n - 1) as f64).collect();
    let ys: Vec<f64> = xs.iter().map(|&x| curve.eval(x)).collect();

    let mut best: Option<(ParametricCurve, f64, f64)> = None; // (curve, max_abs_error, sum_sq)

    for k in 0..BREAKPOINT_CANDIDATES {
        let d = k as f64 / (BREAKPOINT_CANDIDATES - 1) as f64;

        let Some((c, f)) = fit_linear_segment(&xs, &ys, d) else {
            continue;
        };
        let Some((g, a, b, e)) = fit_exponential_segment(&xs, &ys, d) else {
            continue;
        };
        if a <= 0.0 || g <= 0.0 {
            continue;
        }

        let candidate = ParametricCurve { g, a, b, c, d, e, f };
        if !candidate.g.is_finite()
            || !candidate.a.is_finite()
            || !candidate.b.is_finite()
            || !candidate.c.is_finite()
            || !candidate.e.is_finite()
            || !candidate.f.is_finite()
        {
            continue;
        }

        let (max_abs_error, sum_sq) = measure(&candidate, &xs, &ys);
        if !max_abs_error.is_finite() {
            continue;
        }

        let improves = best.as_ref().map(|(_, _, best_sq)| sum_sq < *best_sq).unwrap_or(true);
        if improves {
            best = Some((candidate, max_abs_error, sum_sq));
        }
    }

    let (curve, max_abs_error, _) = best?;
    if let Some(tol) = tolerance {
        if max_abs_error > tol {
            return None;
        }
    }
    Some((curve, max_abs_error))
}

/// Checks whether `fitted`'s inverse recovers every sample's input within
/// `1/512`, per spec §4.7.
pub fn are_approximate_inverses(curve: &Curve<'_>, fitted: &ParametricCurve, sample_count: usize) -> bool {
    const TOLERANCE: f64 = 1.0 / 512.0;
    let n = sample_count.max(2);
    for i in 0..n {
        let x = i as f64 / (n - 1) as f64;
        let y = curve.eval(x);
        let recovered = fitted.invert(y);
        if !recovered.is_finite() || (x - recovered).abs() > TOLERANCE {
            return false;
        }
    }
    true
}

fn measure(curve: &ParametricCurve, xs: &[f64], ys: &[f64]) -> (f64, f64) {
    let mut max_abs = 0.0f64;
    let mut sum_sq = 0.0f64;
    for (&x, &y) in xs.iter().zip(ys) {
        let model = curve.eval(x);
        let err = model - y;
        max_abs = max_abs.max(err.abs());
        sum_sq += err * err;
    }
    (max_abs, sum_sq)
}

/// Ordinary least squares fit of `y = c*x + f` on samples with `x <= d`.
fn fit_linear_segment(xs: &[f64], ys: &[f64], d: f64) -> Option<(f64, f64)> {
    let mut n = 0.0f64;
    let mut sum_x = 0.0f64;
    let mut sum_y = 0.0f64;
    let mut sum_xy = 0.0f64;
    let mut sum_xx = 0.0f64;
    for (&x, &y) in xs.iter().zip(ys) {
        if x > d {
            continue;
        }
        n += 1.0;
        sum_x += x;
        sum_y += y;
        sum_xy += x * y;
        sum_xx += x * x;
    }
    if n < 2.0 {
        return None;
    }
    let denom = n * sum_xx - sum_x * sum_x;
    let c = if denom.abs() > 1e-12 {
        (n * sum_xy - sum_x * sum_y) / denom
    } else {
        0.0
    };
    let f = (sum_y - c * sum_x) / n;
    if !c.is_finite() || !f.is_finite() {
        return None;
    }
    Some((c, f))
}

/// Gauss–Newton refinement of `(g, a, b, e)` in `y = (a*x + b)^g + e` on
/// samples with `x > d`.
fn fit_exponential_segment(xs: &[f64], ys: &[f64], d: f64) -> Option<(f64, f64, f64, f64)> {
    let points: Vec<(f64, f64)> = xs
        .iter()
        .zip(ys)
        .filter(|&(&x, _)| x > d)
        .map(|(&x, &y)| (x, y))
        .collect();
    if points.len() < 4 {
        return None;
    }

    let mut params = [2.2f64, 1.0, 0.0, 0.0]; // g, a, b, e
    let mut residual_sq = sum_sq_residual(&params, &points);
    if !residual_sq.is_finite() {
        return None;
    }

    for _ in 0..MAX_ITERATIONS {
        let Some(jtj_jtr) = gauss_newton_step(&params, &points) else {
            break;
        };
        let (jtj, jtr) = jtj_jtr;
        let Some(delta) = solve4(jtj, jtr) else {
            break;
        };

        let mut accepted = false;
        let mut step_scale = 1.0f64;
        for _ in 0..4 {
            let candidate = [
                params[0] - step_scale * delta[0],
                params[1] - step_scale * delta[1],
                params[2] - step_scale * delta[2],
                params[3] - step_scale * delta[3],
            ];
            if candidate.iter().any(|v| !v.is_finite()) {
                step_scale *= 0.5;
                continue;
            }
            let candidate_sq = sum_sq_residual(&candidate, &points);
            if candidate_sq.is_finite() && candidate_sq < residual_sq {
                params = candidate;
                residual_sq = candidate_sq;
                accepted = true;
                break;
            }
            step_scale *= 0.5;
        }
        if !accepted {
            break;
        }
    }

    let [g, a, b, e] = params;
    if !g.is_finite() || !a.is_finite() || !b.is_finite() || !e.is_finite() {
        return None;
    }
    Some((g, a, b, e))
}

fn model_at(params: &[f64; 4], x: f64) -> f64 {
    let [g, a, b, e] = *params;
    let u = a * x + b;
    if u <= 0.0 {
        return f64::NAN;
    }
    u.powf(g) + e
}

fn sum_sq_residual(params: &[f64; 4], points: &[(f64, f64)]) -> f64 {
    let mut sum = 0.0f64;
    for &(x, y) in points {
        let r = model_at(params, x) - y;
        if !r.is_finite() {
            return f64::NAN;
        }
        sum += r * r;
    }
    sum
}

/// Returns the normal-equation matrix `J^T J` (row-major 4x4) and vector
/// `J^T r` for the current parameters, or `None` if any sample falls
/// outside the model's domain (`a*x + b <= 0`).
fn gauss_newton_step(params: &[f64; 4], points: &[(f64, f64)]) -> Option<([[f64; 4]; 4], [f64; 4])> {
    let [g, a, b, _e] = *params;
    let mut jtj = [[0.0f64; 4]; 4];
    let mut jtr = [0.0f64; 4];

    for &(x, y) in points {
        let u = a * x + b;
        if u <= 0.0 {
            return None;
        }
        let u_pow_g = u.powf(g);
        let u_pow_g1 = u.powf(g - 1.0);
        let r = u_pow_g + params[3] - y;

        let dg = u_pow_g * u.ln();
        let da = g * u_pow_g1 * x;
        let db = g * u_pow_g1;
        let de = 1.0;
        let jac = [dg, da, db, de];

        if jac.iter().any(|v| !v.is_finite()) || !r.is_finite() {
            return None;
        }

        for row in 0..4 {
            jtr[row] += jac[row] * r;
            for col in 0..4 {
                jtj[row][col] += jac[row] * jac[col];
            }
        }
    }

    Some((jtj, jtr))
}

/// Solves the 4x4 linear system `m * x = v` by Gaussian elimination with
/// partial pivoting. Returns `None` if `m` is (numerically) singular.
fn solve4(mut m: [[f64; 4]; 4], mut v: [f64; 4]) -> Option<[f64; 4]> {
    for col in 0..4 {
        let pivot_row = (col..4).max_by(|&r1, &r2| m[r1][col].abs().total_cmp(&m[r2][col].abs()))?;
        if m[pivot_row][col].abs() < 1e-14 {
            return None;
        }
        m.swap(col, pivot_row);
        v.swap(col, pivot_row);

        for row in (col + 1)..4 {
            let factor = m[row][col] / m[col][col];
            for c in col..4 {
                m[row][c] -= factor * m[col][c];
            }
            v[row] -= factor * v[col];
        }
    }

    let mut x = [0.0f64; 4];
    for row in (0..4).rev() {
        let mut sum = v[row];
        for c in (row + 1)..4 {
            sum -= m[row][c] * x[c];
        }
        x[row] = sum / m[row][row];
    }
    if x.iter().any(|v| !v.is_finite()) {
        return None;
    }
    Some(x)
}

impl ParametricCurve {
    /// Inverts `y = eval(x)`, selecting the branch by comparing `y` against
    /// the curve's value at its own breakpoint.
    pub fn invert(&self, y: f64) -> f64 {
        let y_break = self.eval(self.d);
        if y >= y_break {
            let base = y - self.e;
            if base < 0.0 {
                return f64::NAN;
            }
            (base.powf(1.0 / self.g) - self.b) / self.a
        } else if self.c != 0.0 {
            (y - self.f) / self.c
        } else {
            f64::NAN
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fits_a_pure_gamma_curve() {
        let curve_fn = |x: f64| x.powf(2.2);
        let samples: Vec<u16> = (0..4096)
            .map(|i| (curve_fn(i as f64 / 4095.0) * 65535.0).round() as u16)
            .collect();
        let bytes: Vec<u8> = samples.iter().flat_map(|v| v.to_be_bytes()).collect();
        let curve = Curve::Sampled {
            data: &bytes,
            entry_count: samples.len(),
            bit_width: crate::curve::BitWidth::Sixteen,
        };

        let (fitted, max_abs_error) = approximate(&curve, 512, Some(0.02)).expect("should fit");
        assert!(fitted.a > 0.0);
        assert!(fitted.g > 0.0);
        assert!(max_abs_error <= 0.02);
    }

    #[test]
    fn identity_curve_is_approximated_by_identity_like_parameters() {
        let curve = Curve::Parametric(ParametricCurve::identity());
        let (fitted, max_abs_error) = approximate(&curve, 256, None).expect("should fit");
        assert!(max_abs_error < 1e-6);
        assert!((fitted.eval(0.5) - 0.5).abs() < 1e-3);
    }

    #[test]
    fn approximate_inverse_check_passes_for_identity() {
        let curve = Curve::Parametric(ParametricCurve::identity());
        let (fitted, _) = approximate(&curve, 256, None).expect("should fit");
        assert!(are_approximate_inverses(&curve, &fitted, 256));
    }

    #[test]
    fn solve4_recovers_identity_system() {
        let m = [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ];
        let v = [1.0, 2.0, 3.0, 4.0];
        let x = solve4(m, v).unwrap();
        assert_eq!(x, [1.0, 2.0, 3.0, 4.0]);
    }
}
