use glam::Vec3;

/// Number of samples used for the composite trapezoidal arc-length
/// integration.
pub const ARC_LENGTH_STEPS: u16 = 20;

/// Iteration budget for the hybrid arc-length inversion.
const SOLVER_MAX_ITERATIONS: u32 = 20;

/// Absolute arc-length tolerance for the hybrid inversion.
const SOLVER_TOLERANCE: f32 = 1e-5;

/// A cubic Bezier curve over a unit-width parameter domain `[min_t, max_t]`.
///
/// Chains of these curves use contiguous domains (`[i, i + 1]` for segment
/// `i`) so a global parameter doubles as "segment index + local fraction".
/// The total arc length is integrated once at construction and cached.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CubicBezierCurve {
    /// The four control points.
    pub control_points: [Vec3; 4],
    /// Lower bound of the parameter domain.
    pub min_t: f32,
    /// Upper bound of the parameter domain (`min_t + 1`).
    pub max_t: f32,
    /// Cached arc length of the whole curve, `>= 0`.
    pub total_arc_length: f32,
}

impl CubicBezierCurve {
    /// Build a curve and integrate its total arc length.
    ///
    /// A NaN arc length (malformed control points) clamps to 0, turning the
    /// curve into a zero-length segment instead of poisoning the chain.
    pub fn new(control_points: [Vec3; 4], min_t: f32, max_t: f32) -> Self {
        debug_assert!(min_t < max_t);
        let mut curve = Self {
            control_points,
            min_t,
            max_t,
            total_arc_length: 0.0,
        };
        let length = curve.arc_length(min_t, max_t, ARC_LENGTH_STEPS);
        curve.total_arc_length = if length.is_nan() { 0.0 } else { length };
        curve
    }

    /// Whether `t` lies within the parameter domain.
    pub fn contains(&self, t: f32) -> bool {
        self.min_t <= t && t <= self.max_t
    }

    /// Evaluate position and unnormalized tangent at `t` via De Casteljau's
    /// algorithm (repeated linear interpolation of the control points).
    ///
    /// Precondition: `min_t <= t <= max_t`.
    pub fn evaluate(&self, t: f32) -> (Vec3, Vec3) {
        debug_assert!(self.contains(t));
        let tn = self.normalize_t(t);
        let [p0, p1, p2, p3] = self.control_points;
        let q0 = p0.lerp(p1, tn);
        let q1 = p1.lerp(p2, tn);
        let q2 = p2.lerp(p3, tn);
        let r0 = q0.lerp(q1, tn);
        let r1 = q1.lerp(q2, tn);
        let position = r0.lerp(r1, tn);
        let tangent = 3.0 * (r1 - r0);
        (position, tangent)
    }

    /// Unnormalized curve derivative at `t`.
    pub fn derivative(&self, t: f32) -> Vec3 {
        self.evaluate(t).1
    }

    /// Numerically integrate `|derivative|` over `[t_from, t_to]` with the
    /// composite trapezoidal rule using `steps` samples (at least 2).
    ///
    /// Both bounds clamp to the parameter domain; the integration never
    /// extrapolates.
    pub fn arc_length(&self, t_from: f32, t_to: f32, steps: u16) -> f32 {
        let t_from = t_from.clamp(self.min_t, self.max_t);
        let t_to = t_to.clamp(self.min_t, self.max_t);
        let n = usize::from(steps.max(2));
        let h = (t_to - t_from) / (n as f32 - 1.0);

        let mut sum = 0.5 * (self.derivative(t_from).length() + self.derivative(t_to).length());
        for i in 1..n - 1 {
            sum += self.derivative(t_from + h * i as f32).length();
        }
        sum * h
    }

    /// Invert arc length to a curve parameter.
    ///
    /// Hybrid Newton-Raphson/bisection (Eberly): a Newton step that would
    /// leave the current bracket falls back to the bracket midpoint, and the
    /// bracket narrows on the sign of the residual, so convergence stays
    /// monotone even where the curve speed is near zero. If the iteration
    /// budget runs out, the best bracket midpoint is returned with a warning.
    ///
    /// Precondition: `0 <= target_length <= total_arc_length`; the target is
    /// clamped to that range.
    pub fn solve_t_for_arc_length(&self, target_length: f32) -> f32 {
        // Coincident start/end control points give zero speed everywhere;
        // any parameter maps to the same position.
        if self.total_arc_length <= 0.0 {
            return self.min_t;
        }
        let target = target_length.clamp(0.0, self.total_arc_length);

        let mut t = self.min_t + (self.max_t - self.min_t) * (target / self.total_arc_length);
        let mut lower = self.min_t;
        let mut upper = self.max_t;

        for _ in 0..SOLVER_MAX_ITERATIONS {
            let residual = self.arc_length(self.min_t, t, ARC_LENGTH_STEPS) - target;
            if residual.abs() <= SOLVER_TOLERANCE {
                return t;
            }
            if residual > 0.0 {
                upper = t;
            } else {
                lower = t;
            }

            // dC/dt is the curve speed, always >= 0.
            let speed = self.derivative(t).length();
            let newton = t - residual / speed;
            t = if newton.is_finite() && lower < newton && newton < upper {
                newton
            } else {
                0.5 * (lower + upper)
            };
        }

        tracing::warn!(
            target = target,
            "arc-length inversion did not converge, using bracket midpoint"
        );
        0.5 * (lower + upper)
    }

    /// Affine map from `[min_t, max_t]` to `[0, 1]`.
    pub fn normalize_t(&self, t: f32) -> f32 {
        (t - self.min_t) / (self.max_t - self.min_t)
    }

    /// Affine map from `[0, 1]` back to `[min_t, max_t]`; exact inverse of
    /// [`CubicBezierCurve::normalize_t`].
    pub fn denormalize_t(&self, tn: f32) -> f32 {
        tn * (self.max_t - self.min_t) + self.min_t
    }
}

#[cfg(test)]
#[path = "../../tests/unit/curve/bezier.rs"]
mod tests;
