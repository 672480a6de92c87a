use glam::Vec3;
use rayon::prelude::*;

use crate::curve::bezier::CubicBezierCurve;
use crate::trajectory::filter::FilteredTrajectory;

/// Ordered curve segments for one trajectory.
///
/// A trajectory with `N` positions yields `N - 1` curves with contiguous
/// unit-width parameter domains (`[i, i + 1]` for segment `i`).
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct CurveChain {
    /// One cubic curve per consecutive vertex pair.
    pub curves: Vec<CubicBezierCurve>,
    /// Sum of all segment arc lengths.
    pub total_arc_length: f32,
}

/// Segment-length statistics accumulated across all trajectories, used to
/// derive the rolling resampling step.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SegmentStats {
    /// Mean tangent length across all segments of all trajectories.
    pub avg_length: f32,
    /// Shortest tangent length seen (0 when there are no segments).
    pub min_length: f32,
    /// Total number of segments.
    pub num_segments: u64,
}

struct SegmentAccum {
    length_sum: f64,
    min_length: f32,
    num_segments: u64,
}

/// Build one curve chain per filtered trajectory.
///
/// Per segment `v` the control points come from a Catmull-Rom-style neighbor
/// window clamped at the trajectory ends:
/// `C0 = pos1`, `C1 = pos1 + cotangent1 * len * 0.5`,
/// `C2 = pos2 - cotangent2 * len * 0.5`, `C3 = pos2`.
pub fn build_curve_chains(trajectories: &[FilteredTrajectory]) -> (Vec<CurveChain>, SegmentStats) {
    let per_trajectory: Vec<(CurveChain, SegmentAccum)> = trajectories
        .par_iter()
        .map(|trajectory| build_chain(&trajectory.positions))
        .collect();

    let mut chains = Vec::with_capacity(per_trajectory.len());
    let mut length_sum = 0.0f64;
    let mut min_length = f32::MAX;
    let mut num_segments = 0u64;
    for (chain, accum) in per_trajectory {
        length_sum += accum.length_sum;
        min_length = min_length.min(accum.min_length);
        num_segments += accum.num_segments;
        chains.push(chain);
    }

    let stats = if num_segments == 0 {
        SegmentStats {
            avg_length: 0.0,
            min_length: 0.0,
            num_segments: 0,
        }
    } else {
        SegmentStats {
            avg_length: (length_sum / num_segments as f64) as f32,
            min_length,
            num_segments,
        }
    };
    (chains, stats)
}

fn build_chain(positions: &[Vec3]) -> (CurveChain, SegmentAccum) {
    let n = positions.len();
    let num_segments = n.saturating_sub(1);
    let mut curves = Vec::with_capacity(num_segments);
    let mut accum = SegmentAccum {
        length_sum: 0.0,
        min_length: f32::MAX,
        num_segments: 0,
    };
    let mut total_arc_length = 0.0f32;

    let mut min_t = 0.0f32;
    let mut max_t = 1.0f32;
    for v in 0..num_segments {
        let pos0 = positions[v.saturating_sub(1)];
        let pos1 = positions[v];
        let pos2 = positions[v + 1];
        let pos3 = positions[(v + 2).min(n - 1)];

        let cotangent1 = (pos2 - pos0).normalize_or_zero();
        let cotangent2 = (pos3 - pos1).normalize_or_zero();
        let mut tangent_len = (pos2 - pos1).length();
        if tangent_len.is_nan() {
            tracing::warn!(segment = v, "NaN tangent length in curve segment, clamping to 0");
            tangent_len = 0.0;
        }

        accum.length_sum += f64::from(tangent_len);
        accum.min_length = accum.min_length.min(tangent_len);
        accum.num_segments += 1;

        let c0 = pos1;
        let c1 = pos1 + cotangent1 * tangent_len * 0.5;
        let c2 = pos2 - cotangent2 * tangent_len * 0.5;
        let c3 = pos2;

        let curve = CubicBezierCurve::new([c0, c1, c2, c3], min_t, max_t);
        total_arc_length += curve.total_arc_length;
        curves.push(curve);

        min_t += 1.0;
        max_t += 1.0;
    }

    (
        CurveChain {
            curves,
            total_arc_length,
        },
        accum,
    )
}

#[cfg(test)]
#[path = "../../tests/unit/curve/chain.rs"]
mod tests;
