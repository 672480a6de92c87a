use glam::Vec3;
use rayon::prelude::*;

use crate::curve::chain::CurveChain;
use crate::stats::{ChannelStats, EnsembleStats, LineDescriptor, VarDescriptor};
use crate::trajectory::filter::{FilteredTrajectory, IndexMap};

/// The round-robin never rolls over more channels than this; with more
/// variables the rolling step would shrink below useful vertex spacing.
pub const MAX_ROLLING_CHANNELS: usize = 8;

/// Minimum useful rolling step in world units. Ensembles with shorter
/// average segments either force this step or reset the round-robin per
/// curve segment, depending on [`ResamplePolicy`].
pub const MIN_ROLL_SEG_LENGTH: f32 = 0.1;

/// Channel id emitted when a vertex has no variable assigned (the
/// round-robin index ran past the channel count within one segment).
pub const UNASSIGNED_CHANNEL_ID: f32 = -1.0;

/// Role of each of the nine per-vertex output attribute streams.
///
/// Replaces the positional 0..8 attribute indexing of GPU-side layouts with
/// named roles; [`VertexChannels::stream`] maps a role back to its values.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ChannelRole {
    /// The scalar value of the vertex's assigned variable.
    Value,
    /// Global minimum of the assigned variable.
    ChannelMin,
    /// Global maximum of the assigned variable.
    ChannelMax,
    /// Index of the assigned variable, or [`UNASSIGNED_CHANNEL_ID`].
    ChannelId,
    /// Curve-segment index the vertex was sampled from.
    ElementIndex,
    /// Index of the line the vertex belongs to.
    LineId,
    /// Clamped index of the following segment, for shader-side lookahead.
    NextLineId,
    /// Curve-local normalized parameter in `[0, 1]`.
    NormalizedT,
    /// Continuous time proxy: `segment_index + normalized_t`.
    TimestepIndex,
}

impl ChannelRole {
    /// All roles in output-stream order.
    pub const ALL: [ChannelRole; 9] = [
        ChannelRole::Value,
        ChannelRole::ChannelMin,
        ChannelRole::ChannelMax,
        ChannelRole::ChannelId,
        ChannelRole::ElementIndex,
        ChannelRole::LineId,
        ChannelRole::NextLineId,
        ChannelRole::NormalizedT,
        ChannelRole::TimestepIndex,
    ];
}

/// The nine named per-vertex attribute streams, kept as separate arrays the
/// way the renderer uploads them.
#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct VertexChannels {
    /// Assigned variable's value (0 when unassigned).
    pub value: Vec<f32>,
    /// Assigned variable's global minimum.
    pub channel_min: Vec<f32>,
    /// Assigned variable's global maximum.
    pub channel_max: Vec<f32>,
    /// Assigned variable index or [`UNASSIGNED_CHANNEL_ID`].
    pub channel_id: Vec<f32>,
    /// Source curve-segment index.
    pub element_index: Vec<f32>,
    /// Line index.
    pub line_id: Vec<f32>,
    /// Clamped next segment index.
    pub next_line_id: Vec<f32>,
    /// Curve-local normalized parameter.
    pub normalized_t: Vec<f32>,
    /// `segment_index + normalized_t`.
    pub timestep_index: Vec<f32>,
}

impl VertexChannels {
    /// Number of vertices (all streams share this length).
    pub fn len(&self) -> usize {
        self.value.len()
    }

    /// Whether no vertices have been emitted.
    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    /// The values of one stream by role.
    pub fn stream(&self, role: ChannelRole) -> &[f32] {
        match role {
            ChannelRole::Value => &self.value,
            ChannelRole::ChannelMin => &self.channel_min,
            ChannelRole::ChannelMax => &self.channel_max,
            ChannelRole::ChannelId => &self.channel_id,
            ChannelRole::ElementIndex => &self.element_index,
            ChannelRole::LineId => &self.line_id,
            ChannelRole::NextLineId => &self.next_line_id,
            ChannelRole::NormalizedT => &self.normalized_t,
            ChannelRole::TimestepIndex => &self.timestep_index,
        }
    }
}

/// Caller-supplied resampling policy.
///
/// `needs_subdivision` decides what happens when the ensemble's average
/// segment length drops below [`MIN_ROLL_SEG_LENGTH`]: force the step up to
/// that minimum (`true`, the default) or keep the small step and restart the
/// channel round-robin at every curve segment (`false`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ResamplePolicy {
    /// See type-level docs.
    pub needs_subdivision: bool,
}

impl Default for ResamplePolicy {
    fn default() -> Self {
        Self {
            needs_subdivision: true,
        }
    }
}

/// One resampled polyline with its packed-buffer bookkeeping.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct ResampledTrajectory {
    /// Arc-length-uniform vertex positions.
    pub positions: Vec<Vec3>,
    /// The nine per-vertex attribute streams.
    pub channels: VertexChannels,
    /// This line's slice of the flat packed buffer.
    pub line_desc: LineDescriptor,
    /// Per-channel descriptors within the line's slice.
    pub var_descs: Vec<VarDescriptor>,
    /// This line's packed channel values.
    pub multi_var_data: Vec<f32>,
}

impl ResampledTrajectory {
    /// Approximate heap footprint, for cache budgeting by the owner.
    pub fn memory_size_bytes(&self) -> usize {
        self.positions.len() * size_of::<Vec3>()
            + ChannelRole::ALL.len() * self.channels.len() * size_of::<f32>()
            + self.multi_var_data.len() * size_of::<f32>()
            + self.var_descs.len() * size_of::<VarDescriptor>()
    }
}

/// The owned result of one pipeline run: all resampled lines plus the
/// ensemble-wide bookkeeping the renderer needs.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct ResampledTrajectories {
    /// One entry per retained trajectory, in filtered order.
    pub trajectories: Vec<ResampledTrajectory>,
    /// Original-to-filtered index bookkeeping.
    pub index_map: IndexMap,
    /// Global per-channel ranges for color-map normalization.
    pub global_stats: Vec<ChannelStats>,
    /// Number of scalar channels encoded along each line.
    pub num_channels: usize,
}

impl ResampledTrajectories {
    /// Approximate heap footprint, for cache budgeting by the owner.
    pub fn memory_size_bytes(&self) -> usize {
        self.trajectories
            .iter()
            .map(ResampledTrajectory::memory_size_bytes)
            .sum::<usize>()
            + self.index_map.len() * size_of::<Option<usize>>()
            + self.global_stats.len() * size_of::<ChannelStats>()
    }
}

/// Arc-length step configuration resolved from segment statistics.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct RollStep {
    pub(crate) length: f32,
    pub(crate) reset_per_segment: bool,
}

pub(crate) fn resolve_roll_step(
    avg_seg_length: f32,
    num_channels: usize,
    policy: &ResamplePolicy,
) -> RollStep {
    let divisor = num_channels.clamp(1, MAX_ROLLING_CHANNELS) as f32;
    let mut length = avg_seg_length / divisor;
    let mut reset_per_segment = false;
    if avg_seg_length < MIN_ROLL_SEG_LENGTH {
        if policy.needs_subdivision {
            length = length.max(MIN_ROLL_SEG_LENGTH);
        } else {
            reset_per_segment = true;
        }
    }
    RollStep {
        length,
        reset_per_segment,
    }
}

/// Resample every trajectory's curve chain at an approximately fixed
/// arc-length step, interleaving the scalar channels round-robin.
///
/// Requires the statistics pass to have completed: every emitted vertex
/// embeds its channel's global min/max.
pub(crate) fn resample_trajectories(
    trajectories: &[FilteredTrajectory],
    chains: &[CurveChain],
    stats: &EnsembleStats,
    num_channels: usize,
    step: RollStep,
) -> Vec<ResampledTrajectory> {
    trajectories
        .par_iter()
        .zip(chains.par_iter())
        .enumerate()
        .map(|(line, (trajectory, chain))| {
            resample_one(trajectory, chain, stats, num_channels, line, step)
        })
        .collect()
}

struct VertexSample {
    value: f32,
    channel_min: f32,
    channel_max: f32,
    channel_id: f32,
    segment: usize,
    line: usize,
    next_segment: usize,
    normalized_t: f32,
}

fn push_vertex(channels: &mut VertexChannels, sample: VertexSample) {
    channels.value.push(sample.value);
    channels.channel_min.push(sample.channel_min);
    channels.channel_max.push(sample.channel_max);
    channels.channel_id.push(sample.channel_id);
    channels.element_index.push(sample.segment as f32);
    channels.line_id.push(sample.line as f32);
    channels.next_line_id.push(sample.next_segment as f32);
    channels.normalized_t.push(sample.normalized_t);
    channels
        .timestep_index
        .push(sample.segment as f32 + sample.normalized_t);
}

fn resample_one(
    trajectory: &FilteredTrajectory,
    chain: &CurveChain,
    stats: &EnsembleStats,
    num_channels: usize,
    line: usize,
    step: RollStep,
) -> ResampledTrajectory {
    let curves = &chain.curves;
    let num_curves = curves.len();
    let mut positions = Vec::new();
    let mut channels = VertexChannels::default();

    if num_curves > 0 {
        // Vertex 0 sits at the start of the first curve and always carries
        // channel 0.
        let first = &curves[0];
        let (pos, _) = first.evaluate(first.min_t);
        positions.push(pos);
        push_vertex(
            &mut channels,
            VertexSample {
                value: trajectory.attributes[0][0],
                channel_min: stats.global[0].min,
                channel_max: stats.global[0].max,
                channel_id: 0.0,
                segment: 0,
                line,
                next_segment: 0,
                normalized_t: 0.0,
            },
        );

        let mut cur_arc_length = step.length;
        let mut channel = 1usize;
        let mut segment = 0usize;
        let mut sum_arc_lengths = 0.0f32;
        let mut sum_arc_lengths_next = first.total_arc_length;

        while cur_arc_length <= chain.total_arc_length {
            // Advance to the curve segment whose cumulative arc length
            // covers the running target.
            while sum_arc_lengths_next <= cur_arc_length {
                if step.reset_per_segment {
                    channel = 0;
                }
                segment += 1;
                if segment >= num_curves {
                    break;
                }
                sum_arc_lengths = sum_arc_lengths_next;
                sum_arc_lengths_next += curves[segment].total_arc_length;
            }
            if segment >= num_curves {
                break;
            }

            let curve = &curves[segment];
            let t = curve
                .solve_t_for_arc_length(cur_arc_length - sum_arc_lengths)
                .clamp(curve.min_t, curve.max_t);
            let (pos, _) = curve.evaluate(t);
            positions.push(pos);

            let (value, channel_min, channel_max, channel_id) = if channel < num_channels {
                (
                    trajectory.attributes[channel][segment],
                    stats.global[channel].min,
                    stats.global[channel].max,
                    channel as f32,
                )
            } else {
                (0.0, 0.0, 0.0, UNASSIGNED_CHANNEL_ID)
            };
            push_vertex(
                &mut channels,
                VertexSample {
                    value,
                    channel_min,
                    channel_max,
                    channel_id,
                    segment,
                    line,
                    next_segment: (segment + 1).min(num_curves - 1),
                    normalized_t: curve.normalize_t(t),
                },
            );

            cur_arc_length += step.length;
            channel = if step.reset_per_segment {
                channel + 1
            } else {
                (channel + 1) % num_channels
            };
        }
    }

    ResampledTrajectory {
        positions,
        channels,
        line_desc: stats.line_descs[line],
        var_descs: stats.var_descs[line].clone(),
        multi_var_data: stats.multi_var_data[line].clone(),
    }
}

#[cfg(test)]
#[path = "../tests/unit/resample.rs"]
mod tests;
