use rayon::prelude::*;

use crate::foundation::error::{RollvarError, RollvarResult};
use crate::trajectory::filter::FilteredTrajectory;

/// Running `(min, max)` pair for one scalar channel. NaN values are ignored.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ChannelStats {
    /// Smallest observed value.
    pub min: f32,
    /// Largest observed value.
    pub max: f32,
}

impl ChannelStats {
    /// An empty range that any observed value will replace.
    pub fn empty() -> Self {
        Self {
            min: f32::MAX,
            max: f32::MIN,
        }
    }

    /// Fold one value into the range (`f32::min`/`f32::max` drop NaN).
    pub fn update(&mut self, value: f32) {
        self.min = self.min.min(value);
        self.max = self.max.max(value);
    }

    /// Merge another range into this one.
    pub fn merge(&mut self, other: Self) {
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
    }
}

/// Locates one line's slice of the flat packed value buffer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct LineDescriptor {
    /// First value of this line in the flat buffer.
    pub start_index: u32,
    /// Number of values this line contributes (all channels).
    pub num_values: u32,
}

/// Locates one channel's slice within a line, plus the line-local value
/// range the renderer uses for per-line normalization.
///
/// `start_index` is an `f32` because the renderer consumes the descriptor
/// table as a float buffer.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct VarDescriptor {
    /// Offset of the channel's first value within the line's slice.
    pub start_index: f32,
    /// Per-line `(min, max)` of the channel.
    pub min_max: (f32, f32),
}

/// Output of the statistics pass over a filtered ensemble.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct EnsembleStats {
    /// Global per-channel range across all trajectories.
    pub global: Vec<ChannelStats>,
    /// Per-line per-channel ranges, `[line][channel]`.
    pub per_line: Vec<Vec<ChannelStats>>,
    /// Per line: every channel's values concatenated in channel order.
    pub multi_var_data: Vec<Vec<f32>>,
    /// One descriptor per line into the concatenation of `multi_var_data`.
    pub line_descs: Vec<LineDescriptor>,
    /// Per-line per-channel descriptors, `[line][channel]`.
    pub var_descs: Vec<Vec<VarDescriptor>>,
}

/// Compute global and per-line channel ranges and build the packed value
/// buffer with its descriptor tables.
///
/// Fails with [`RollvarError::EmptyChannelSet`] when the ensemble exposes no
/// scalar channels at all; that is a configuration error for the whole
/// request, not a per-trajectory defect.
pub fn compute_ensemble_stats(
    trajectories: &[FilteredTrajectory],
    num_channels: usize,
) -> RollvarResult<EnsembleStats> {
    if num_channels == 0 {
        return Err(RollvarError::EmptyChannelSet);
    }

    struct LineStats {
        per_channel: Vec<ChannelStats>,
        packed: Vec<f32>,
        var_descs: Vec<VarDescriptor>,
        num_values: u32,
    }

    let lines: Vec<LineStats> = trajectories
        .par_iter()
        .map(|trajectory| {
            let mut per_channel = vec![ChannelStats::empty(); num_channels];
            let mut packed = Vec::new();
            let mut var_descs = Vec::with_capacity(num_channels);
            let mut offset = 0u32;
            for (channel, values) in trajectory.attributes.iter().enumerate() {
                let stats = &mut per_channel[channel];
                for &value in values {
                    stats.update(value);
                    packed.push(value);
                }
                var_descs.push(VarDescriptor {
                    start_index: offset as f32,
                    min_max: (stats.min, stats.max),
                });
                offset += values.len() as u32;
            }
            LineStats {
                per_channel,
                packed,
                var_descs,
                num_values: offset,
            }
        })
        .collect();

    let mut global = vec![ChannelStats::empty(); num_channels];
    let mut per_line = Vec::with_capacity(lines.len());
    let mut multi_var_data = Vec::with_capacity(lines.len());
    let mut line_descs = Vec::with_capacity(lines.len());
    let mut var_descs = Vec::with_capacity(lines.len());

    let mut line_offset = 0u32;
    for line in lines {
        for (channel, stats) in line.per_channel.iter().enumerate() {
            global[channel].merge(*stats);
        }
        line_descs.push(LineDescriptor {
            start_index: line_offset,
            num_values: line.num_values,
        });
        line_offset += line.num_values;
        per_line.push(line.per_channel);
        multi_var_data.push(line.packed);
        var_descs.push(line.var_descs);
    }

    Ok(EnsembleStats {
        global,
        per_line,
        multi_var_data,
        line_descs,
        var_descs,
    })
}

#[cfg(test)]
#[path = "../tests/unit/stats.rs"]
mod tests;
