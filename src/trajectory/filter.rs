use glam::Vec3;
use rayon::prelude::*;

use crate::foundation::core::{INVALID_TRAJECTORY_POS, PressureToWorldZ};
use crate::trajectory::source::RawTrajectories;

/// Vertices closer than this to the last accepted vertex are dropped as
/// duplicates (they would degenerate tangent estimation).
pub const DUPLICATE_EPSILON: f32 = 1e-5;

/// One trajectory after sentinel/duplicate removal.
///
/// `positions` are world-space (pressure already mapped to world-Z); every
/// channel in `attributes` has exactly `positions.len()` values. Channel 0
/// holds the raw pressure in hPa, channels `1..=K` mirror the K auxiliary
/// variables, and an optional derived channel (per-timestep max over the
/// sensitivity family) comes last.
#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct FilteredTrajectory {
    /// Accepted vertex positions in world space.
    pub positions: Vec<Vec3>,
    /// Scalar channels, one `Vec<f32>` per variable.
    pub attributes: Vec<Vec<f32>>,
}

/// Total, order-preserving map from original ensemble-member indices to
/// filtered-trajectory indices. Dropped members map to `None`.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct IndexMap(Vec<Option<usize>>);

impl IndexMap {
    /// Number of original ensemble members.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the ensemble had no members.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The filtered index for an original member, or `None` if it was
    /// dropped.
    pub fn filtered_index(&self, original: usize) -> Option<usize> {
        self.0.get(original).copied().flatten()
    }

    /// Iterate entries in original order.
    pub fn iter(&self) -> impl Iterator<Item = Option<usize>> + '_ {
        self.0.iter().copied()
    }
}

impl From<Vec<Option<usize>>> for IndexMap {
    fn from(entries: Vec<Option<usize>>) -> Self {
        Self(entries)
    }
}

/// Names of auxiliary variables forming the "sensitivity" family.
///
/// When any ensemble variable matches, the filter appends a derived channel
/// holding the per-timestep maximum magnitude across the family, and the
/// mirrored family channels themselves are folded to absolute values.
#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct SensitivityFamily {
    names: Vec<String>,
}

impl SensitivityFamily {
    /// Build a family from explicit variable names.
    pub fn new(names: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether the family is empty (no derived channel is produced).
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Whether a variable name belongs to the family.
    pub fn matches(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    /// Indices into `aux_var_names` of the member variables.
    fn member_indices(&self, aux_var_names: &[String]) -> Vec<usize> {
        aux_var_names
            .iter()
            .enumerate()
            .filter(|(_, name)| self.matches(name))
            .map(|(idx, _)| idx)
            .collect()
    }
}

/// Result of the filtering pass over a whole ensemble.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct FilterOutput {
    /// Retained trajectories, in original order.
    pub trajectories: Vec<FilteredTrajectory>,
    /// Original-to-filtered index bookkeeping.
    pub index_map: IndexMap,
    /// Channels per trajectory (pressure + aux + optional derived channel).
    pub num_channels: usize,
}

/// Convert a raw ensemble into clean position + attribute sequences.
///
/// Vertices are skipped when their pressure equals the invalid sentinel or
/// when they sit within [`DUPLICATE_EPSILON`] of the last accepted vertex
/// (distance measured in raw lon/lat/pressure space). A trajectory is
/// retained only with at least two accepted positions.
pub fn filter_trajectories(
    raw: &RawTrajectories,
    mapping: &PressureToWorldZ,
    sensitivity: &SensitivityFamily,
) -> FilterOutput {
    let num_aux = raw.aux_var_names().len();
    let family = sensitivity.member_indices(raw.aux_var_names());
    let has_derived = !family.is_empty();
    let num_channels = 1 + num_aux + usize::from(has_derived);

    let filtered: Vec<Option<FilteredTrajectory>> = (0..raw.num_trajectories())
        .into_par_iter()
        .map(|i| filter_one(raw, i, mapping, &family))
        .collect();

    let mut trajectories = Vec::with_capacity(filtered.len());
    let mut entries = Vec::with_capacity(filtered.len());
    for trajectory in filtered {
        match trajectory {
            Some(t) => {
                entries.push(Some(trajectories.len()));
                trajectories.push(t);
            }
            None => entries.push(None),
        }
    }

    FilterOutput {
        trajectories,
        index_map: IndexMap::from(entries),
        num_channels,
    }
}

fn filter_one(
    raw: &RawTrajectories,
    trajectory_idx: usize,
    mapping: &PressureToWorldZ,
    family: &[usize],
) -> Option<FilteredTrajectory> {
    let num_time_steps = raw.num_time_steps_per_trajectory();
    let num_aux = raw.aux_var_names().len();
    let base_index = trajectory_idx * num_time_steps;

    let mut trajectory = FilteredTrajectory {
        positions: Vec::new(),
        attributes: vec![Vec::new(); 1 + num_aux],
    };

    let mut prev = Vec3::splat(INVALID_TRAJECTORY_POS);
    for t in 0..num_time_steps {
        let point = raw.vertices()[base_index + t];
        if point.z == INVALID_TRAJECTORY_POS {
            continue;
        }
        if (point - prev).length() < DUPLICATE_EPSILON {
            continue;
        }

        // Pressure doubles as channel 0 so ensembles without auxiliary data
        // still have one scalar variable to encode.
        trajectory.attributes[0].push(point.z);
        let aux = raw.aux_data_at_vertex(base_index + t);
        for (j, &value) in aux.iter().enumerate() {
            trajectory.attributes[j + 1].push(value);
        }

        prev = point;
        trajectory.positions.push(Vec3::new(
            point.x,
            point.y,
            mapping.world_z_from_pressure(point.z),
        ));
    }

    if trajectory.positions.len() < 2 {
        tracing::debug!(
            trajectory = trajectory_idx,
            accepted = trajectory.positions.len(),
            "dropping trajectory with fewer than two accepted vertices"
        );
        return None;
    }

    if !family.is_empty() {
        append_sensitivity_channel(&mut trajectory, family);
    }
    Some(trajectory)
}

/// Fold the sensitivity family to absolute values and append the derived
/// per-timestep maximum channel (NaN where no family value is valid).
fn append_sensitivity_channel(trajectory: &mut FilteredTrajectory, family: &[usize]) {
    for &aux_idx in family {
        for value in &mut trajectory.attributes[aux_idx + 1] {
            *value = value.abs();
        }
    }

    let num_values = trajectory.positions.len();
    let mut derived = Vec::with_capacity(num_values);
    for i in 0..num_values {
        let mut max_value = 0.0f32;
        let mut has_valid = false;
        for &aux_idx in family {
            let value = trajectory.attributes[aux_idx + 1][i];
            if !value.is_nan() {
                if value.abs() > max_value.abs() {
                    max_value = value;
                }
                has_valid = true;
            }
        }
        derived.push(if has_valid { max_value } else { f32::NAN });
    }
    trajectory.attributes.push(derived);
}

#[cfg(test)]
#[path = "../../tests/unit/trajectory/filter.rs"]
mod tests;
