use glam::Vec3;

use crate::foundation::error::{RollvarError, RollvarResult};
use crate::pipeline::request::DataRequest;

/// One ensemble of raw forecast trajectories in fixed-stride storage.
///
/// Every ensemble member has the same number of time steps; vertex `t` of
/// member `i` lives at index `i * num_time_steps + t`. A vertex is
/// `(longitude, latitude, pressure_hPa)`; unreached vertices carry the
/// [`INVALID_TRAJECTORY_POS`](crate::INVALID_TRAJECTORY_POS) sentinel in
/// their pressure component. Auxiliary scalar channels are stored
/// vertex-major with one value per named variable per vertex.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct RawTrajectories {
    num_trajectories: usize,
    num_time_steps: usize,
    vertices: Vec<Vec3>,
    aux_var_names: Vec<String>,
    aux_data: Vec<f32>,
}

impl RawTrajectories {
    /// Build an ensemble, validating the fixed-stride layout.
    pub fn new(
        num_time_steps: usize,
        vertices: Vec<Vec3>,
        aux_var_names: Vec<String>,
        aux_data: Vec<f32>,
    ) -> RollvarResult<Self> {
        if num_time_steps == 0 {
            return Err(RollvarError::data("num_time_steps must be > 0"));
        }
        if vertices.len() % num_time_steps != 0 {
            return Err(RollvarError::data(format!(
                "vertex count {} is not a multiple of the {} time steps per trajectory",
                vertices.len(),
                num_time_steps
            )));
        }
        if aux_data.len() != vertices.len() * aux_var_names.len() {
            return Err(RollvarError::data(format!(
                "aux data holds {} values, expected {} ({} vertices x {} variables)",
                aux_data.len(),
                vertices.len() * aux_var_names.len(),
                vertices.len(),
                aux_var_names.len()
            )));
        }
        Ok(Self {
            num_trajectories: vertices.len() / num_time_steps,
            num_time_steps,
            vertices,
            aux_var_names,
            aux_data,
        })
    }

    /// Number of ensemble members.
    pub fn num_trajectories(&self) -> usize {
        self.num_trajectories
    }

    /// Fixed number of time steps per member.
    pub fn num_time_steps_per_trajectory(&self) -> usize {
        self.num_time_steps
    }

    /// All vertices, member-major.
    pub fn vertices(&self) -> &[Vec3] {
        &self.vertices
    }

    /// Names of the auxiliary scalar variables.
    pub fn aux_var_names(&self) -> &[String] {
        &self.aux_var_names
    }

    /// Auxiliary values for one vertex, in `aux_var_names` order.
    pub fn aux_data_at_vertex(&self, vertex: usize) -> &[f32] {
        let k = self.aux_var_names.len();
        &self.aux_data[vertex * k..(vertex + 1) * k]
    }
}

/// Upstream provider of raw trajectory ensembles.
///
/// `get_data` hands out an owned ensemble that must be paired with exactly
/// one `release_data` call; passing the value back by move makes an early or
/// double release impossible. Dependency registration against the provider's
/// task graph is the scheduler's job and uses the stripped request from
/// [`PipelineNode::dependency_request`](crate::PipelineNode::dependency_request).
pub trait TrajectorySource {
    /// Produce (or fetch from cache) the ensemble for `request`.
    fn get_data(&self, request: &DataRequest) -> RollvarResult<RawTrajectories>;

    /// Return ownership of a previously produced ensemble.
    fn release_data(&self, data: RawTrajectories) {
        drop(data);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/trajectory/source.rs"]
mod tests;
