use crate::curve::chain::build_curve_chains;
use crate::foundation::core::PressureToWorldZ;
use crate::foundation::error::RollvarResult;
use crate::pipeline::request::{DataRequest, split_request};
use crate::resample::{
    ResamplePolicy, ResampledTrajectories, resample_trajectories, resolve_roll_step,
};
use crate::stats::compute_ensemble_stats;
use crate::trajectory::filter::{SensitivityFamily, filter_trajectories};
use crate::trajectory::source::{RawTrajectories, TrajectorySource};

/// Lifecycle of the most recent request handled by a [`PipelineNode`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum PipelineState {
    /// No request seen yet (or the last one failed and was rolled back).
    #[default]
    Idle,
    /// Request accepted, waiting on the upstream dependency.
    Requested,
    /// Raw data acquired, pipeline running.
    Computing,
    /// Result produced, raw input not yet returned.
    Produced,
    /// Raw input handed back to the provider.
    Released,
}

/// Wraps the resampling pipeline as a cacheable, dependency-tracked
/// computation keyed by a string-encoded request.
///
/// The node itself caches nothing; the external scheduler owns caching and
/// invokes [`PipelineNode::produce_data`] synchronously on a worker thread
/// of its choosing. Use [`PipelineNode::dependency_request`] to register the
/// upstream dependency in the scheduler's task graph.
pub struct PipelineNode<S: TrajectorySource> {
    source: S,
    policy: ResamplePolicy,
    sensitivity: SensitivityFamily,
    state: PipelineState,
}

impl<S: TrajectorySource> PipelineNode<S> {
    /// Build a node over an upstream trajectory provider.
    pub fn new(source: S) -> Self {
        Self {
            source,
            policy: ResamplePolicy::default(),
            sensitivity: SensitivityFamily::default(),
            state: PipelineState::Idle,
        }
    }

    /// Override the resampling policy.
    pub fn with_policy(mut self, policy: ResamplePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Configure the sensitivity variable family for the derived channel.
    pub fn with_sensitivity_family(mut self, family: SensitivityFamily) -> Self {
        self.sensitivity = family;
        self
    }

    /// Lifecycle state of the most recent request.
    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// The request to register upstream: this node's mapping key stripped,
    /// everything else forwarded unchanged.
    pub fn dependency_request(&self, request: &DataRequest) -> RollvarResult<DataRequest> {
        split_request(request).map(|(_, forward)| forward)
    }

    /// Run the pipeline for one request and return the owned result.
    ///
    /// Phase 1 (filter + curve chains + global statistics) completes for all
    /// trajectories before phase 2 (resampling) starts for any, because the
    /// emitted vertices embed global minima/maxima. The raw input is
    /// released exactly once, after resampling, whether the run succeeded or
    /// not; failure rolls the node back to [`PipelineState::Idle`].
    #[tracing::instrument(skip(self, request))]
    pub fn produce_data(&mut self, request: &DataRequest) -> RollvarResult<ResampledTrajectories> {
        tracing::debug!("computing rolling-variable trajectories..");
        self.state = PipelineState::Requested;

        let (mapping, forward) = match split_request(request) {
            Ok(split) => split,
            Err(e) => {
                self.state = PipelineState::Idle;
                return Err(e);
            }
        };
        let raw = match self.source.get_data(&forward) {
            Ok(raw) => raw,
            Err(e) => {
                self.state = PipelineState::Idle;
                return Err(e);
            }
        };

        self.state = PipelineState::Computing;
        let result = run_pipeline(&raw, &mapping, &self.policy, &self.sensitivity);
        if result.is_ok() {
            self.state = PipelineState::Produced;
        }
        self.source.release_data(raw);

        match result {
            Ok(resampled) => {
                self.state = PipelineState::Released;
                tracing::debug!(
                    lines = resampled.trajectories.len(),
                    channels = resampled.num_channels,
                    ".. rolling-variable trajectories done"
                );
                Ok(resampled)
            }
            Err(e) => {
                self.state = PipelineState::Idle;
                Err(e)
            }
        }
    }
}

fn run_pipeline(
    raw: &RawTrajectories,
    mapping: &PressureToWorldZ,
    policy: &ResamplePolicy,
    sensitivity: &SensitivityFamily,
) -> RollvarResult<ResampledTrajectories> {
    // Phase 1: per-trajectory cleanup and geometry, then the global
    // statistics barrier.
    let filtered = filter_trajectories(raw, mapping, sensitivity);
    let (chains, seg_stats) = build_curve_chains(&filtered.trajectories);
    let stats = compute_ensemble_stats(&filtered.trajectories, filtered.num_channels)?;

    // Phase 2: arc-length-uniform resampling with rolling channels.
    let step = resolve_roll_step(seg_stats.avg_length, filtered.num_channels, policy);
    let trajectories = resample_trajectories(
        &filtered.trajectories,
        &chains,
        &stats,
        filtered.num_channels,
        step,
    );

    Ok(ResampledTrajectories {
        trajectories,
        index_map: filtered.index_map,
        global_stats: stats.global,
        num_channels: filtered.num_channels,
    })
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/node.rs"]
mod tests;
