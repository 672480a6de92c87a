//! Rollvar turns a raw ensemble of forecast trajectories into GPU-ready
//! polylines that interleave multiple scalar variables along each line
//! ("rolling variable" encoding).
//!
//! # Pipeline overview
//!
//! 1. **Filter**: `RawTrajectories -> Vec<FilteredTrajectory> + IndexMap`
//!    (sentinel and duplicate vertices removed, pressure mapped to world-Z)
//! 2. **Chain**: one [`CubicBezierCurve`] per consecutive vertex pair, with
//!    Catmull-Rom-style tangent estimation
//! 3. **Stats**: global and per-line min/max per scalar channel, plus the
//!    packed `multi_var_data` buffer with its descriptor tables
//! 4. **Resample**: walk each curve chain at a fixed arc-length step and emit
//!    a fresh vertex stream where consecutive vertices carry different
//!    channels in round-robin order
//!
//! The key design constraints:
//!
//! - **No unsafe**: `unsafe` is forbidden in this crate.
//! - **Single owner**: [`PipelineNode`] returns an owned
//!   [`ResampledTrajectories`]; dropping it frees all packed buffers.
//! - **Whole-request semantics**: a request either yields a complete ensemble
//!   or a typed error, never a partial result.
//! - **No GPU state**: the crate produces plain owned buffers; upload and
//!   residency management belong to the renderer.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod curve;
mod foundation;
mod pipeline;
mod resample;
mod stats;
mod trajectory;

pub use curve::bezier::{ARC_LENGTH_STEPS, CubicBezierCurve};
pub use curve::chain::{CurveChain, SegmentStats, build_curve_chains};
pub use foundation::core::{INVALID_TRAJECTORY_POS, PressureToWorldZ, Vec3};
pub use foundation::error::{RollvarError, RollvarResult};
pub use pipeline::node::{PipelineNode, PipelineState};
pub use pipeline::request::{DataRequest, LOGP_SCALED_KEY, parse_logp_mapping};
pub use resample::{
    ChannelRole, MAX_ROLLING_CHANNELS, MIN_ROLL_SEG_LENGTH, ResamplePolicy, ResampledTrajectories,
    ResampledTrajectory, UNASSIGNED_CHANNEL_ID, VertexChannels,
};
pub use stats::{ChannelStats, EnsembleStats, LineDescriptor, VarDescriptor, compute_ensemble_stats};
pub use trajectory::filter::{
    DUPLICATE_EPSILON, FilterOutput, FilteredTrajectory, IndexMap, SensitivityFamily,
    filter_trajectories,
};
pub use trajectory::source::{RawTrajectories, TrajectorySource};
