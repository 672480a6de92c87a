use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use glam::Vec3;

use super::*;
use crate::foundation::error::RollvarError;
use crate::pipeline::request::LOGP_SCALED_KEY;

struct MockSource {
    raw: RawTrajectories,
    forwarded: Mutex<Option<String>>,
    releases: AtomicUsize,
    fail: bool,
}

impl MockSource {
    fn new(raw: RawTrajectories) -> Self {
        Self {
            raw,
            forwarded: Mutex::new(None),
            releases: AtomicUsize::new(0),
            fail: false,
        }
    }
}

impl TrajectorySource for MockSource {
    fn get_data(&self, request: &DataRequest) -> RollvarResult<RawTrajectories> {
        *self.forwarded.lock().unwrap() = Some(request.to_request_string());
        if self.fail {
            return Err(RollvarError::data("provider offline"));
        }
        Ok(self.raw.clone())
    }

    fn release_data(&self, data: RawTrajectories) {
        self.releases.fetch_add(1, Ordering::SeqCst);
        drop(data);
    }
}

fn two_member_ensemble() -> RawTrajectories {
    let vertices = vec![
        // member 0
        Vec3::new(0.0, 0.0, 1000.0),
        Vec3::new(1.0, 0.5, 950.0),
        Vec3::new(2.0, 1.0, 900.0),
        Vec3::new(3.0, 1.5, 850.0),
        // member 1
        Vec3::new(0.0, 5.0, 980.0),
        Vec3::new(1.0, 5.5, 940.0),
        Vec3::new(2.0, 6.0, 890.0),
        Vec3::new(3.0, 6.5, 830.0),
    ];
    let aux: Vec<f32> = (0..8).map(|i| 270.0 + i as f32).collect();
    RawTrajectories::new(4, vertices, vec!["temperature".into()], aux).unwrap()
}

fn request_with_mapping() -> DataRequest {
    let mut request = DataRequest::parse("VARIABLE=u;MEMBER=0").unwrap();
    request.insert(LOGP_SCALED_KEY, "6.956545/-12.0");
    request
}

#[test]
fn dependency_request_strips_only_the_mapping_key() {
    let node = PipelineNode::new(MockSource::new(two_member_ensemble()));
    let forward = node.dependency_request(&request_with_mapping()).unwrap();
    assert!(!forward.contains(LOGP_SCALED_KEY));
    assert_eq!(forward.to_request_string(), "VARIABLE=u;MEMBER=0");
}

#[test]
fn produce_data_runs_the_full_pipeline() {
    let mut node = PipelineNode::new(MockSource::new(two_member_ensemble()));
    assert_eq!(node.state(), PipelineState::Idle);

    let out = node.produce_data(&request_with_mapping()).unwrap();
    assert_eq!(node.state(), PipelineState::Released);

    // pressure + temperature
    assert_eq!(out.num_channels, 2);
    assert_eq!(out.trajectories.len(), 2);
    assert_eq!(out.index_map.filtered_index(0), Some(0));
    assert_eq!(out.index_map.filtered_index(1), Some(1));
    assert_eq!(out.global_stats.len(), 2);
    assert_eq!(out.global_stats[1].min, 270.0);
    assert_eq!(out.global_stats[1].max, 277.0);
    for trajectory in &out.trajectories {
        assert!(!trajectory.positions.is_empty());
        assert_eq!(trajectory.positions.len(), trajectory.channels.len());
    }
    assert!(out.memory_size_bytes() > 0);
}

#[test]
fn raw_input_is_released_exactly_once() {
    let mut node = PipelineNode::new(MockSource::new(two_member_ensemble()));
    node.produce_data(&request_with_mapping()).unwrap();
    let forwarded = node.source.forwarded.lock().unwrap().clone();
    assert_eq!(forwarded.as_deref(), Some("VARIABLE=u;MEMBER=0"));
    assert_eq!(node.source.releases.load(Ordering::SeqCst), 1);
}

#[test]
fn missing_mapping_key_fails_before_touching_the_source() {
    let mut node = PipelineNode::new(MockSource::new(two_member_ensemble()));
    let request = DataRequest::parse("VARIABLE=u").unwrap();
    let err = node.produce_data(&request).unwrap_err();
    assert!(matches!(err, RollvarError::Request(_)));
    assert_eq!(node.state(), PipelineState::Idle);
    assert!(node.source.forwarded.lock().unwrap().is_none());
    assert_eq!(node.source.releases.load(Ordering::SeqCst), 0);
}

#[test]
fn source_failure_rolls_the_node_back_to_idle() {
    let mut source = MockSource::new(two_member_ensemble());
    source.fail = true;
    let mut node = PipelineNode::new(source);
    let err = node.produce_data(&request_with_mapping()).unwrap_err();
    assert!(matches!(err, RollvarError::Data(_)));
    assert_eq!(node.state(), PipelineState::Idle);
    assert_eq!(node.source.releases.load(Ordering::SeqCst), 0);
}

#[test]
fn sensitivity_family_flows_through_the_node() {
    let vertices = vec![
        Vec3::new(0.0, 0.0, 1000.0),
        Vec3::new(1.0, 0.0, 950.0),
        Vec3::new(2.0, 0.0, 900.0),
        Vec3::new(3.0, 0.0, 850.0),
    ];
    // temperature, dT_dx per vertex
    let aux = vec![270.0, -2.0, 271.0, 3.0, 272.0, -1.0, 273.0, 0.5];
    let raw = RawTrajectories::new(
        4,
        vertices,
        vec!["temperature".into(), "dT_dx".into()],
        aux,
    )
    .unwrap();
    let mut node = PipelineNode::new(MockSource::new(raw))
        .with_sensitivity_family(SensitivityFamily::new(["dT_dx"]));
    let out = node.produce_data(&request_with_mapping()).unwrap();
    // pressure + 2 aux + derived max channel
    assert_eq!(out.num_channels, 4);
}
