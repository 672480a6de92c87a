use super::*;

#[test]
fn stride_validation_rejects_ragged_ensembles() {
    let vertices = vec![Vec3::ZERO; 7];
    let err = RawTrajectories::new(4, vertices, vec![], vec![]).unwrap_err();
    assert!(matches!(err, RollvarError::Data(_)));
}

#[test]
fn aux_length_must_match_vertices_times_variables() {
    let vertices = vec![Vec3::ZERO; 8];
    let err =
        RawTrajectories::new(4, vertices, vec!["temperature".into()], vec![0.0; 7]).unwrap_err();
    assert!(matches!(err, RollvarError::Data(_)));
}

#[test]
fn accessors_expose_fixed_stride_layout() {
    let vertices = vec![Vec3::ZERO; 8];
    let aux: Vec<f32> = (0..16).map(|i| i as f32).collect();
    let raw = RawTrajectories::new(
        4,
        vertices,
        vec!["a".into(), "b".into()],
        aux,
    )
    .unwrap();
    assert_eq!(raw.num_trajectories(), 2);
    assert_eq!(raw.num_time_steps_per_trajectory(), 4);
    assert_eq!(raw.aux_data_at_vertex(3), &[6.0, 7.0]);
}
