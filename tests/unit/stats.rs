use super::*;

fn trajectory(channels: &[&[f32]]) -> FilteredTrajectory {
    let len = channels[0].len();
    FilteredTrajectory {
        positions: vec![glam::Vec3::ZERO; len],
        attributes: channels.iter().map(|c| c.to_vec()).collect(),
    }
}

#[test]
fn global_range_spans_all_trajectories() {
    // Single "temperature" channel split across two ensemble members.
    let trajectories = vec![
        trajectory(&[&[-10.0, 0.0]]),
        trajectory(&[&[10.0, 20.0]]),
    ];
    let stats = compute_ensemble_stats(&trajectories, 1).unwrap();
    assert_eq!(stats.global[0].min, -10.0);
    assert_eq!(stats.global[0].max, 20.0);
}

#[test]
fn per_line_ranges_are_local() {
    let trajectories = vec![
        trajectory(&[&[-10.0, 0.0]]),
        trajectory(&[&[10.0, 20.0]]),
    ];
    let stats = compute_ensemble_stats(&trajectories, 1).unwrap();
    assert_eq!(stats.per_line[0][0].max, 0.0);
    assert_eq!(stats.per_line[1][0].min, 10.0);
    assert_eq!(stats.var_descs[1][0].min_max, (10.0, 20.0));
}

#[test]
fn packed_buffer_concatenates_channels_per_line() {
    let trajectories = vec![
        trajectory(&[&[1.0, 2.0], &[3.0, 4.0]]),
        trajectory(&[&[5.0, 6.0, 7.0], &[8.0, 9.0, 10.0]]),
    ];
    let stats = compute_ensemble_stats(&trajectories, 2).unwrap();

    assert_eq!(stats.multi_var_data[0], vec![1.0, 2.0, 3.0, 4.0]);
    assert_eq!(stats.multi_var_data[1], vec![5.0, 6.0, 7.0, 8.0, 9.0, 10.0]);

    assert_eq!(stats.line_descs[0], LineDescriptor { start_index: 0, num_values: 4 });
    assert_eq!(stats.line_descs[1], LineDescriptor { start_index: 4, num_values: 6 });

    // Channel offsets are line-local.
    assert_eq!(stats.var_descs[0][0].start_index, 0.0);
    assert_eq!(stats.var_descs[0][1].start_index, 2.0);
    assert_eq!(stats.var_descs[1][1].start_index, 3.0);
}

#[test]
fn nan_values_do_not_poison_ranges() {
    let trajectories = vec![trajectory(&[&[1.0, f32::NAN, 3.0]])];
    let stats = compute_ensemble_stats(&trajectories, 1).unwrap();
    assert_eq!(stats.global[0].min, 1.0);
    assert_eq!(stats.global[0].max, 3.0);
}

#[test]
fn zero_channels_is_a_request_level_error() {
    let err = compute_ensemble_stats(&[], 0).unwrap_err();
    assert!(matches!(err, RollvarError::EmptyChannelSet));
}

#[test]
fn channel_stats_merge_matches_update() {
    let mut a = ChannelStats::empty();
    a.update(2.0);
    a.update(-1.0);
    let mut b = ChannelStats::empty();
    b.update(5.0);
    a.merge(b);
    assert_eq!(a.min, -1.0);
    assert_eq!(a.max, 5.0);
}
