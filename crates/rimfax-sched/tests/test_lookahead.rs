//! Lookahead scheduling across heterogeneous subsystems.

use approx::assert_relative_eq;
use rimfax_engine::{MiMode, ObservableSet};
use rimfax_math::PackedState;
use rimfax_sched::{SubsystemConfig, SubsystemRegistry};

/// Bell pair as a packed initial state.
fn bell_packed() -> PackedState {
    let mut data = vec![0.0; 4 * 4 * 2];
    for (r, c) in [(0, 0), (0, 3), (3, 0), (3, 3)] {
        data[(r * 4 + c) * 2] = 0.5;
    }
    PackedState { dim: 4, data }
}

#[test]
fn mixed_size_subsystems_evolve_side_by_side() {
    let mut reg = SubsystemRegistry::new();

    let mut qubit = SubsystemConfig::new("lone-qubit", 1);
    qubit.lindblad_triplets = vec![vec![0.0, 1.0, 1.0, 0.0]];
    let qubit_id = reg.register(qubit).unwrap();

    let mut pair = SubsystemConfig::new("bell-pair", 2);
    pair.initial_state = Some(bell_packed());
    let pair_id = reg.register(pair).unwrap();

    let obs = ObservableSet {
        mutual_info: Some(MiMode::Quantum),
        dominant: false,
    };
    let batch = reg.evolve_all_lookahead(3, 0.1, 1e-3, obs).unwrap();

    assert_eq!(batch.tracks.len(), 2);
    assert_eq!(batch.tracks[0].id, qubit_id);
    assert_eq!(batch.tracks[1].id, pair_id);

    // Noiseless Bell pair stays maximally correlated in every step.
    for snap in &batch.tracks[1].snapshots {
        assert_relative_eq!(snap.purity, 1.0, epsilon = 1e-9);
        assert_relative_eq!(snap.mutual_info[0], 2.0, epsilon = 1e-6);
    }
    // Lone qubit has no pairs.
    for snap in &batch.tracks[0].snapshots {
        assert!(snap.mutual_info.is_empty());
        assert_eq!(snap.bloch.len(), 1);
    }
}

#[test]
fn config_roundtrips_through_json() {
    let mut cfg = SubsystemConfig::new("bell-pair", 2);
    cfg.initial_state = Some(bell_packed());
    cfg.lindblad_triplets = vec![vec![0.0, 1.0, 0.5, 0.0]];

    let json = serde_json::to_string(&cfg).unwrap();
    let back: SubsystemConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(cfg, back);

    let mut reg = SubsystemRegistry::new();
    assert!(reg.register(back).is_ok());
}
