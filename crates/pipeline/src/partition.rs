//! Random train/validate/test split and the single-entity subset.

use optionset_core::{EntityId, PanelRow, PartitionConfig};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::collections::BTreeSet;

/// Disjoint, exhaustive partitions of the panel.
#[derive(Debug, Clone, Default)]
pub struct Partitions {
    pub train: Vec<PanelRow>,
    pub validate: Vec<PanelRow>,
    pub test: Vec<PanelRow>,
}

/// Split points `(⌊train·n⌋, ⌊(train+validate)·n⌋)`.
#[must_use]
pub fn split_points(n: usize, train_fraction: f64, validate_fraction: f64) -> (usize, usize) {
    let at = |fraction: f64| ((fraction * n as f64).floor() as usize).min(n);
    let first = at(train_fraction);
    let second = at(train_fraction + validate_fraction).max(first);
    (first, second)
}

/// Seeded permutation of `0..n`.
#[must_use]
pub fn shuffled_indices(n: usize, seed: u64) -> Vec<usize> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut indices: Vec<usize> = (0..n).collect();
    indices.shuffle(&mut rng);
    indices
}

/// Shuffles the panel with the configured seed and cuts it into three parts.
#[must_use]
pub fn partition(rows: &[PanelRow], config: &PartitionConfig) -> Partitions {
    let n = rows.len();
    let order = shuffled_indices(n, config.seed);
    let (first, second) = split_points(n, config.train_fraction, config.validate_fraction);

    let take = |range: &[usize]| range.iter().map(|&i| rows[i].clone()).collect::<Vec<_>>();
    let partitions = Partitions {
        train: take(&order[..first]),
        validate: take(&order[first..second]),
        test: take(&order[second..]),
    };

    tracing::info!(
        seed = config.seed,
        train = partitions.train.len(),
        validate = partitions.validate.len(),
        test = partitions.test.len(),
        "Partitioned panel"
    );
    partitions
}

/// Entity at `position` among the panel's sorted distinct entities.
#[must_use]
pub fn entity_at(rows: &[PanelRow], position: usize) -> Option<EntityId> {
    rows.iter()
        .map(|r| r.permno)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .nth(position)
}

/// Every row of one entity, in panel order. Empty when the panel has too few entities.
#[must_use]
pub fn single_entity(rows: &[PanelRow], position: usize) -> (Option<EntityId>, Vec<PanelRow>) {
    let Some(permno) = entity_at(rows, position) else {
        tracing::warn!(position, "Panel has too few entities for the single-entity subset");
        return (None, Vec::new());
    };
    let subset: Vec<PanelRow> = rows.iter().filter(|r| r.permno == permno).cloned().collect();
    tracing::info!(permno, rows = subset.len(), "Extracted single-entity subset");
    (Some(permno), subset)
}
