mod common;

use common::{DistanceEstimator, SortedFramework, SortedInsertion};
use markerforge::builder::{BuildOptions, ProgressiveBuilder, RankedItem};
use markerforge::error::MarkerForgeError;
use markerforge::estimator::{EstimationFailure, MapEstimator};
use markerforge::types::{FitnessResult, Item, Order};
use rstest::{fixture, rstest};
use std::collections::HashSet;
use std::sync::Arc;

#[fixture]
fn build_options() -> BuildOptions {
    BuildOptions {
        seed_size: 5,
        threshold: 3.0,
        touchdown: false,
        tolerance: 0.1,
        final_tolerance: 1e-4,
        phase_workers: 1,
        seed: Some(7),
    }
}

fn builder(scorer: SortedInsertion, options: BuildOptions) -> ProgressiveBuilder {
    ProgressiveBuilder::new(
        Arc::new(DistanceEstimator::new()),
        Arc::new(SortedFramework),
        Arc::new(scorer),
        options,
    )
    .unwrap()
}

/// Items 0..=4 are the least ambiguous, 5..=7 come later.
fn ranked() -> Vec<RankedItem> {
    [(5, 1), (0, 0), (6, 1), (1, 0), (2, 0), (7, 1), (3, 0), (4, 0)]
        .into_iter()
        .map(|(item, category)| RankedItem { item, category })
        .collect()
}

#[rstest]
fn ambiguous_item_is_reported_and_forced(build_options: BuildOptions) {
    let b = builder(SortedInsertion::new(5.0).with_ambiguous(7), build_options);
    let outcome = b.build(&ranked()).unwrap();

    assert_eq!(outcome.positioned.order().items(), &[0, 1, 2, 3, 4, 5, 6]);
    assert_eq!(outcome.unpositioned, vec![7]);

    assert_eq!(outcome.lod_matrix.len(), 1);
    let (item, lods) = &outcome.lod_matrix[0];
    assert_eq!(*item, 7);
    assert_eq!(lods.len(), 8);
    assert_eq!(lods[0], 0.0);
    assert_eq!(lods[7], 0.0);
    assert!(lods[1..7].iter().all(|&v| v == -5.0));

    let forced = outcome.forced.order();
    assert_eq!(forced.len(), 8);
    let slot = forced.position_of(7).unwrap();
    assert!(slot == 0 || slot == 7, "forced into slot {}", slot);
    let rest: Vec<Item> = forced.items().iter().copied().filter(|&i| i != 7).collect();
    assert_eq!(rest, vec![0, 1, 2, 3, 4, 5, 6]);
}

#[rstest]
fn positioned_and_unpositioned_partition_the_input(build_options: BuildOptions) {
    let scorer = SortedInsertion::new(5.0)
        .with_ambiguous(7)
        .with_margin(5, 1.0);
    let outcome = builder(scorer, build_options).build(&ranked()).unwrap();

    let positioned: HashSet<Item> = outcome.positioned.order().items().iter().copied().collect();
    let unpositioned: HashSet<Item> = outcome.unpositioned.iter().copied().collect();
    assert!(positioned.is_disjoint(&unpositioned));
    let all: HashSet<Item> = positioned.union(&unpositioned).copied().collect();
    assert_eq!(all, (0..8).collect());
    assert_eq!(outcome.unpositioned, vec![5, 7]);

    let forced: HashSet<Item> = outcome.forced.order().items().iter().copied().collect();
    assert_eq!(forced, (0..8).collect());
}

#[rstest]
fn touchdown_retries_with_a_relaxed_threshold(mut build_options: BuildOptions) {
    let scorer = || SortedInsertion::new(5.0).with_margin(6, 2.5);

    let strict = builder(scorer(), build_options.clone()).build(&ranked()).unwrap();
    assert_eq!(strict.unpositioned, vec![6]);

    build_options.touchdown = true;
    let relaxed = builder(scorer(), build_options).build(&ranked()).unwrap();
    assert!(relaxed.unpositioned.is_empty());
    assert_eq!(relaxed.positioned.order().items(), &[0, 1, 2, 3, 4, 5, 6, 7]);
    assert_eq!(relaxed.forced, relaxed.positioned);
}

#[rstest]
fn scoring_failure_leaves_item_unpositioned(build_options: BuildOptions) {
    let scorer = SortedInsertion::new(5.0).with_failing(6);
    let outcome = builder(scorer, build_options).build(&ranked()).unwrap();
    assert_eq!(outcome.unpositioned, vec![6]);
    let (_, lods) = &outcome.lod_matrix[0];
    assert_eq!(lods, &vec![0.0; 8]);
    assert_eq!(outcome.forced.len(), 8);
}

/// Fails on complete orders of eight items below the given tolerance.
struct FailsOnFullOrder {
    inner: DistanceEstimator,
    below: f64,
}

impl MapEstimator for FailsOnFullOrder {
    fn estimate_map(
        &self,
        order: &Order,
        tolerance: f64,
        phase_workers: usize,
    ) -> Result<FitnessResult, EstimationFailure> {
        if order.len() == 8 && tolerance < self.below {
            return Err(EstimationFailure::Numerical("diverged".to_string()));
        }
        self.inner.estimate_map(order, tolerance, phase_workers)
    }

    fn estimate_seeded_map(
        &self,
        order: &Order,
        fixed_phases: &[u8],
        tolerance: f64,
        phase_workers: usize,
    ) -> Result<FitnessResult, EstimationFailure> {
        self.inner
            .estimate_seeded_map(order, fixed_phases, tolerance, phase_workers)
    }
}

fn builder_with(estimator: impl MapEstimator + 'static, options: BuildOptions) -> ProgressiveBuilder {
    ProgressiveBuilder::new(
        Arc::new(estimator),
        Arc::new(SortedFramework),
        Arc::new(SortedInsertion::new(5.0).with_ambiguous(7)),
        options,
    )
    .unwrap()
}

#[rstest]
fn unmappable_forced_order_keeps_the_outcome(build_options: BuildOptions) {
    let b = builder_with(
        DistanceEstimator::failing_when(|items| items.len() == 8),
        build_options,
    );
    let outcome = b.build(&ranked()).unwrap();

    assert_eq!(outcome.positioned.order().items(), &[0, 1, 2, 3, 4, 5, 6]);
    assert!(!outcome.positioned.fitness().is_dominated());
    assert_eq!(outcome.unpositioned, vec![7]);
    assert_eq!(outcome.lod_matrix.len(), 1);

    let forced = &outcome.forced;
    assert!(forced.fitness().is_dominated());
    assert_eq!(forced.len(), 8);
    assert!(forced.order().contains(7));
    assert_eq!(forced.fitness().phases.len(), 7);
}

#[rstest]
fn final_remap_falls_back_to_build_tolerance(build_options: BuildOptions) {
    let b = builder_with(
        FailsOnFullOrder {
            inner: DistanceEstimator::new(),
            below: 1e-2,
        },
        build_options,
    );
    let outcome = b.build(&ranked()).unwrap();
    assert!(!outcome.forced.fitness().is_dominated());
    assert_eq!(outcome.forced.len(), 8);
    assert_eq!(
        outcome.forced.likelihood(),
        DistanceEstimator::likelihood_of(outcome.forced.order().items())
    );
}

#[rstest]
fn seed_failure_is_fatal(build_options: BuildOptions) {
    let b = ProgressiveBuilder::new(
        Arc::new(DistanceEstimator::failing_when(|_| true)),
        Arc::new(SortedFramework),
        Arc::new(SortedInsertion::new(5.0)),
        build_options,
    )
    .unwrap();
    assert!(matches!(
        b.build(&ranked()),
        Err(MarkerForgeError::SeedEstimation(_))
    ));
}

#[rstest]
fn few_items_are_ordered_as_the_seed(build_options: BuildOptions) {
    let items: Vec<RankedItem> = [3, 1, 2]
        .into_iter()
        .map(|item| RankedItem { item, category: 0 })
        .collect();
    let outcome = builder(SortedInsertion::new(5.0), build_options)
        .build(&items)
        .unwrap();
    assert_eq!(outcome.positioned.order().items(), &[1, 2, 3]);
    assert!(outcome.unpositioned.is_empty());
    assert!(outcome.lod_matrix.is_empty());
}

#[rstest]
#[case::seed_too_small(1, 3.0, false)]
#[case::threshold_zero(5, 0.0, false)]
#[case::touchdown_below_zero(5, 0.5, true)]
fn invalid_build_options_are_rejected(
    mut build_options: BuildOptions,
    #[case] seed_size: usize,
    #[case] threshold: f64,
    #[case] touchdown: bool,
) {
    build_options.seed_size = seed_size;
    build_options.threshold = threshold;
    build_options.touchdown = touchdown;
    let result = ProgressiveBuilder::new(
        Arc::new(DistanceEstimator::new()),
        Arc::new(SortedFramework),
        Arc::new(SortedInsertion::new(5.0)),
        build_options,
    );
    assert!(matches!(result, Err(MarkerForgeError::Config(_))));
}

#[rstest]
fn repeated_items_are_rejected(build_options: BuildOptions) {
    let mut items = ranked();
    items.push(RankedItem { item: 3, category: 2 });
    let result = builder(SortedInsertion::new(5.0), build_options).build(&items);
    assert!(matches!(result, Err(MarkerForgeError::Config(_))));
}
