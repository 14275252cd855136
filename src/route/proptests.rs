//! Property-based tests for route aggregation

use super::aggregate::aggregate;
use super::aggregate::fixtures::{drive, ride, walk};
use super::*;
use proptest::prelude::*;

fn arb_step() -> impl Strategy<Value = Step> {
    prop_oneof![
        (1u64..900, 1u64..2000).prop_map(|(s, m)| walk(s, m)),
        (1u64..900, 1u64..9000).prop_map(|(s, m)| drive(s, m)),
        (1u64..900, 1u32..9).prop_map(|(s, n)| ride("BUS", "14", "Putney", n, s)),
        (1u64..900, 1u32..9).prop_map(|(s, n)| ride("SUBWAY", "Victoria", "Brixton", n, s)),
    ]
}

fn mode_runs(steps: &[Step]) -> Vec<SegmentMode> {
    let mut runs: Vec<SegmentMode> = Vec::new();
    for step in steps {
        let mode = aggregate(std::slice::from_ref(step))[0].mode;
        if runs.last() != Some(&mode) {
            runs.push(mode);
        }
    }
    runs
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    // Segments cover the leg exactly: same totals, never more segments than steps
    #[test]
    fn prop_aggregation_covers_leg(steps in proptest::collection::vec(arb_step(), 0..30)) {
        let segments = aggregate(&steps);

        prop_assert!(segments.len() <= steps.len());
        prop_assert_eq!(
            segments.iter().map(|s| s.duration).sum::<u64>(),
            steps.iter().map(|s| s.duration.value).sum::<u64>()
        );
        prop_assert_eq!(
            segments.iter().map(|s| s.distance).sum::<u64>(),
            steps.iter().map(|s| s.distance.value).sum::<u64>()
        );
    }

    // One segment per maximal run of same-mode steps, in order
    #[test]
    fn prop_one_segment_per_run(steps in proptest::collection::vec(arb_step(), 0..30)) {
        let segments = aggregate(&steps);
        let modes: Vec<_> = segments.iter().map(|s| s.mode).collect();

        prop_assert_eq!(modes, mode_runs(&steps));
        for pair in segments.windows(2) {
            prop_assert_ne!(pair[0].mode, pair[1].mode);
        }
    }

    #[test]
    fn prop_uniform_leg_is_one_segment(count in 1usize..20, seconds in 1u64..600) {
        let steps: Vec<_> = (0..count).map(|_| walk(seconds, 100)).collect();
        let segments = aggregate(&steps);

        prop_assert_eq!(segments.len(), 1);
        prop_assert_eq!(segments[0].duration, seconds * count as u64);
    }

    // [A,A,B,B,A] -> [A,B,A] for any pair of distinct modes
    #[test]
    fn prop_alternating_runs(a in arb_step(), b in arb_step()) {
        let mode_a = aggregate(std::slice::from_ref(&a))[0].mode;
        let mode_b = aggregate(std::slice::from_ref(&b))[0].mode;
        prop_assume!(mode_a != mode_b);

        let steps = vec![a.clone(), a.clone(), b.clone(), b, a];
        let modes: Vec<_> = aggregate(&steps).iter().map(|s| s.mode).collect();

        prop_assert_eq!(modes, vec![mode_a, mode_b, mode_a]);
    }
}
