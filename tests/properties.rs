// Property-based checks of the comparator.
// CI: 256 cases (default). Soak: PROPTEST_CASES=10000 cargo test --release

use std::collections::BTreeMap;

use proptest::prelude::*;
use tabletest::{compare, reflect_record};

mod common;
use common::{ring, self_loop, EPSILON};

#[derive(Debug, Clone)]
struct Reading {
    sensor: String,
    count: i64,
    values: Vec<f64>,
}
reflect_record!(Reading {
    sensor,
    count,
    values,
});

fn config() -> ProptestConfig {
    ProptestConfig {
        cases: std::env::var("PROPTEST_CASES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(256),
        failure_persistence: None,
        ..ProptestConfig::default()
    }
}

fn arb_reading() -> impl Strategy<Value = Reading> {
    (
        "[a-z]{0,6}",
        -5i64..5,
        prop::collection::vec(-1e3..1e3f64, 0..6),
    )
        .prop_map(|(sensor, count, values)| Reading {
            sensor,
            count,
            values,
        })
}

proptest! {
    #![proptest_config(config())]

    /// Every value equals itself, NaN and infinities included.
    #[test]
    fn prop_reflexive(xs in prop::collection::vec(any::<f64>(), 0..16)) {
        prop_assert!(compare(&xs, &xs).is_ok());
    }

    #[test]
    fn prop_reflexive_records(reading in arb_reading()) {
        prop_assert!(compare(&reading, &reading).is_ok());
    }

    #[test]
    fn prop_symmetric(a in arb_reading(), b in arb_reading()) {
        prop_assert_eq!(compare(&a, &b).is_ok(), compare(&b, &a).is_ok());
    }

    #[test]
    fn prop_symmetric_pointers(
        a in prop::option::of(-1e3..1e3f64),
        b in prop::option::of(-1e3..1e3f64),
    ) {
        let (a, b) = (a.map(Box::new), b.map(Box::new));
        prop_assert_eq!(compare(&a, &b).is_ok(), compare(&b, &a).is_ok());
    }

    #[test]
    fn prop_symmetric_maps(
        a in prop::collection::btree_map("[a-c]", -1e3..1e3f64, 0..4),
        b in prop::collection::btree_map("[a-c]", -1e3..1e3f64, 0..4),
    ) {
        prop_assert_eq!(compare(&a, &b).is_ok(), compare(&b, &a).is_ok());
        let nudged: BTreeMap<String, f64> =
            a.iter().map(|(k, v)| (k.clone(), v + EPSILON / 10.0)).collect();
        prop_assert_eq!(compare(&a, &nudged).is_ok(), compare(&nudged, &a).is_ok());
    }

    /// Rings sharing a first label and differing (or nearly agreeing) on the
    /// second give the same verdict both ways round.
    #[test]
    fn prop_symmetric_cycles(a in -1e3..1e3f64, b in -1e3..1e3f64, c in -1e3..1e3f64) {
        prop_assert_eq!(
            compare(&ring(a, b), &ring(a, c)).is_ok(),
            compare(&ring(a, c), &ring(a, b)).is_ok()
        );
        let near = b + EPSILON / 2.0;
        prop_assert_eq!(
            compare(&ring(a, b), &ring(a, near)).is_ok(),
            compare(&ring(a, near), &ring(a, b)).is_ok()
        );
    }

    /// Offsets under EPSILON are tolerated; offsets of ten EPSILONs are not.
    #[test]
    fn prop_tolerance(x in -1e6..1e6f64, frac in 0.0..0.5f64) {
        prop_assert!(compare(&x, &(x + frac * EPSILON)).is_ok());
        prop_assert!(compare(&x, &(x + 10.0 * EPSILON)).is_err());
        prop_assert!(compare(&(x - 10.0 * EPSILON), &x).is_err());
    }

    /// Cyclic values compare like their finite unrolling would.
    #[test]
    fn prop_cycles_terminate(a in -1e3..1e3f64, b in -1e3..1e3f64) {
        prop_assert!(compare(&ring(a, b), &ring(a, b)).is_ok());
        prop_assert_eq!(compare(&self_loop(a), &self_loop(b)).is_ok(), (a - b).abs() < EPSILON);
    }
}
