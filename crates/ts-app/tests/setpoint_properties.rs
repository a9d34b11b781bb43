use proptest::prelude::*;
use ts_app::SetpointRange;

proptest! {
    #[test]
    fn setpoints_ascend_and_stop_at_end(
        start in 4.0f64..400.0,
        span in 0.0f64..50.0,
        step in 0.05f64..5.0,
    ) {
        let end = start + span;
        let values: Vec<f64> = SetpointRange::new(start, end, step).unwrap().collect();

        prop_assert_eq!(values[0], start);
        for pair in values.windows(2) {
            prop_assert!(pair[1] > pair[0]);
        }
        for &v in &values {
            prop_assert!(v <= end);
        }
        // The next value would overshoot.
        prop_assert!(start + values.len() as f64 * step > end);
    }

    #[test]
    fn values_do_not_drift(start in 250.0f64..350.0, step in 0.01f64..1.0, k in 0usize..200) {
        let end = start + (k as f64) * step;
        let values: Vec<f64> = SetpointRange::new(start, end, step).unwrap().collect();
        for (i, v) in values.iter().enumerate() {
            prop_assert_eq!(*v, start + i as f64 * step);
        }
    }

    #[test]
    fn size_hint_never_panics_and_brackets_the_count(
        start in -1e6f64..1e6,
        span in 0.0f64..1e30,
        step in 1e-3f64..10.0,
    ) {
        let range = SetpointRange::new(start, start + span, step).unwrap();
        let (lower, upper) = range.size_hint();
        let counted = range.clone().take(lower.saturating_add(2).min(10_000)).count();
        prop_assert!(counted >= lower.min(10_000));
        if let Some(upper) = upper {
            prop_assert!(lower <= upper);
            if upper < 10_000 {
                prop_assert!(range.count() <= upper);
            }
        }
    }
}
