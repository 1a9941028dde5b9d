#[cfg(test)]
mod tests {
    use crate::overlap::{format_time_of_day, parse_time_of_day, OverlapRule, MINUTES_PER_DAY};
    use proptest::prelude::*;

    // Reference model: half-open intervals [start, start + window) intersect.
    fn intervals_intersect(a: u32, b: u32, window: u32) -> bool {
        let (a_end, b_end) = (a + window, b + window);
        a.max(b) < a_end.min(b_end)
    }

    proptest! {
        #[test]
        fn interval_rule_matches_half_open_intersection(
            a in 0..MINUTES_PER_DAY,
            b in 0..MINUTES_PER_DAY,
            duration in 1..240u32,
            buffer in 0..60u32,
        ) {
            let rule = OverlapRule::Interval { duration, buffer };
            let window = duration + buffer;
            prop_assert_eq!(rule.conflicts_at(a, b), intervals_intersect(a, b, window));
            prop_assert_eq!(
                rule.conflicts(&format_time_of_day(a), &format_time_of_day(b)),
                intervals_intersect(a, b, window)
            );
        }

        #[test]
        fn proximity_rule_matches_half_open_intersection(
            a in 0..MINUTES_PER_DAY,
            b in 0..MINUTES_PER_DAY,
            window in 1..240u32,
        ) {
            let rule = OverlapRule::Proximity { window };
            prop_assert_eq!(rule.conflicts_at(a, b), intervals_intersect(a, b, window));
        }

        #[test]
        fn touching_windows_never_conflict(
            start in 0..(MINUTES_PER_DAY - 300),
            duration in 1..200u32,
            buffer in 0..60u32,
        ) {
            let interval = OverlapRule::Interval { duration, buffer };
            let next = start + duration + buffer;
            prop_assert!(!interval.conflicts_at(start, next));
            prop_assert!(!interval.conflicts_at(next, start));
            prop_assert!(interval.conflicts_at(start, next - 1));

            let proximity = OverlapRule::Proximity { window: duration };
            prop_assert!(!proximity.conflicts_at(start, start + duration));
            prop_assert!(proximity.conflicts_at(start, start + duration - 1));
        }

        #[test]
        fn conflicts_are_symmetric(
            a in 0..MINUTES_PER_DAY,
            b in 0..MINUTES_PER_DAY,
            window in 1..240u32,
        ) {
            let rule = OverlapRule::Proximity { window };
            prop_assert_eq!(rule.conflicts_at(a, b), rule.conflicts_at(b, a));
            let rule = OverlapRule::Interval { duration: window, buffer: 15 };
            prop_assert_eq!(rule.conflicts_at(a, b), rule.conflicts_at(b, a));
        }

        #[test]
        fn unparseable_input_is_always_a_conflict(
            garbage in "\\PC*",
            valid in 0..MINUTES_PER_DAY,
        ) {
            prop_assume!(parse_time_of_day(&garbage).is_err());
            let valid = format_time_of_day(valid);
            for rule in [
                OverlapRule::Interval { duration: 90, buffer: 15 },
                OverlapRule::Proximity { window: 120 },
            ] {
                prop_assert!(rule.conflicts(&garbage, &valid));
                prop_assert!(rule.conflicts(&valid, &garbage));
            }
        }
    }
}
