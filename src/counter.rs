//! Occupancy reduction.
//!
//! Reduces a detector's output to a single occupancy count by filtering to
//! the configured target class. Pure and total: an empty input counts zero.

use crate::detect::{Detection, ObjectClass};

/// Count detections whose class equals the target class.
pub fn count_matching(detections: &[Detection], target: ObjectClass) -> usize {
    detections.iter().filter(|d| d.class == target).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_only_the_target_class() {
        let detections = vec![
            Detection::centered(ObjectClass::Person, 0.9),
            Detection::centered(ObjectClass::Vehicle, 0.8),
            Detection::centered(ObjectClass::Person, 0.7),
            Detection::centered(ObjectClass::Animal, 0.6),
            Detection::centered(ObjectClass::Person, 0.5),
        ];

        assert_eq!(count_matching(&detections, ObjectClass::Person), 3);
        assert_eq!(count_matching(&detections, ObjectClass::Vehicle), 1);
        assert_eq!(count_matching(&detections, ObjectClass::Package), 0);
    }

    #[test]
    fn empty_input_counts_zero() {
        assert_eq!(count_matching(&[], ObjectClass::Person), 0);
    }
}
