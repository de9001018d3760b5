use anyhow::{anyhow, Result};

/// One labeled, scored object found in a frame.
///
/// Geometry is normalized to 0..1 of the frame; the counting path only looks
/// at `class`.
#[derive(Clone, Debug)]
pub struct Detection {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
    pub confidence: f32,
    pub class: ObjectClass,
}

impl Detection {
    /// A detection with a centered placeholder box. Used by the stub backend
    /// and tests, where only class and confidence matter.
    pub fn centered(class: ObjectClass, confidence: f32) -> Self {
        Self {
            x: 0.4,
            y: 0.4,
            w: 0.2,
            h: 0.2,
            confidence,
            class,
        }
    }
}

#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ObjectClass {
    Person,
    Vehicle,
    Animal,
    Package,
    Unknown,
}

impl ObjectClass {
    /// Map a detector label onto a class. Accepts our canonical class names
    /// plus the common COCO labels; anything else is `Unknown`.
    pub fn from_label(label: &str) -> Self {
        match label.to_ascii_lowercase().as_str() {
            "person" => ObjectClass::Person,
            "vehicle" | "bicycle" | "car" | "motorcycle" | "bus" | "truck" => ObjectClass::Vehicle,
            "animal" | "bird" | "cat" | "dog" | "horse" | "sheep" | "cow" => ObjectClass::Animal,
            "package" | "backpack" | "handbag" | "suitcase" => ObjectClass::Package,
            _ => ObjectClass::Unknown,
        }
    }

    /// Map a COCO class index onto a class (YOLO/SSD-style models).
    pub fn from_coco_id(id: usize) -> Self {
        match id {
            0 => ObjectClass::Person,
            1..=3 | 5 | 7 => ObjectClass::Vehicle,
            14..=23 => ObjectClass::Animal,
            24 | 26 | 28 => ObjectClass::Package,
            _ => ObjectClass::Unknown,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ObjectClass::Person => "person",
            ObjectClass::Vehicle => "vehicle",
            ObjectClass::Animal => "animal",
            ObjectClass::Package => "package",
            ObjectClass::Unknown => "unknown",
        }
    }

    /// Parse a configured target class. Rejects labels that do not map to a
    /// countable class, so a typo fails at startup instead of counting zero
    /// forever.
    pub fn parse_target(label: &str) -> Result<Self> {
        match Self::from_label(label) {
            ObjectClass::Unknown => Err(anyhow!("unknown target class '{}'", label)),
            class => Ok(class),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_round_trip_for_canonical_names() {
        for class in [
            ObjectClass::Person,
            ObjectClass::Vehicle,
            ObjectClass::Animal,
            ObjectClass::Package,
        ] {
            assert_eq!(ObjectClass::from_label(class.label()), class);
        }
    }

    #[test]
    fn coco_labels_map_to_classes() {
        assert_eq!(ObjectClass::from_label("Person"), ObjectClass::Person);
        assert_eq!(ObjectClass::from_label("truck"), ObjectClass::Vehicle);
        assert_eq!(ObjectClass::from_label("dog"), ObjectClass::Animal);
        assert_eq!(ObjectClass::from_label("toaster"), ObjectClass::Unknown);
    }

    #[test]
    fn coco_ids_map_to_classes() {
        assert_eq!(ObjectClass::from_coco_id(0), ObjectClass::Person);
        assert_eq!(ObjectClass::from_coco_id(2), ObjectClass::Vehicle);
        assert_eq!(ObjectClass::from_coco_id(16), ObjectClass::Animal);
        assert_eq!(ObjectClass::from_coco_id(63), ObjectClass::Unknown);
    }

    #[test]
    fn parse_target_rejects_unknown_labels() {
        assert_eq!(
            ObjectClass::parse_target("person").expect("person parses"),
            ObjectClass::Person
        );
        assert!(ObjectClass::parse_target("toaster").is_err());
    }
}
