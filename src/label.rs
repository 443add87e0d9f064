//! The fixed class table of the pretrained PPE model.
//!
//! The model emits class ids `0..10`; the table below pairs each id with its
//! label. Order matters: it mirrors the label list the model was trained
//! with, so reordering entries silently mislabels detections.

use anyhow::Result;
use image::Rgb;

use crate::SentinelError;

/// Number of classes the pretrained model knows.
pub const CLASS_COUNT: usize = 10;

/// One known class of the PPE model.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ClassLabel {
    Hardhat,
    Mask,
    Person,
    SafetyVest,
    NoMask,
    NoHardhat,
    SafetyCone,
    NoSafetyVest,
    Machinery,
    Vehicle,
}

/// Class id → label, in model output order.
pub const CLASS_TABLE: [ClassLabel; CLASS_COUNT] = [
    ClassLabel::Hardhat,
    ClassLabel::Mask,
    ClassLabel::Person,
    ClassLabel::SafetyVest,
    ClassLabel::NoMask,
    ClassLabel::NoHardhat,
    ClassLabel::SafetyCone,
    ClassLabel::NoSafetyVest,
    ClassLabel::Machinery,
    ClassLabel::Vehicle,
];

/// Annotation colors (RGB).
pub const COLOR_VIOLATION: Rgb<u8> = Rgb([255, 0, 0]);
pub const COLOR_COMPLIANT: Rgb<u8> = Rgb([0, 255, 0]);
pub const COLOR_PERSON: Rgb<u8> = Rgb([0, 255, 255]);
pub const COLOR_MISC: Rgb<u8> = Rgb([0, 0, 255]);

impl ClassLabel {
    /// Resolve a model class id against the table.
    ///
    /// An out-of-range id means the model and this table are mismatched.
    /// That is a contract violation, not a per-detection glitch, so the
    /// caller is expected to abort the run.
    pub fn from_class_id(class_id: usize) -> Result<Self> {
        CLASS_TABLE
            .get(class_id)
            .copied()
            .ok_or_else(|| SentinelError::ModelContractViolation { class_id }.into())
    }

    /// The label string as the model's training data spells it.
    pub fn name(self) -> &'static str {
        match self {
            ClassLabel::Hardhat => "Hardhat",
            ClassLabel::Mask => "Mask",
            ClassLabel::Person => "Person",
            ClassLabel::SafetyVest => "Safety Vest",
            ClassLabel::NoMask => "NO-Mask",
            ClassLabel::NoHardhat => "NO-Hardhat",
            ClassLabel::SafetyCone => "Safety Cone",
            ClassLabel::NoSafetyVest => "NO-Safety Vest",
            ClassLabel::Machinery => "machinery",
            ClassLabel::Vehicle => "vehicle",
        }
    }

    /// A label denoting absence of required equipment.
    pub fn is_violation(self) -> bool {
        matches!(
            self,
            ClassLabel::NoHardhat | ClassLabel::NoMask | ClassLabel::NoSafetyVest
        )
    }

    /// Worn PPE detected as present.
    pub fn is_compliant_ppe(self) -> bool {
        matches!(
            self,
            ClassLabel::Hardhat | ClassLabel::Mask | ClassLabel::SafetyVest
        )
    }

    /// Both the present and the missing variant of the helmet category.
    pub fn is_hardhat_category(self) -> bool {
        matches!(self, ClassLabel::Hardhat | ClassLabel::NoHardhat)
    }

    /// Both variants of the mask category.
    pub fn is_mask_category(self) -> bool {
        matches!(self, ClassLabel::Mask | ClassLabel::NoMask)
    }

    /// Both variants of the vest category.
    pub fn is_vest_category(self) -> bool {
        matches!(self, ClassLabel::SafetyVest | ClassLabel::NoSafetyVest)
    }

    /// Display color for annotations.
    ///
    /// Total by construction: the match is exhaustive over the enum, so a
    /// class that reaches rendering always has exactly one color. Missing
    /// equipment draws attention in red; compliant equipment reads green.
    pub fn display_color(self) -> Rgb<u8> {
        match self {
            ClassLabel::NoHardhat | ClassLabel::NoMask | ClassLabel::NoSafetyVest => {
                COLOR_VIOLATION
            }
            ClassLabel::Hardhat | ClassLabel::Mask | ClassLabel::SafetyVest => COLOR_COMPLIANT,
            ClassLabel::Person => COLOR_PERSON,
            ClassLabel::SafetyCone | ClassLabel::Machinery | ClassLabel::Vehicle => COLOR_MISC,
        }
    }
}

impl std::fmt::Display for ClassLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_ids_resolve_in_table_order() -> Result<()> {
        assert_eq!(ClassLabel::from_class_id(0)?, ClassLabel::Hardhat);
        assert_eq!(ClassLabel::from_class_id(5)?, ClassLabel::NoHardhat);
        assert_eq!(ClassLabel::from_class_id(9)?, ClassLabel::Vehicle);
        Ok(())
    }

    #[test]
    fn out_of_range_class_id_is_a_contract_violation() {
        let err = ClassLabel::from_class_id(CLASS_COUNT).unwrap_err();
        assert_eq!(
            err.downcast_ref::<SentinelError>(),
            Some(&SentinelError::ModelContractViolation {
                class_id: CLASS_COUNT
            })
        );
    }

    #[test]
    fn every_label_maps_to_exactly_one_partition_color() {
        for label in CLASS_TABLE {
            let color = label.display_color();
            let expected = if label.is_violation() {
                COLOR_VIOLATION
            } else if label.is_compliant_ppe() {
                COLOR_COMPLIANT
            } else if label == ClassLabel::Person {
                COLOR_PERSON
            } else {
                COLOR_MISC
            };
            assert_eq!(color, expected, "color partition broken for {label}");
        }
    }

    #[test]
    fn violation_and_compliant_sets_are_disjoint() {
        for label in CLASS_TABLE {
            assert!(
                !(label.is_violation() && label.is_compliant_ppe()),
                "{label} cannot be both"
            );
        }
    }

    #[test]
    fn category_predicates_cover_both_variants() {
        assert!(ClassLabel::Hardhat.is_hardhat_category());
        assert!(ClassLabel::NoHardhat.is_hardhat_category());
        assert!(ClassLabel::Mask.is_mask_category());
        assert!(ClassLabel::NoMask.is_mask_category());
        assert!(ClassLabel::SafetyVest.is_vest_category());
        assert!(ClassLabel::NoSafetyVest.is_vest_category());
        assert!(!ClassLabel::Person.is_hardhat_category());
        assert!(!ClassLabel::SafetyCone.is_vest_category());
    }

    #[test]
    fn display_names_match_model_label_strings() {
        assert_eq!(ClassLabel::NoHardhat.name(), "NO-Hardhat");
        assert_eq!(ClassLabel::SafetyVest.name(), "Safety Vest");
        assert_eq!(ClassLabel::Machinery.name(), "machinery");
    }
}
