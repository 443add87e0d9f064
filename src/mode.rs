//! Detection modes.
//!
//! The operator restricts rendering to one PPE category (or all). The mode is
//! owned by the UI layer and read by the worker once per detection, not
//! snapshotted per run or per frame, so a change takes effect on the very
//! next detection.

use std::str::FromStr;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use anyhow::anyhow;

use crate::label::ClassLabel;

/// Which detections get rendered.
///
/// Category modes include the violation variant on purpose: selecting
/// "helmets" must keep missing-helmet boxes visible.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[repr(u8)]
pub enum DetectionMode {
    #[default]
    AllItems = 0,
    HelmetsOnly = 1,
    MasksOnly = 2,
    VestsOnly = 3,
}

impl DetectionMode {
    pub const ALL: [DetectionMode; 4] = [
        DetectionMode::AllItems,
        DetectionMode::HelmetsOnly,
        DetectionMode::MasksOnly,
        DetectionMode::VestsOnly,
    ];

    /// Should a detection with this label be rendered?
    ///
    /// Total over every known label and mode.
    pub fn includes(self, label: ClassLabel) -> bool {
        match self {
            DetectionMode::AllItems => true,
            DetectionMode::HelmetsOnly => label.is_hardhat_category(),
            DetectionMode::MasksOnly => label.is_mask_category(),
            DetectionMode::VestsOnly => label.is_vest_category(),
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            1 => DetectionMode::HelmetsOnly,
            2 => DetectionMode::MasksOnly,
            3 => DetectionMode::VestsOnly,
            _ => DetectionMode::AllItems,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            DetectionMode::AllItems => "all",
            DetectionMode::HelmetsOnly => "helmets",
            DetectionMode::MasksOnly => "masks",
            DetectionMode::VestsOnly => "vests",
        }
    }
}

impl FromStr for DetectionMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" | "all-items" => Ok(DetectionMode::AllItems),
            "helmets" | "hardhats" => Ok(DetectionMode::HelmetsOnly),
            "masks" => Ok(DetectionMode::MasksOnly),
            "vests" => Ok(DetectionMode::VestsOnly),
            other => Err(anyhow!(
                "unknown detection mode '{}' (expected all, helmets, masks or vests)",
                other
            )),
        }
    }
}

impl std::fmt::Display for DetectionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Cloneable mode handle shared between the UI layer and the worker.
///
/// A single atomic is all the synchronization the read path needs: the
/// worker loads, the UI stores, and a torn value is impossible.
#[derive(Clone, Debug)]
pub struct SharedMode(Arc<AtomicU8>);

impl SharedMode {
    pub fn new(mode: DetectionMode) -> Self {
        Self(Arc::new(AtomicU8::new(mode as u8)))
    }

    pub fn get(&self) -> DetectionMode {
        DetectionMode::from_u8(self.0.load(Ordering::Relaxed))
    }

    pub fn set(&self, mode: DetectionMode) {
        self.0.store(mode as u8, Ordering::Relaxed);
    }
}

impl Default for SharedMode {
    fn default() -> Self {
        Self::new(DetectionMode::AllItems)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::label::CLASS_TABLE;

    #[test]
    fn filter_is_total_and_all_items_includes_everything() {
        for mode in DetectionMode::ALL {
            for label in CLASS_TABLE {
                // Must return without panicking for every combination.
                let included = mode.includes(label);
                if mode == DetectionMode::AllItems {
                    assert!(included, "AllItems must include {label}");
                }
            }
        }
    }

    #[test]
    fn category_modes_include_both_variants() {
        assert!(DetectionMode::HelmetsOnly.includes(ClassLabel::Hardhat));
        assert!(DetectionMode::HelmetsOnly.includes(ClassLabel::NoHardhat));
        assert!(DetectionMode::MasksOnly.includes(ClassLabel::Mask));
        assert!(DetectionMode::MasksOnly.includes(ClassLabel::NoMask));
        assert!(DetectionMode::VestsOnly.includes(ClassLabel::SafetyVest));
        assert!(DetectionMode::VestsOnly.includes(ClassLabel::NoSafetyVest));
    }

    #[test]
    fn category_modes_exclude_other_categories() {
        assert!(!DetectionMode::HelmetsOnly.includes(ClassLabel::Mask));
        assert!(!DetectionMode::HelmetsOnly.includes(ClassLabel::Person));
        assert!(!DetectionMode::VestsOnly.includes(ClassLabel::NoHardhat));
        assert!(!DetectionMode::MasksOnly.includes(ClassLabel::Vehicle));
    }

    #[test]
    fn parses_mode_names() {
        assert_eq!(
            "helmets".parse::<DetectionMode>().unwrap(),
            DetectionMode::HelmetsOnly
        );
        assert_eq!(
            "All".parse::<DetectionMode>().unwrap(),
            DetectionMode::AllItems
        );
        assert!("goggles".parse::<DetectionMode>().is_err());
    }

    #[test]
    fn shared_mode_round_trips() {
        let shared = SharedMode::new(DetectionMode::AllItems);
        let clone = shared.clone();
        clone.set(DetectionMode::VestsOnly);
        assert_eq!(shared.get(), DetectionMode::VestsOnly);
    }
}
