//! Item code classification
//!
//! Item codes are opaque integers whose numeric range decides what kind of
//! item they are. Both levels of classification are ordered lists of
//! half-open `(start, end, tag)` rules tested first-match-wins, so adding a
//! category is a data change and overlaps can be checked mechanically.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::layout::LayoutError;

/// Numeric item identifier as delivered by the multiworld service
pub type ItemCode = u32;

/// What a received item does to the save state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Currency,
    Experience,
    Equipment,
    KeyItem,
    Consumable,
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Currency => write!(f, "gold"),
            Self::Experience => write!(f, "experience"),
            Self::Equipment => write!(f, "equipment"),
            Self::KeyItem => write!(f, "important item"),
            Self::Consumable => write!(f, "item"),
        }
    }
}

/// Equipment bag a piece of equipment is stored in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EquipmentCategory {
    Weapons,
    Shields,
    Torso,
    Legs,
    Headwear,
    Arms,
    Footwear,
    Accessories,
}

impl fmt::Display for EquipmentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Weapons => write!(f, "weapons"),
            Self::Shields => write!(f, "shields"),
            Self::Torso => write!(f, "torso"),
            Self::Legs => write!(f, "legs"),
            Self::Headwear => write!(f, "headwear"),
            Self::Arms => write!(f, "arms"),
            Self::Footwear => write!(f, "footwear"),
            Self::Accessories => write!(f, "accessories"),
        }
    }
}

/// First-level code ranges. The bag range is split into key items and
/// consumables by set membership rather than by range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeRange {
    Equipment,
    BagItem,
    Currency,
    Experience,
}

/// A half-open code range `[start, end)` tagged with what it classifies to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeRule<T> {
    pub start: ItemCode,
    pub end: ItemCode,
    pub tag: T,
}

impl<T> RangeRule<T> {
    pub const fn new(start: ItemCode, end: ItemCode, tag: T) -> Self {
        Self { start, end, tag }
    }

    pub fn contains(&self, code: ItemCode) -> bool {
        self.start <= code && code < self.end
    }

    pub fn overlaps<U>(&self, other: &RangeRule<U>) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// Item kind ranges, tested in order
pub const ITEM_KIND_RULES: &[RangeRule<CodeRange>] = &[
    RangeRule::new(12000, 22000, CodeRange::Equipment),
    RangeRule::new(22000, 23000, CodeRange::BagItem),
    RangeRule::new(100000, 100010, CodeRange::Currency),
    RangeRule::new(100010, 100020, CodeRange::Experience),
];

/// Equipment category ranges, tested in order.
///
/// Gaps (12000..12100, 14000..15000, ...) are unused codes and classify to nothing.
pub const EQUIPMENT_RULES: &[RangeRule<EquipmentCategory>] = &[
    RangeRule::new(12100, 13000, EquipmentCategory::Headwear),
    RangeRule::new(13000, 14000, EquipmentCategory::Torso),
    RangeRule::new(15000, 15300, EquipmentCategory::Arms),
    RangeRule::new(16000, 16400, EquipmentCategory::Legs),
    RangeRule::new(17000, 17500, EquipmentCategory::Footwear),
    RangeRule::new(18000, 18055, EquipmentCategory::Accessories),
    RangeRule::new(19050, 21000, EquipmentCategory::Weapons),
    RangeRule::new(21000, 22000, EquipmentCategory::Shields),
];

fn lookup<T: Copy>(rules: &[RangeRule<T>], code: ItemCode) -> Option<T> {
    rules.iter().find(|r| r.contains(code)).map(|r| r.tag)
}

/// Codes in the bag range that belong in the important-items table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyItems(BTreeSet<ItemCode>);

impl KeyItems {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, code: ItemCode) -> bool {
        self.0.contains(&code)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<ItemCode> for KeyItems {
    fn from_iter<I: IntoIterator<Item = ItemCode>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Classify an item code, or `None` if no range claims it
pub fn classify_item(code: ItemCode, key_items: &KeyItems) -> Option<ItemKind> {
    Some(match lookup(ITEM_KIND_RULES, code)? {
        CodeRange::Equipment => ItemKind::Equipment,
        CodeRange::BagItem if key_items.contains(code) => ItemKind::KeyItem,
        CodeRange::BagItem => ItemKind::Consumable,
        CodeRange::Currency => ItemKind::Currency,
        CodeRange::Experience => ItemKind::Experience,
    })
}

/// Equipment bag for an equipment code, or `None` for unused codes
pub fn classify_equipment(code: ItemCode) -> Option<EquipmentCategory> {
    lookup(EQUIPMENT_RULES, code)
}

/// Find the first pair of overlapping rules, by index
pub fn find_overlap<T>(rules: &[RangeRule<T>]) -> Option<(usize, usize)> {
    for (i, a) in rules.iter().enumerate() {
        for (j, b) in rules.iter().enumerate().skip(i + 1) {
            if a.overlaps(b) {
                return Some((i, j));
            }
        }
    }
    None
}

/// Check that both rule lists are internally disjoint and that every
/// equipment rule lies inside the equipment kind range
pub fn validate_rules() -> Result<(), LayoutError> {
    if let Some((i, j)) = find_overlap(ITEM_KIND_RULES) {
        return Err(LayoutError::OverlappingRules {
            first: format!("{:?}", ITEM_KIND_RULES[i]),
            second: format!("{:?}", ITEM_KIND_RULES[j]),
        });
    }
    if let Some((i, j)) = find_overlap(EQUIPMENT_RULES) {
        return Err(LayoutError::OverlappingRules {
            first: format!("{:?}", EQUIPMENT_RULES[i]),
            second: format!("{:?}", EQUIPMENT_RULES[j]),
        });
    }

    for rule in EQUIPMENT_RULES {
        let inside = ITEM_KIND_RULES.iter().any(|kind| {
            kind.tag == CodeRange::Equipment && kind.start <= rule.start && rule.end <= kind.end
        });
        if !inside {
            return Err(LayoutError::OverlappingRules {
                first: format!("{rule:?}"),
                second: "equipment code range".to_string(),
            });
        }
    }
    Ok(())
}

// ============================================================================
// Reward tiers
// ============================================================================

/// Fixed amount granted by a currency or experience item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RewardTier {
    pub code: ItemCode,
    pub amount: u32,
}

/// Gold pouches
pub const GOLD_REWARDS: &[RewardTier] = &[
    RewardTier { code: 100000, amount: 50 },
    RewardTier { code: 100001, amount: 500 },
    RewardTier { code: 100002, amount: 5000 },
    RewardTier { code: 100003, amount: 50000 },
];

/// Experience orbs
pub const EXPERIENCE_REWARDS: &[RewardTier] = &[
    RewardTier { code: 100010, amount: 50 },
    RewardTier { code: 100011, amount: 4096 },
    RewardTier { code: 100012, amount: 12288 },
    RewardTier { code: 100013, amount: 40200 },
];

/// Gold granted by a currency item code
pub fn gold_reward(code: ItemCode) -> Option<u32> {
    GOLD_REWARDS.iter().find(|r| r.code == code).map(|r| r.amount)
}

/// Experience granted by an experience item code
pub fn experience_reward(code: ItemCode) -> Option<u32> {
    EXPERIENCE_REWARDS.iter().find(|r| r.code == code).map(|r| r.amount)
}
