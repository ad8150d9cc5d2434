//! Dragon Quest IX main RAM layout
//!
//! Fixed offsets of the bag tables and gold counters for the supported game
//! build, expressed as data so the whole layout can be checked at startup.
//! Addresses are offsets into the console's 4 MiB main RAM.

use std::collections::BTreeMap;
use std::fmt;
use std::ops::Range;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::classify::{self, EquipmentCategory};

/// Item code marking an unoccupied slot
pub const EMPTY_SLOT: u32 = 0xFFFF;

/// Largest stack a slot's count byte may hold
pub const MAX_STACK: u8 = 99;

/// Gold counters saturate here
pub const MAX_GOLD: u32 = 999_999_999;

/// Size of the console's main RAM
pub const MAIN_RAM_SIZE: u32 = 0x40_0000;

/// Highest vocation id the game assigns
pub const MAX_VOCATION: u8 = 12;

/// Party members with a vocation slot
pub const PARTY_SIZE: usize = 4;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LayoutError {
    #[error("{table}: {region} region has element width {actual}, expected {expected}")]
    BadWidth {
        table: Category,
        region: &'static str,
        expected: u8,
        actual: u8,
    },

    #[error("{0}: table has no slots")]
    EmptyTable(Category),

    #[error("Regions overlap: {first} and {second}")]
    OverlappingRegions { first: String, second: String },

    #[error("{label} ends at {end:#x}, past the end of main RAM")]
    OutOfRange { label: String, end: u64 },

    #[error("Classification rules overlap: {first} and {second}")]
    OverlappingRules { first: String, second: String },

    #[error("Vocation limit must be between 1 and 255, got {0}")]
    BadVocationLimit(u8),
}

/// Inventory table a slot item is stored in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Common,
    Weapons,
    Shields,
    Torso,
    Legs,
    Headwear,
    Arms,
    Footwear,
    Accessories,
    Important,
}

impl Category {
    /// All categories in memory order
    pub const ALL: [Category; 10] = [
        Category::Common,
        Category::Weapons,
        Category::Shields,
        Category::Torso,
        Category::Legs,
        Category::Headwear,
        Category::Arms,
        Category::Footwear,
        Category::Accessories,
        Category::Important,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Common => "common",
            Self::Weapons => "weapons",
            Self::Shields => "shields",
            Self::Torso => "torso",
            Self::Legs => "legs",
            Self::Headwear => "headwear",
            Self::Arms => "arms",
            Self::Footwear => "footwear",
            Self::Accessories => "accessories",
            Self::Important => "important",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for Category {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("Unknown category: {}", s))
    }
}

impl From<EquipmentCategory> for Category {
    fn from(category: EquipmentCategory) -> Self {
        match category {
            EquipmentCategory::Weapons => Self::Weapons,
            EquipmentCategory::Shields => Self::Shields,
            EquipmentCategory::Torso => Self::Torso,
            EquipmentCategory::Legs => Self::Legs,
            EquipmentCategory::Headwear => Self::Headwear,
            EquipmentCategory::Arms => Self::Arms,
            EquipmentCategory::Footwear => Self::Footwear,
            EquipmentCategory::Accessories => Self::Accessories,
        }
    }
}

/// An array of fixed-width little-endian integers in main RAM
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryRegion {
    pub base_address: u32,
    pub element_width: u8,
}

impl MemoryRegion {
    pub const fn new(base_address: u32, element_width: u8) -> Self {
        Self {
            base_address,
            element_width,
        }
    }

    /// Address of element `index`
    pub fn address_of(&self, index: u32) -> u32 {
        self.base_address + index * u32::from(self.element_width)
    }

    /// Byte range covered by `count` elements
    pub fn span(&self, count: u32) -> Range<u32> {
        self.base_address..self.address_of(count)
    }
}

/// One bag: parallel item-code and count arrays of `capacity` slots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryTable {
    pub item_codes: MemoryRegion,
    pub counts: MemoryRegion,
    pub capacity: u32,
    pub empty_sentinel: u32,
}

impl CategoryTable {
    /// A bag with 2-byte item codes and 1-byte counts
    pub const fn bag(item_codes: u32, counts: u32, capacity: u32) -> Self {
        Self {
            item_codes: MemoryRegion::new(item_codes, 2),
            counts: MemoryRegion::new(counts, 1),
            capacity,
            empty_sentinel: EMPTY_SLOT,
        }
    }
}

/// A single integer in main RAM
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScalarField {
    pub address: u32,
    pub width: u8,
}

pub const GOLD_IN_BANK: ScalarField = ScalarField {
    address: 0x0F6D44,
    width: 4,
};

pub const GOLD_AT_HAND: ScalarField = ScalarField {
    address: 0x0F6D48,
    width: 4,
};

/// Bag tables of the supported build, in memory order
pub const CATEGORY_TABLES: &[(Category, CategoryTable)] = &[
    (Category::Common, CategoryTable::bag(0x0F5DE8, 0x0F5F18, 152)),
    (Category::Weapons, CategoryTable::bag(0x0F5FB0, 0x0F61D0, 272)),
    (Category::Shields, CategoryTable::bag(0x0F62E0, 0x0F6340, 48)),
    (Category::Torso, CategoryTable::bag(0x0F6370, 0x0F64F0, 192)),
    (Category::Legs, CategoryTable::bag(0x0F65B0, 0x0F6670, 96)),
    (Category::Headwear, CategoryTable::bag(0x0F66D0, 0x0F67F0, 144)),
    (Category::Arms, CategoryTable::bag(0x0F6880, 0x0F6920, 80)),
    (Category::Footwear, CategoryTable::bag(0x0F6970, 0x0F6A50, 112)),
    (Category::Accessories, CategoryTable::bag(0x0F6AC0, 0x0F6B40, 64)),
    (Category::Important, CategoryTable::bag(0x0F6BEC, 0x0F6CA8, 94)),
];

fn default_max_vocation() -> u8 {
    MAX_VOCATION
}

/// Where each party member's vocation id and per-vocation experience live.
///
/// Not part of the built-in layout: these offsets have to be supplied for the
/// game build in use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExperienceLayout {
    /// Address of each party member's 1-byte vocation id (0 = none)
    pub vocation_addresses: [u32; PARTY_SIZE],
    /// Start of each party member's array of 4-byte experience values, one per vocation
    pub experience_bases: [u32; PARTY_SIZE],
    #[serde(default = "default_max_vocation")]
    pub max_vocation: u8,
}

impl ExperienceLayout {
    /// Experience address for a party member's vocation (`vocation` is 1-based)
    pub fn experience_address(&self, member: usize, vocation: u8) -> u32 {
        self.experience_bases[member] + (u32::from(vocation) - 1) * 4
    }
}

/// Complete memory layout used by the inventory engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameLayout {
    pub tables: BTreeMap<Category, CategoryTable>,
    pub gold_at_hand: ScalarField,
    pub gold_in_bank: ScalarField,
    pub experience: Option<ExperienceLayout>,
}

impl GameLayout {
    /// Layout of the supported Dragon Quest IX build
    pub fn dqix() -> Self {
        Self {
            tables: CATEGORY_TABLES.iter().copied().collect(),
            gold_at_hand: GOLD_AT_HAND,
            gold_in_bank: GOLD_IN_BANK,
            experience: None,
        }
    }

    #[must_use]
    pub fn with_experience(mut self, experience: ExperienceLayout) -> Self {
        self.experience = Some(experience);
        self
    }

    pub fn table(&self, category: Category) -> Option<&CategoryTable> {
        self.tables.get(&category)
    }

    /// Every labelled byte range the layout touches, widened so that
    /// configured addresses near `u32::MAX` cannot overflow
    fn spans(&self) -> Vec<(String, Range<u64>)> {
        fn span(start: u32, len: u64) -> Range<u64> {
            let start = u64::from(start);
            start..start + len
        }

        let mut spans = Vec::new();
        for (category, table) in &self.tables {
            let capacity = u64::from(table.capacity);
            spans.push((
                format!("{} item codes", category),
                span(
                    table.item_codes.base_address,
                    capacity * u64::from(table.item_codes.element_width),
                ),
            ));
            spans.push((
                format!("{} counts", category),
                span(
                    table.counts.base_address,
                    capacity * u64::from(table.counts.element_width),
                ),
            ));
        }
        let scalars = [
            ("gold at hand", self.gold_at_hand),
            ("gold in bank", self.gold_in_bank),
        ];
        for (label, field) in scalars {
            spans.push((label.to_string(), span(field.address, u64::from(field.width))));
        }

        if let Some(exp) = &self.experience {
            for member in 0..PARTY_SIZE {
                spans.push((
                    format!("member {} vocation", member),
                    span(exp.vocation_addresses[member], 1),
                ));
                spans.push((
                    format!("member {} experience", member),
                    span(exp.experience_bases[member], u64::from(exp.max_vocation) * 4),
                ));
            }
        }
        spans
    }

    /// Check widths, bounds and disjointness of every region, and the classification rules
    pub fn validate(&self) -> Result<(), LayoutError> {
        for (&category, table) in &self.tables {
            if table.capacity == 0 {
                return Err(LayoutError::EmptyTable(category));
            }
            if table.item_codes.element_width != 2 {
                return Err(LayoutError::BadWidth {
                    table: category,
                    region: "item code",
                    expected: 2,
                    actual: table.item_codes.element_width,
                });
            }
            if table.counts.element_width != 1 {
                return Err(LayoutError::BadWidth {
                    table: category,
                    region: "count",
                    expected: 1,
                    actual: table.counts.element_width,
                });
            }
        }

        if let Some(exp) = &self.experience {
            if exp.max_vocation == 0 {
                return Err(LayoutError::BadVocationLimit(exp.max_vocation));
            }
        }

        let spans = self.spans();
        for (label, span) in &spans {
            if span.end > u64::from(MAIN_RAM_SIZE) {
                return Err(LayoutError::OutOfRange {
                    label: label.clone(),
                    end: span.end,
                });
            }
        }
        for (i, (first, a)) in spans.iter().enumerate() {
            for (second, b) in spans.iter().skip(i + 1) {
                if a.start < b.end && b.start < a.end {
                    return Err(LayoutError::OverlappingRegions {
                        first: first.clone(),
                        second: second.clone(),
                    });
                }
            }
        }

        classify::validate_rules()
    }
}

impl Default for GameLayout {
    fn default() -> Self {
        Self::dqix()
    }
}
