//! Core domain types: chemical records and the green-hazard tier scale.

use serde::{Deserialize, Serialize};

/// Green-procurement hazard tier. Ordinal: `Tier1` is the lowest hazard,
/// `Tier4` the highest. Source labels that do not parse map to `Unknown`
/// explicitly, never to a default tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HazardTier {
    Tier1,
    Tier2,
    Tier3,
    Tier4,
    Unknown,
}

impl HazardTier {
    /// Parse a source-data label ("1级".."4级"). Blank or unrecognized
    /// values yield `Unknown`.
    pub fn from_label(raw: &str) -> Self {
        match raw.trim() {
            "1级" => Self::Tier1,
            "2级" => Self::Tier2,
            "3级" => Self::Tier3,
            "4级" => Self::Tier4,
            _ => Self::Unknown,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Tier1 => "1级",
            Self::Tier2 => "2级",
            Self::Tier3 => "3级",
            Self::Tier4 => "4级",
            Self::Unknown => "未知",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::Tier1 => "基本无危害物质，可安全使用",
            Self::Tier2 => "低度危害物质，可在特定条件下使用",
            Self::Tier3 => "中度危害物质，建议寻找替代方案",
            Self::Tier4 => "高度危害物质，应优先考虑替代",
            Self::Unknown => "未知危害级别",
        }
    }

    /// Display color, green (safe) through red (hazardous).
    pub fn color(self) -> &'static str {
        match self {
            Self::Tier1 => "#00FF00",
            Self::Tier2 => "#FFFF00",
            Self::Tier3 => "#FFA500",
            Self::Tier4 => "#FF0000",
            Self::Unknown => "#CCCCCC",
        }
    }
}

/// One row of the chemical dataset. Loaded once at startup and held
/// read-only for the lifetime of the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChemicalRecord {
    pub cas_number: String,
    pub name: String,
    pub tier: HazardTier,
    pub usage_limit: String,
    pub regulatory_control: String,
}
