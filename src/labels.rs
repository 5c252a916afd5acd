//! Class labels and their fixed name and ledger-code tables.
//!
//! The ensemble, the sorter and the ledger all resolve labels through this
//! module so the index, folder and code mappings cannot drift apart.

use crate::constants::UNCERTAIN_CODE;
use crate::error::Error;
use serde::{Deserialize, Serialize};

/// Outcome of classifying one image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ClassLabel {
    /// Red deer.
    Deer,
    /// Musk deer.
    MuskDeer,
    /// Roe deer.
    RoeDeer,
    /// Top fused probability below the confidence threshold.
    Uncertain,
}

/// Trained species in model output order.
pub const SPECIES: [ClassLabel; 3] = [ClassLabel::Deer, ClassLabel::MuskDeer, ClassLabel::RoeDeer];

/// Every label, in destination folder order.
pub const ALL: [ClassLabel; 4] = [
    ClassLabel::Deer,
    ClassLabel::MuskDeer,
    ClassLabel::RoeDeer,
    ClassLabel::Uncertain,
];

impl ClassLabel {
    /// Model output index of a species, `None` for uncertain.
    pub const fn index(self) -> Option<usize> {
        match self {
            Self::Deer => Some(0),
            Self::MuskDeer => Some(1),
            Self::RoeDeer => Some(2),
            Self::Uncertain => None,
        }
    }

    /// Species at a model output index.
    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Self::Deer),
            1 => Some(Self::MuskDeer),
            2 => Some(Self::RoeDeer),
            _ => None,
        }
    }

    /// Stable English identifier.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Deer => "deer",
            Self::MuskDeer => "musk-deer",
            Self::RoeDeer => "roe-deer",
            Self::Uncertain => "uncertain",
        }
    }

    /// Name of the class bucket under the destination root.
    ///
    /// These are the folder names existing folder browsers look for.
    pub const fn folder_name(self) -> &'static str {
        match self {
            Self::Deer => "Олень",
            Self::MuskDeer => "Кабарга",
            Self::RoeDeer => "Косуля",
            Self::Uncertain => "Низкая уверенность",
        }
    }

    /// Whether this is one of the trained species.
    pub const fn is_species(self) -> bool {
        !matches!(self, Self::Uncertain)
    }
}

impl std::fmt::Display for ClassLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for ClassLabel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['_', ' '], "-");
        match normalized.as_str() {
            "deer" | "red-deer" | "олень" => Ok(Self::Deer),
            "musk-deer" | "muskdeer" | "musk" | "кабарга" => Ok(Self::MuskDeer),
            "roe-deer" | "roedeer" | "roe" | "косуля" => Ok(Self::RoeDeer),
            "uncertain" | "низкая-уверенность" => Ok(Self::Uncertain),
            _ => Err(Error::UnknownClass {
                value: s.to_string(),
            }),
        }
    }
}

/// Numeric class codes written to the ledger.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum CodeScheme {
    /// Codes consumed by existing downstream tooling: musk-deer 0, roe-deer 1, deer 2.
    #[default]
    Legacy,
    /// Codes equal to the model output index: deer 0, musk-deer 1, roe-deer 2.
    Index,
}

impl CodeScheme {
    /// Ledger code for a label. Uncertain maps to [`UNCERTAIN_CODE`] in every scheme.
    pub const fn code(self, label: ClassLabel) -> i32 {
        match (self, label) {
            (_, ClassLabel::Uncertain) => UNCERTAIN_CODE,
            (Self::Legacy, ClassLabel::MuskDeer) | (Self::Index, ClassLabel::Deer) => 0,
            (Self::Legacy, ClassLabel::RoeDeer) | (Self::Index, ClassLabel::MuskDeer) => 1,
            (Self::Legacy, ClassLabel::Deer) | (Self::Index, ClassLabel::RoeDeer) => 2,
        }
    }

    /// Inverse of [`CodeScheme::code`].
    pub fn label(self, code: i32) -> Option<ClassLabel> {
        ALL.into_iter().find(|label| self.code(*label) == code)
    }
}

impl std::fmt::Display for CodeScheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Legacy => write!(f, "legacy"),
            Self::Index => write!(f, "index"),
        }
    }
}
