//! Lipid test codes and their clinical categories.
//!
//! Categories are closed per code: an LDL value can never be `desirable` and a CHOL value can
//! never be `optimal`. [`Category`] wraps the per-code enums so callers can handle any result
//! uniformly, with [`Category::Unknown`] for labels outside the canonical set.

use std::fmt;
use std::str::FromStr;

/// Canonical lipid panel test code.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    serde::Serialize,
    serde::Deserialize,
    utoipa::ToSchema,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum LipidCode {
    /// Total cholesterol
    Chol,
    /// Low-density lipoprotein cholesterol
    Ldl,
    /// High-density lipoprotein cholesterol
    Hdl,
    /// Triglycerides
    Tg,
}

impl LipidCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            LipidCode::Chol => "CHOL",
            LipidCode::Ldl => "LDL",
            LipidCode::Hdl => "HDL",
            LipidCode::Tg => "TG",
        }
    }
}

impl fmt::Display for LipidCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a label is not one of the four canonical codes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown lipid code: {0}")]
pub struct UnknownCode(pub String);

impl FromStr for LipidCode {
    type Err = UnknownCode;

    /// Parses an exact canonical code, ignoring case and surrounding whitespace.
    ///
    /// Aliases such as `Triglycerides` are not accepted here; alias handling belongs to the
    /// reading normaliser.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CHOL" => Ok(LipidCode::Chol),
            "LDL" => Ok(LipidCode::Ldl),
            "HDL" => Ok(LipidCode::Hdl),
            "TG" => Ok(LipidCode::Tg),
            _ => Err(UnknownCode(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CholCategory {
    Desirable,
    BorderlineHigh,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LdlCategory {
    Optimal,
    NearOptimal,
    BorderlineHigh,
    High,
    VeryHigh,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HdlCategory {
    Low,
    Acceptable,
    Protective,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TgCategory {
    Normal,
    BorderlineHigh,
    High,
    VeryHigh,
}

/// Clinical interpretation bucket for a single reading.
///
/// Serialises as its hyphenated slug, e.g. `"borderline-high"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Chol(CholCategory),
    Ldl(LdlCategory),
    Hdl(HdlCategory),
    Tg(TgCategory),
    Unknown,
}

impl Category {
    /// Hyphenated slug, e.g. `near-optimal`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Chol(c) => match c {
                CholCategory::Desirable => "desirable",
                CholCategory::BorderlineHigh => "borderline-high",
                CholCategory::High => "high",
            },
            Category::Ldl(c) => match c {
                LdlCategory::Optimal => "optimal",
                LdlCategory::NearOptimal => "near-optimal",
                LdlCategory::BorderlineHigh => "borderline-high",
                LdlCategory::High => "high",
                LdlCategory::VeryHigh => "very-high",
            },
            Category::Hdl(c) => match c {
                HdlCategory::Low => "low",
                HdlCategory::Acceptable => "acceptable",
                HdlCategory::Protective => "protective",
            },
            Category::Tg(c) => match c {
                TgCategory::Normal => "normal",
                TgCategory::BorderlineHigh => "borderline-high",
                TgCategory::High => "high",
                TgCategory::VeryHigh => "very-high",
            },
            Category::Unknown => "unknown",
        }
    }

    /// The slug with hyphens replaced by spaces, for use in sentences.
    pub fn words(&self) -> String {
        self.as_str().replace('-', " ")
    }

    /// Whether a reading in this category deserves a highlight.
    ///
    /// Only borderline-high, high, very-high and low qualify.
    pub fn is_notable(&self) -> bool {
        matches!(
            self.as_str(),
            "borderline-high" | "high" | "very-high" | "low"
        )
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl serde::Serialize for Category {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}
