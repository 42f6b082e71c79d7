//! Threshold classification of lipid values.
//!
//! Every band is half-open: the lower bound belongs to the next tier up, so LDL 130 is
//! borderline-high while LDL 129.999 is still near-optimal.

use crate::constants::*;
use lipid_types::{Category, CholCategory, HdlCategory, LdlCategory, LipidCode, TgCategory};

/// Classifies a value for a canonical code.
pub fn classify(code: LipidCode, value: f64) -> Category {
    match code {
        LipidCode::Chol => Category::Chol(if value < CHOL_BORDERLINE_FROM {
            CholCategory::Desirable
        } else if value < CHOL_HIGH_FROM {
            CholCategory::BorderlineHigh
        } else {
            CholCategory::High
        }),
        LipidCode::Ldl => Category::Ldl(if value < LDL_NEAR_OPTIMAL_FROM {
            LdlCategory::Optimal
        } else if value < LDL_BORDERLINE_FROM {
            LdlCategory::NearOptimal
        } else if value < LDL_HIGH_FROM {
            LdlCategory::BorderlineHigh
        } else if value < LDL_VERY_HIGH_FROM {
            LdlCategory::High
        } else {
            LdlCategory::VeryHigh
        }),
        LipidCode::Hdl => Category::Hdl(if value < HDL_ACCEPTABLE_FROM {
            HdlCategory::Low
        } else if value < HDL_PROTECTIVE_FROM {
            HdlCategory::Acceptable
        } else {
            HdlCategory::Protective
        }),
        LipidCode::Tg => Category::Tg(if value < TG_BORDERLINE_FROM {
            TgCategory::Normal
        } else if value < TG_HIGH_FROM {
            TgCategory::BorderlineHigh
        } else if value < TG_VERY_HIGH_FROM {
            TgCategory::High
        } else {
            TgCategory::VeryHigh
        }),
    }
}

/// Classifies a value for a raw label.
///
/// Labels that are not exactly one of the canonical codes yield [`Category::Unknown`].
pub fn classify_label(label: &str, value: f64) -> Category {
    match label.parse::<LipidCode>() {
        Ok(code) => classify(code, value),
        Err(_) => Category::Unknown,
    }
}

/// The highlight sentence for a reading, if its category is notable.
pub fn highlight(code: LipidCode, category: Category) -> Option<String> {
    category
        .is_notable()
        .then(|| format!("{} looks {}.", code, category.words()))
}
