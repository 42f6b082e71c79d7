//! Lipid value detection in extracted report text.
//!
//! Lab reports lay out one analyte per row, so detection is a line scan: find a known label,
//! take the first number that follows it on the same line. Values reported in mmol/L are
//! converted to mg/dL so they can be classified against the standard thresholds, unless the
//! row also prints the mg/dL figure, which is then used as is.

use lipid_core::LipidPanel;
use lipid_types::LipidCode;
use regex::Regex;
use std::sync::LazyLock;

/// mg/dL per mmol/L for total, LDL and HDL cholesterol.
pub const CHOLESTEROL_MMOL_TO_MG: f64 = 38.67;
/// mg/dL per mmol/L for triglycerides.
pub const TRIGLYCERIDE_MMOL_TO_MG: f64 = 88.57;

static SKIP_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\bnon[\s-]*hdl|\bvldl\b|\bratio\b|\b(?:chol|ldl|hdl|tg|trig)[\w-]*\s*/\s*(?:chol|ldl|hdl|tg|trig)",
    )
    .expect("skip pattern is valid")
});

static LABELS: LazyLock<Vec<(LipidCode, Regex)>> = LazyLock::new(|| {
    [
        (LipidCode::Ldl, r"(?i)\bldl"),
        (LipidCode::Hdl, r"(?i)\bhdl"),
        (LipidCode::Tg, r"(?i)\btrig|\btg\b"),
        (LipidCode::Chol, r"(?i)\bchol"),
    ]
    .into_iter()
    .map(|(code, pattern)| (code, Regex::new(pattern).expect("label pattern is valid")))
    .collect()
});

/// A number and the unit printed directly after it, if any.
static READING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*(mmol\s*/\s*l|mg\s*/\s*dl)?")
        .expect("reading pattern is valid")
});

#[derive(Debug, Clone, Copy, PartialEq)]
enum Unit {
    Mmol,
    Mg,
    Unmarked,
}

fn readings(text: &str) -> impl Iterator<Item = (f64, Unit)> + '_ {
    READING.captures_iter(text).filter_map(|caps| {
        let value = caps.get(1)?.as_str().parse::<f64>().ok()?;
        let unit = match caps.get(2) {
            Some(m) if m.as_str().to_ascii_lowercase().starts_with("mmol") => Unit::Mmol,
            Some(_) => Unit::Mg,
            None => Unit::Unmarked,
        };
        Some((value, unit))
    })
}

/// A lipid value found in the report.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectedValue {
    pub code: LipidCode,
    /// Value in mg/dL.
    pub value: f64,
    pub converted_from_mmol: bool,
    /// The trimmed source line.
    pub line: String,
}

/// Everything detection found, in report order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Detection {
    pub values: Vec<DetectedValue>,
    pub warnings: Vec<String>,
}

impl Detection {
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn panel(&self) -> LipidPanel {
        let mut panel = LipidPanel::new();
        for detected in &self.values {
            panel.insert(detected.code, detected.value);
        }
        panel
    }
}

/// Scans `text` for CHOL, LDL, HDL and TG values. The first value found for each code wins.
pub fn detect_lipids(text: &str) -> Detection {
    let mut detection = Detection::default();

    for raw_line in text.lines() {
        let line = raw_line.trim();
        if line.is_empty() || SKIP_LINE.is_match(line) {
            continue;
        }

        let Some((code, label_end)) = LABELS
            .iter()
            .find_map(|(code, re)| re.find(line).map(|m| (*code, m.end())))
        else {
            continue;
        };

        if detection.values.iter().any(|d| d.code == code) {
            continue;
        }

        let rest = &line[label_end..];
        let Some((raw_value, unit)) = readings(rest).next() else {
            continue;
        };
        // "5.48 mmol/L (212 mg/dL)": take the mg/dL figure from the same row.
        let mg_on_row = match unit {
            Unit::Mmol => readings(rest).find(|(_, u)| *u == Unit::Mg).map(|(v, _)| v),
            Unit::Mg | Unit::Unmarked => None,
        };

        let converted_from_mmol = unit == Unit::Mmol && mg_on_row.is_none();
        let value = if let Some(mg) = mg_on_row {
            mg
        } else if converted_from_mmol {
            let mg = round_one_decimal(raw_value * mmol_factor(code));
            detection
                .warnings
                .push(format!("{code} value {raw_value} mmol/L converted to {mg} mg/dL"));
            mg
        } else {
            raw_value
        };

        tracing::debug!(%code, value, "detected lipid value");
        detection.values.push(DetectedValue {
            code,
            value,
            converted_from_mmol,
            line: line.to_string(),
        });
    }

    detection
}

fn mmol_factor(code: LipidCode) -> f64 {
    match code {
        LipidCode::Tg => TRIGLYCERIDE_MMOL_TO_MG,
        LipidCode::Chol | LipidCode::Ldl | LipidCode::Hdl => CHOLESTEROL_MMOL_TO_MG,
    }
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
