//! Reading normalisation and question focus detection.
//!
//! Callers send lipid values keyed by whatever label their lab report used. These helpers map
//! labels onto the canonical codes and drop anything that is not a usable number, so the engine
//! only ever sees clean [`LipidReading`]s.

use lipid_types::LipidCode;
use serde_json::Value;

/// A single normalised reading. `value` is always finite and non-negative.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LipidReading {
    pub code: LipidCode,
    pub value: f64,
}

/// An ordered set of readings with at most one entry per code.
///
/// Order is the first-seen order of each code; a later value for the same code replaces the
/// earlier value in place.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LipidPanel {
    readings: Vec<LipidReading>,
}

impl LipidPanel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a panel from raw `(label, value)` pairs, dropping unrecognised labels and
    /// unusable values.
    pub fn from_raw<'a, I>(raw: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a Value)>,
    {
        let mut panel = Self::new();
        for (label, value) in raw {
            let Some(code) = normalise_label(label) else {
                tracing::debug!(label, "dropping unrecognised lipid label");
                continue;
            };
            let Some(value) = parse_value(value) else {
                tracing::debug!(label, "dropping non-numeric lipid value");
                continue;
            };
            panel.insert(code, value);
        }
        panel
    }

    /// Builds a panel from a JSON object such as a request body's `lipids` field.
    pub fn from_json_map(map: &serde_json::Map<String, Value>) -> Self {
        Self::from_raw(map.iter().map(|(k, v)| (k.as_str(), v)))
    }

    /// Inserts or replaces the value for `code`. Values that are not finite and non-negative
    /// are ignored.
    pub fn insert(&mut self, code: LipidCode, value: f64) {
        if !is_valid_value(value) {
            return;
        }
        match self.readings.iter_mut().find(|r| r.code == code) {
            Some(existing) => existing.value = value,
            None => self.readings.push(LipidReading { code, value }),
        }
    }

    pub fn get(&self, code: LipidCode) -> Option<f64> {
        self.readings
            .iter()
            .find(|r| r.code == code)
            .map(|r| r.value)
    }

    pub fn contains(&self, code: LipidCode) -> bool {
        self.get(code).is_some()
    }

    pub fn readings(&self) -> &[LipidReading] {
        &self.readings
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    /// The panel as a JSON object keyed by canonical code.
    pub fn to_json_map(&self) -> serde_json::Map<String, Value> {
        self.readings
            .iter()
            .map(|r| (r.code.as_str().to_string(), Value::from(r.value)))
            .collect()
    }
}

/// Maps a lab label onto a canonical code.
///
/// Matching ignores case and surrounding whitespace. Exact canonical codes map to themselves,
/// any label containing `TRIG` maps to TG, and `TOTAL CHOLESTEROL` / `CHOLESTEROL` map to CHOL.
pub fn normalise_label(label: &str) -> Option<LipidCode> {
    let upper = label.trim().to_ascii_uppercase();
    if let Ok(code) = upper.parse::<LipidCode>() {
        return Some(code);
    }
    if upper.contains("TRIG") {
        return Some(LipidCode::Tg);
    }
    if upper == "TOTAL CHOLESTEROL" || upper == "CHOLESTEROL" {
        return Some(LipidCode::Chol);
    }
    None
}

/// Reads a finite, non-negative number from a JSON number or numeric string.
pub fn parse_value(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    is_valid_value(parsed).then_some(parsed)
}

fn is_valid_value(value: f64) -> bool {
    value.is_finite() && value >= 0.0
}

/// Detects which code, if any, a question is about.
///
/// Markers are checked in fixed priority: LDL, HDL, TG, CHOL.
pub fn detect_focus(question: &str) -> Option<LipidCode> {
    let q = question.to_lowercase();
    if q.contains("ldl") {
        Some(LipidCode::Ldl)
    } else if q.contains("hdl") {
        Some(LipidCode::Hdl)
    } else if q.contains("trig") || q.contains("tg") {
        Some(LipidCode::Tg)
    } else if q.contains("chol") || q.contains("total cholesterol") {
        Some(LipidCode::Chol)
    } else {
        None
    }
}
