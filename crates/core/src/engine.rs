//! Lipid interpretation engine.
//!
//! Turns a question plus a set of lipid readings into an [`AnswerResult`]. The engine is a pure
//! function of its inputs and of the reference dataset it was built with; it performs no I/O and
//! holds no mutable state, so one instance can be shared across request handlers.

use crate::classify::{classify, highlight};
use crate::constants::{
    DISCLAIMER, NOTHING_STANDS_OUT, NO_VALID_READINGS, OPENAI_API_KEY_VAR, SUMMARY_PREFIX,
};
use crate::normalize::{detect_focus, LipidPanel, LipidReading};
use crate::reference::ReferenceDataset;
use lipid_types::{AnswerResult, LipidDetail, Mode};
use serde_json::Value;
use std::sync::Arc;

/// Rule-based lipid explainer.
#[derive(Debug, Clone)]
pub struct LipidEngine {
    reference: Arc<ReferenceDataset>,
    has_llm_credential: bool,
    credential_name: &'static str,
    force_deterministic: bool,
}

impl LipidEngine {
    /// Creates an engine over `reference`.
    ///
    /// `has_llm_credential` fixes the reported mode: `hybrid` with a credential, `deterministic`
    /// without one.
    pub fn new(reference: Arc<ReferenceDataset>, has_llm_credential: bool) -> Self {
        Self {
            reference,
            has_llm_credential,
            credential_name: OPENAI_API_KEY_VAR,
            force_deterministic: false,
        }
    }

    /// Names the credential in the deterministic-mode note.
    pub fn with_credential_name(mut self, name: &'static str) -> Self {
        self.credential_name = name;
        self
    }

    /// Reports `deterministic` even when a credential is present.
    pub fn force_deterministic(mut self) -> Self {
        self.force_deterministic = true;
        self
    }

    pub fn mode(&self) -> Mode {
        if self.has_llm_credential && !self.force_deterministic {
            Mode::Hybrid
        } else {
            Mode::Deterministic
        }
    }

    /// Explanatory note reported alongside the mode. Only set when the credential is missing.
    pub fn note(&self) -> Option<String> {
        (!self.has_llm_credential).then(|| {
            format!(
                "{} not set, running in deterministic mode.",
                self.credential_name
            )
        })
    }

    pub fn reference(&self) -> &ReferenceDataset {
        &self.reference
    }

    /// Answers `question` from raw caller-supplied readings.
    ///
    /// Labels are normalised and unusable values dropped before interpretation.
    pub fn interpret(&self, question: &str, readings: &serde_json::Map<String, Value>) -> AnswerResult {
        self.interpret_panel(question, &LipidPanel::from_json_map(readings))
    }

    /// Answers `question` from an already normalised panel.
    pub fn interpret_panel(&self, question: &str, panel: &LipidPanel) -> AnswerResult {
        if panel.is_empty() {
            return AnswerResult {
                answer: NO_VALID_READINGS.to_string(),
                details: Vec::new(),
                highlights: Vec::new(),
                sources: Vec::new(),
                mode: self.mode(),
                note: self.note(),
            };
        }

        match detect_focus(question).and_then(|code| {
            panel
                .readings()
                .iter()
                .find(|r| r.code == code)
                .copied()
        }) {
            Some(reading) => self.single(reading),
            None => self.summarise(panel),
        }
    }

    /// Multi-value summary over every reading in `panel`, regardless of any question.
    pub fn summarise(&self, panel: &LipidPanel) -> AnswerResult {
        if panel.is_empty() {
            return self.interpret_panel("", panel);
        }

        let details: Vec<LipidDetail> = panel.readings().iter().map(|r| self.detail(*r)).collect();
        let highlights = collect_highlights(&details);
        let sources = self.sources(panel.readings());

        let lead = if highlights.is_empty() {
            NOTHING_STANDS_OUT.to_string()
        } else {
            format!("{}{}", SUMMARY_PREFIX, highlights.join(" "))
        };

        AnswerResult {
            answer: join_sentences([Some(lead.as_str()), Some(DISCLAIMER)]),
            details,
            highlights,
            sources,
            mode: self.mode(),
            note: self.note(),
        }
    }

    fn single(&self, reading: LipidReading) -> AnswerResult {
        let detail = self.detail(reading);
        let row = self.reference.lookup(reading.code);
        let lead = format!("Your {} is {}.", reading.code, detail.category.words());

        let answer = join_sentences([
            Some(lead.as_str()),
            row.and_then(|r| r.what_it_measures.as_deref()),
            row.and_then(|r| r.how_to_read_results.as_deref()),
            row.and_then(|r| r.safe_next_step.as_deref()),
            Some(DISCLAIMER),
        ]);

        let details = vec![detail];
        AnswerResult {
            answer,
            highlights: collect_highlights(&details),
            details,
            sources: self.sources(&[reading]),
            mode: self.mode(),
            note: self.note(),
        }
    }

    /// Classifies one reading and attaches its reference ranges.
    pub fn detail(&self, reading: LipidReading) -> LipidDetail {
        let row = self.reference.lookup(reading.code);

        LipidDetail {
            code: reading.code,
            value: reading.value,
            category: classify(reading.code, reading.value),
            display_name: row.and_then(|r| r.display_name.clone()),
            unit: row.and_then(|r| r.unit.clone()),
            desirable_range: row.and_then(|r| r.desirable_range.clone()),
            borderline_high_range: row.and_then(|r| r.borderline_high_range.clone()),
            high_range: row.and_then(|r| r.high_range.clone()),
            low_range: row.and_then(|r| r.low_range.clone()),
            sex_specific_ranges: row.and_then(|r| r.sex_specific_ranges.clone()),
        }
    }

    fn sources(&self, readings: &[LipidReading]) -> Vec<String> {
        readings
            .iter()
            .filter_map(|r| self.reference.source_for(r.code))
            .collect()
    }
}

fn collect_highlights(details: &[LipidDetail]) -> Vec<String> {
    let mut highlights: Vec<String> = Vec::new();
    for message in details.iter().filter_map(|d| highlight(d.code, d.category)) {
        if !highlights.contains(&message) {
            highlights.push(message);
        }
    }
    highlights
}

/// Joins trimmed, non-empty segments with single spaces.
fn join_sentences<'a>(segments: impl IntoIterator<Item = Option<&'a str>>) -> String {
    segments
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::tests::sample_dataset;
    use lipid_types::LipidCode;
    use serde_json::json;

    fn map(value: Value) -> serde_json::Map<String, Value> {
        value.as_object().cloned().expect("object")
    }

    fn bare_engine() -> LipidEngine {
        LipidEngine::new(Arc::new(ReferenceDataset::empty()), false)
    }

    fn grounded_engine() -> LipidEngine {
        LipidEngine::new(Arc::new(sample_dataset()), false)
    }

    #[test]
    fn test_single_focus_ldl() {
        let result = bare_engine().interpret("What is my LDL?", &map(json!({"LDL": 145})));

        assert_eq!(result.details.len(), 1);
        assert_eq!(result.details[0].category.as_str(), "borderline-high");
        assert_eq!(result.highlights, vec!["LDL looks borderline high.".to_string()]);
        assert!(result.answer.starts_with("Your LDL is borderline high."));
        assert!(result.answer.ends_with(DISCLAIMER));
        assert_eq!(result.mode, Mode::Deterministic);
        assert_eq!(
            result.note.as_deref(),
            Some("OPENAI_API_KEY not set, running in deterministic mode.")
        );
    }

    #[test]
    fn test_single_focus_includes_grounding_text_without_blank_segments() {
        let result = grounded_engine().interpret("ldl please", &map(json!({"LDL": 145, "HDL": 50})));

        assert_eq!(
            result.answer,
            "Your LDL is borderline high. \
             LDL carries cholesterol that can build up in artery walls. \
             Higher values mean more buildup risk. \
             This is general information, not medical advice."
        );
        assert_eq!(result.sources, vec!["lipids.csv:LDL".to_string()]);
        assert_eq!(result.details[0].desirable_range.as_deref(), Some("<100"));
        assert_eq!(result.details[0].low_range, None);
    }

    #[test]
    fn test_multi_value_nothing_stands_out() {
        let result = bare_engine().interpret("summary", &map(json!({"CHOL": 180, "HDL": 70})));

        let categories: Vec<&str> = result.details.iter().map(|d| d.category.as_str()).collect();
        assert_eq!(categories, vec!["desirable", "protective"]);
        assert!(result.highlights.is_empty());
        assert_eq!(result.answer, format!("{} {}", NOTHING_STANDS_OUT, DISCLAIMER));
        assert!(result.sources.is_empty());
    }

    #[test]
    fn test_focus_absent_from_readings_falls_back_to_summary() {
        let result = bare_engine().interpret("ldl?", &map(json!({"Triglycerides": 210})));

        assert_eq!(result.details.len(), 1);
        assert_eq!(result.details[0].code, LipidCode::Tg);
        assert_eq!(result.details[0].category.as_str(), "high");
        assert_eq!(result.highlights, vec!["TG looks high.".to_string()]);
        assert_eq!(
            result.answer,
            format!("{}TG looks high. {}", SUMMARY_PREFIX, DISCLAIMER)
        );
    }

    #[test]
    fn test_no_valid_readings_short_circuits_without_disclaimer() {
        let result = bare_engine().interpret("anything", &map(json!({"XYZ": 5})));

        assert_eq!(result.answer, NO_VALID_READINGS);
        assert!(!result.answer.contains(DISCLAIMER));
        assert!(result.details.is_empty());
        assert!(result.highlights.is_empty());
        assert!(result.sources.is_empty());
        assert_eq!(result.mode, Mode::Deterministic);
        assert!(result.note.is_some());
    }

    #[test]
    fn test_multi_value_keeps_insertion_order_and_sources() {
        let result = grounded_engine().interpret(
            "how am I doing",
            &map(json!({"HDL": 35, "TG": 600, "CHOL": 250})),
        );

        assert_eq!(
            result.highlights,
            vec![
                "HDL looks low.".to_string(),
                "TG looks very high.".to_string(),
                "CHOL looks high.".to_string(),
            ]
        );
        assert_eq!(
            result.sources,
            vec!["lipids.csv:HDL".to_string(), "lipids.csv:CHOL".to_string()]
        );
        assert!(result
            .answer
            .starts_with("Here's a quick summary of your lipid values. HDL looks low."));
    }

    #[test]
    fn test_highlights_are_deduplicated() {
        let details = vec![
            bare_engine().detail(LipidReading { code: LipidCode::Ldl, value: 170.0 }),
            bare_engine().detail(LipidReading { code: LipidCode::Ldl, value: 180.0 }),
            bare_engine().detail(LipidReading { code: LipidCode::Tg, value: 300.0 }),
        ];
        assert_eq!(
            collect_highlights(&details),
            vec!["LDL looks high.".to_string(), "TG looks high.".to_string()]
        );
    }

    #[test]
    fn test_interpret_is_idempotent() {
        let engine = grounded_engine();
        let readings = map(json!({"LDL": 145, "hdl": "38", "Triglycerides": 180}));
        let first = engine.interpret("give me a summary", &readings);
        let second = engine.interpret("give me a summary", &readings);
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).expect("serialise"),
            serde_json::to_string(&second).expect("serialise")
        );
    }

    #[test]
    fn test_hybrid_mode_has_no_note_and_same_answer() {
        let readings = map(json!({"LDL": 145}));
        let hybrid = LipidEngine::new(Arc::new(ReferenceDataset::empty()), true);
        let deterministic = bare_engine();

        let a = hybrid.interpret("ldl", &readings);
        let b = deterministic.interpret("ldl", &readings);
        assert_eq!(a.mode, Mode::Hybrid);
        assert_eq!(a.note, None);
        assert_eq!(a.answer, b.answer);
        assert_eq!(a.highlights, b.highlights);
    }

    #[test]
    fn test_forced_deterministic_with_credential_reports_no_note() {
        let engine = LipidEngine::new(Arc::new(ReferenceDataset::empty()), true).force_deterministic();
        assert_eq!(engine.mode(), Mode::Deterministic);
        assert_eq!(engine.note(), None);
    }

    #[test]
    fn test_credential_name_in_note() {
        let engine = bare_engine().with_credential_name("GEMINI_API_KEY");
        assert_eq!(
            engine.note().as_deref(),
            Some("GEMINI_API_KEY not set, running in deterministic mode.")
        );
    }

    #[test]
    fn test_missing_reference_still_classifies() {
        let result = bare_engine().interpret("hdl", &map(json!({"HDL": 30})));
        assert_eq!(result.answer, format!("Your HDL is low. {}", DISCLAIMER));
        assert_eq!(result.details[0].display_name, None);
        assert!(result.sources.is_empty());
    }
}
