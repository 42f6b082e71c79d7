//! # Lipid Types
//!
//! Value types shared by the lipid explainer crates.
//!
//! - [`LipidCode`] and the per-code category enums
//! - [`LipidDetail`] / [`AnswerResult`], the engine's output shape
//! - [`NonEmptyText`] for validated free-text identifiers

mod answer;
mod lipid;

pub use answer::{AnswerResult, LipidDetail, Mode};
pub use lipid::{
    Category, CholCategory, HdlCategory, LdlCategory, LipidCode, TgCategory, UnknownCode,
};

/// Errors that can occur when creating validated text types.
#[derive(Debug, thiserror::Error)]
pub enum TextError {
    /// The input text was empty or contained only whitespace
    #[error("Text cannot be empty")]
    Empty,
}

/// A string type that guarantees non-empty content.
///
/// This type wraps a `String` and ensures it contains at least one non-whitespace character.
/// The input is automatically trimmed of leading and trailing whitespace during construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NonEmptyText(String);

impl NonEmptyText {
    /// Creates a new `NonEmptyText` from the given input.
    ///
    /// The input is trimmed of leading and trailing whitespace. If the trimmed
    /// result is empty, an error is returned.
    ///
    /// # Arguments
    ///
    /// * `input` - Any type that can be converted to a string reference
    ///
    /// # Returns
    ///
    /// Returns `Ok(NonEmptyText)` if the trimmed input is non-empty,
    /// or `Err(TextError::Empty)` if it's empty or contains only whitespace.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TextError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TextError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Builds a `NonEmptyText` from optional input, using `fallback` when the input is absent
    /// or blank.
    ///
    /// `fallback` is expected to be a non-blank literal such as a default user id.
    pub fn or_fallback(input: Option<&str>, fallback: &'static str) -> Self {
        input
            .and_then(|raw| Self::new(raw).ok())
            .unwrap_or_else(|| Self(fallback.to_owned()))
    }

    /// Returns the inner string as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for NonEmptyText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for NonEmptyText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
