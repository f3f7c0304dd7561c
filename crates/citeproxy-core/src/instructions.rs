//! Run instructions: optional text attached to each run.
//!
//! The language split is a heuristic, not language detection. A question counts
//! as English only when it is made of ASCII letters, digits and whitespace, so
//! "What is this?" is classified as Swedish because of the question mark.

/// Which instruction template a question gets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    English,
    Swedish,
}

/// Classify a question by its characters alone.
pub fn classify_language(question: &str) -> Language {
    let plain_ascii = question
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c.is_ascii_whitespace());
    if plain_ascii {
        Language::English
    } else {
        Language::Swedish
    }
}

/// Chooses the instruction text for a run.
pub trait InstructionPolicy: Send + Sync {
    fn instructions(&self, question: &str) -> Option<String>;
}

/// Runs use the assistant's own instructions.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoInstructions;

impl InstructionPolicy for NoInstructions {
    fn instructions(&self, _question: &str) -> Option<String> {
        None
    }
}

/// The same text for every run.
#[derive(Debug, Clone)]
pub struct FixedInstructions {
    text: String,
}

impl FixedInstructions {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl InstructionPolicy for FixedInstructions {
    fn instructions(&self, _question: &str) -> Option<String> {
        Some(self.text.clone())
    }
}

/// One template per [`Language`], picked by a classifier.
#[derive(Debug, Clone)]
pub struct LanguageInstructions {
    english: String,
    swedish: String,
    classify: fn(&str) -> Language,
}

impl LanguageInstructions {
    /// Uses [`classify_language`].
    pub fn new(english: impl Into<String>, swedish: impl Into<String>) -> Self {
        Self {
            english: english.into(),
            swedish: swedish.into(),
            classify: classify_language,
        }
    }

    /// Swap in another classifier.
    pub fn with_classifier(mut self, classify: fn(&str) -> Language) -> Self {
        self.classify = classify;
        self
    }
}

impl InstructionPolicy for LanguageInstructions {
    fn instructions(&self, question: &str) -> Option<String> {
        let text = match (self.classify)(question) {
            Language::English => &self.english,
            Language::Swedish => &self.swedish,
        };
        Some(text.clone())
    }
}
