use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerEntry {
    pub label: String,
    pub text: String,
}

/// Ordered question label -> reference answer mapping.
///
/// Labels are unique and non-empty. They are kept verbatim and matched
/// case-insensitively against OCR text by the segmenter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct AnswerKey {
    entries: Vec<AnswerEntry>,
}

impl AnswerKey {
    pub fn new(entries: Vec<AnswerEntry>) -> Result<Self> {
        for (idx, entry) in entries.iter().enumerate() {
            let label = entry.label.trim();
            if label.is_empty() {
                return Err(anyhow!("answer key entry #{} has an empty label", idx + 1));
            }
            if label != entry.label {
                return Err(anyhow!(
                    "answer key label {:?} has surrounding whitespace",
                    entry.label
                ));
            }
            let duplicate = entries[..idx]
                .iter()
                .any(|prev| prev.label.to_lowercase() == entry.label.to_lowercase());
            if duplicate {
                return Err(anyhow!("duplicate answer key label: {}", entry.label));
            }
        }
        Ok(Self { entries })
    }

    pub fn from_pairs<L, T>(pairs: impl IntoIterator<Item = (L, T)>) -> Result<Self>
    where
        L: Into<String>,
        T: Into<String>,
    {
        let entries = pairs
            .into_iter()
            .map(|(label, text)| AnswerEntry {
                label: label.into(),
                text: text.into(),
            })
            .collect();
        Self::new(entries)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn labels(&self) -> Vec<&str> {
        self.entries.iter().map(|entry| entry.label.as_str()).collect()
    }

    pub fn reference(&self, label: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|entry| entry.label == label)
            .map(|entry| entry.text.as_str())
    }

    /// Looks a label up as typed by a user: exact match first, then ignoring case.
    pub fn resolve(&self, label: &str) -> Option<&AnswerEntry> {
        let label = label.trim();
        self.entries
            .iter()
            .find(|entry| entry.label == label)
            .or_else(|| {
                let lowered = label.to_lowercase();
                self.entries
                    .iter()
                    .find(|entry| entry.label.to_lowercase() == lowered)
            })
    }

    pub fn iter(&self) -> impl Iterator<Item = &AnswerEntry> {
        self.entries.iter()
    }
}
