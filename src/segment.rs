use serde::Serialize;

/// Per-label answers cut out of one OCR transcript.
///
/// Holds exactly one entry per requested label, in request order. Labels
/// that were not found map to an empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SegmentedAnswers {
    answers: Vec<(String, String)>,
}

impl SegmentedAnswers {
    pub fn get(&self, label: &str) -> Option<&str> {
        self.answers
            .iter()
            .find(|(name, _)| name == label)
            .map(|(_, answer)| answer.as_str())
    }

    /// Answer for `label`, or `""` when the label is unknown.
    pub fn answer(&self, label: &str) -> &str {
        self.get(label).unwrap_or("")
    }

    /// False when every answer is empty or whitespace, i.e. no label was
    /// usable at all.
    pub fn has_any_answer(&self) -> bool {
        self.answers
            .iter()
            .any(|(_, answer)| !answer.trim().is_empty())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.answers
            .iter()
            .map(|(label, answer)| (label.as_str(), answer.as_str()))
    }

    pub fn len(&self) -> usize {
        self.answers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }
}

/// Splits raw OCR text into per-label answers.
///
/// Works on a lowercased copy of the text. First every occurrence of every
/// label is located. Then, for each label independently, the answer runs
/// from just after its first occurrence (skipping a `:` or `-` placed
/// directly after the label, then any whitespace) to the next label
/// occurrence that starts strictly
/// after that point, or to the end of the text. Spans of different labels
/// may overlap when labels are repeated or out of order.
pub fn split_answers<S: AsRef<str>>(raw_text: &str, labels: &[S]) -> SegmentedAnswers {
    let text = raw_text.to_lowercase();
    let needles: Vec<String> = labels
        .iter()
        .map(|label| label.as_ref().to_lowercase())
        .collect();
    let boundaries = label_offsets(&text, &needles);

    let answers = labels
        .iter()
        .zip(&needles)
        .map(|(label, needle)| {
            let answer = answer_span(&text, needle, &boundaries).unwrap_or_default();
            (label.as_ref().to_string(), answer.to_string())
        })
        .collect();
    SegmentedAnswers { answers }
}

/// Sorted, deduplicated start offsets of every occurrence of every label.
fn label_offsets(text: &str, needles: &[String]) -> Vec<usize> {
    let mut offsets: Vec<usize> = needles
        .iter()
        .filter(|needle| !needle.is_empty())
        .flat_map(|needle| text.match_indices(needle.as_str()).map(|(offset, _)| offset))
        .collect();
    offsets.sort_unstable();
    offsets.dedup();
    offsets
}

fn answer_span<'a>(text: &'a str, needle: &str, boundaries: &[usize]) -> Option<&'a str> {
    if needle.is_empty() {
        return None;
    }
    let label_start = text.find(needle)?;
    let after_label = &text[label_start + needle.len()..];
    let after_delimiter = after_label
        .strip_prefix([':', '-'])
        .unwrap_or(after_label);
    let body = after_delimiter.trim_start();
    let body_start = text.len() - body.len();
    if body.is_empty() {
        return None;
    }

    let end = match boundaries.iter().copied().find(|offset| *offset > body_start) {
        Some(offset) => offset,
        // the last answer on the sheet stops before one final newline
        None => text.strip_suffix('\n').map_or(text.len(), str::len),
    };
    Some(&text[body_start..end])
}
