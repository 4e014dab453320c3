use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Highest mark a single question can earn.
pub const MARKS_PER_QUESTION: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tier {
    pub min_similarity: f64,
    pub marks: u32,
}

/// Ordered similarity thresholds mapping a percentage to a mark.
///
/// The exam and single-question modes historically use different ladders:
/// `standard` never awards 4 or 1, `fine_grained` adds a 4-mark tier at 55.
/// Both are kept as named policies instead of being merged.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkingLadder {
    tiers: Vec<Tier>,
}

impl MarkingLadder {
    /// Tiers may be given in any order; they are checked from the highest
    /// threshold down.
    pub fn new(mut tiers: Vec<Tier>) -> Self {
        tiers.sort_by(|a, b| b.min_similarity.total_cmp(&a.min_similarity));
        Self { tiers }
    }

    /// Whole-exam ladder: >=75 -> 5, >=45 -> 3, >=35 -> 2, else 0.
    pub fn standard() -> Self {
        Self::new(vec![
            Tier { min_similarity: 75.0, marks: 5 },
            Tier { min_similarity: 45.0, marks: 3 },
            Tier { min_similarity: 35.0, marks: 2 },
        ])
    }

    /// Single-question ladder: >=75 -> 5, >=55 -> 4, >=45 -> 3, >=35 -> 2, else 0.
    pub fn fine_grained() -> Self {
        Self::new(vec![
            Tier { min_similarity: 75.0, marks: 5 },
            Tier { min_similarity: 55.0, marks: 4 },
            Tier { min_similarity: 45.0, marks: 3 },
            Tier { min_similarity: 35.0, marks: 2 },
        ])
    }

    pub fn grade_question(&self, similarity: f64) -> u32 {
        self.tiers
            .iter()
            .find(|tier| similarity >= tier.min_similarity)
            .map(|tier| tier.marks)
            .unwrap_or(0)
    }

    pub fn tiers(&self) -> &[Tier] {
        &self.tiers
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LadderKind {
    Standard,
    FineGrained,
}

impl LadderKind {
    pub fn ladder(self) -> MarkingLadder {
        match self {
            LadderKind::Standard => MarkingLadder::standard(),
            LadderKind::FineGrained => MarkingLadder::fine_grained(),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LadderKind::Standard => "standard",
            LadderKind::FineGrained => "fine-grained",
        }
    }
}

impl fmt::Display for LadderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LadderKind {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "standard" => Ok(LadderKind::Standard),
            "fine-grained" | "fine_grained" | "finegrained" => Ok(LadderKind::FineGrained),
            other => Err(anyhow!(
                "unknown marking ladder: {} (expected standard or fine-grained)",
                other
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_ladder_thresholds() {
        let ladder = MarkingLadder::standard();
        assert_eq!(ladder.grade_question(100.0), 5);
        assert_eq!(ladder.grade_question(75.0), 5);
        assert_eq!(ladder.grade_question(74.99), 3);
        assert_eq!(ladder.grade_question(60.0), 3);
        assert_eq!(ladder.grade_question(50.0), 3);
        assert_eq!(ladder.grade_question(45.0), 3);
        assert_eq!(ladder.grade_question(40.0), 2);
        assert_eq!(ladder.grade_question(35.0), 2);
        assert_eq!(ladder.grade_question(34.9), 0);
        assert_eq!(ladder.grade_question(10.0), 0);
    }

    #[test]
    fn fine_grained_ladder_thresholds() {
        let ladder = MarkingLadder::fine_grained();
        assert_eq!(ladder.grade_question(75.0), 5);
        assert_eq!(ladder.grade_question(60.0), 4);
        assert_eq!(ladder.grade_question(55.0), 4);
        assert_eq!(ladder.grade_question(50.0), 3);
        assert_eq!(ladder.grade_question(35.0), 2);
        assert_eq!(ladder.grade_question(0.0), 0);
    }

    #[test]
    fn ladders_never_exceed_question_maximum() {
        for kind in [LadderKind::Standard, LadderKind::FineGrained] {
            let ladder = kind.ladder();
            assert!(ladder.tiers().iter().all(|tier| tier.marks <= MARKS_PER_QUESTION));
            assert_eq!(ladder.grade_question(100.0), MARKS_PER_QUESTION);
        }
    }

    #[test]
    fn custom_tiers_are_ordered() {
        let ladder = MarkingLadder::new(vec![
            Tier { min_similarity: 10.0, marks: 1 },
            Tier { min_similarity: 90.0, marks: 5 },
        ]);
        assert_eq!(ladder.grade_question(95.0), 5);
        assert_eq!(ladder.grade_question(50.0), 1);
    }

    #[test]
    fn parses_ladder_names() {
        assert_eq!("standard".parse::<LadderKind>().unwrap(), LadderKind::Standard);
        assert_eq!(
            "Fine-Grained".parse::<LadderKind>().unwrap(),
            LadderKind::FineGrained
        );
        assert!("strict".parse::<LadderKind>().is_err());
        assert_eq!(LadderKind::FineGrained.to_string(), "fine-grained");
    }
}
