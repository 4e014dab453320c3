use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GradeBand {
    #[serde(rename = "Fail")]
    Fail,
    #[serde(rename = "Pass")]
    Pass,
    #[serde(rename = "Second Class")]
    SecondClass,
    #[serde(rename = "First Class")]
    FirstClass,
    #[serde(rename = "First Class with Distinction")]
    Distinction,
}

impl GradeBand {
    /// Lower bounds are inclusive: exactly 35 is a pass, exactly 75 a distinction.
    pub fn from_percentage(percentage: f64) -> Self {
        if percentage < 35.0 {
            GradeBand::Fail
        } else if percentage < 55.0 {
            GradeBand::Pass
        } else if percentage < 65.0 {
            GradeBand::SecondClass
        } else if percentage < 75.0 {
            GradeBand::FirstClass
        } else {
            GradeBand::Distinction
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            GradeBand::Fail => "Fail",
            GradeBand::Pass => "Pass",
            GradeBand::SecondClass => "Second Class",
            GradeBand::FirstClass => "First Class",
            GradeBand::Distinction => "First Class with Distinction",
        }
    }
}

impl fmt::Display for GradeBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
