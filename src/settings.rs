use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::answer_key::{AnswerEntry, AnswerKey};
use crate::ocr;
use crate::scoring::{LadderKind, MarkingScheme};

const DEFAULT_SETTINGS_TOML: &str = include_str!("../settings.toml");

#[derive(Debug, Clone)]
pub struct Settings {
    pub answer_key: AnswerKey,
    pub ocr_threshold: u8,
    pub min_text_chars: usize,
    pub single_min_text_chars: usize,
    pub tesseract_program: String,
    pub tesseract_psm: Option<u32>,
    pub min_answer_chars: usize,
    pub exam_ladder: LadderKind,
    pub question_ladder: LadderKind,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            answer_key: AnswerKey::default(),
            ocr_threshold: ocr::DEFAULT_THRESHOLD,
            min_text_chars: ocr::DEFAULT_MIN_TEXT_CHARS,
            single_min_text_chars: 15,
            tesseract_program: "tesseract".to_string(),
            tesseract_psm: None,
            min_answer_chars: MarkingScheme::DEFAULT_MIN_ANSWER_CHARS,
            exam_ladder: LadderKind::Standard,
            question_ladder: LadderKind::FineGrained,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct SettingsFile {
    answers: Option<Vec<AnswerEntry>>,
    ocr: Option<OcrSettings>,
    marking: Option<MarkingSettings>,
}

#[derive(Debug, Default, Deserialize)]
struct OcrSettings {
    threshold: Option<u8>,
    min_text_chars: Option<usize>,
    single_min_text_chars: Option<usize>,
    tesseract: Option<String>,
    psm: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct MarkingSettings {
    min_answer_chars: Option<usize>,
    exam_ladder: Option<LadderKind>,
    question_ladder: Option<LadderKind>,
}

/// Loads settings from the built-in defaults, then `settings.toml` and
/// `settings.local.toml` in the working directory, then the same two files
/// under `~/.exam-grader`, then `extra_path`. Later files win.
pub fn load_settings(extra_path: Option<&Path>) -> Result<Settings> {
    let home = home_dir();
    if let Some(home) = home.as_deref() {
        ensure_home_settings_file(home)?;
    }
    load_layered(Path::new("."), home.as_deref(), extra_path)
}

fn load_layered(cwd: &Path, home: Option<&Path>, extra_path: Option<&Path>) -> Result<Settings> {
    let mut settings = Settings::default();
    settings
        .merge(parse_file(DEFAULT_SETTINGS_TOML).with_context(|| "invalid built-in settings")?)?;

    let mut ordered_paths = vec![cwd.join("settings.toml"), cwd.join("settings.local.toml")];
    if let Some(home) = home {
        ordered_paths.push(home.join("settings.toml"));
        ordered_paths.push(home.join("settings.local.toml"));
    }
    if let Some(extra) = extra_path {
        if !extra.exists() {
            return Err(anyhow!("settings file not found: {}", extra.display()));
        }
        ordered_paths.push(extra.to_path_buf());
    }

    for path in ordered_paths {
        if path.exists() {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("failed to read settings: {}", path.display()))?;
            let parsed = parse_file(&content)
                .with_context(|| format!("failed to parse settings: {}", path.display()))?;
            settings
                .merge(parsed)
                .with_context(|| format!("invalid settings: {}", path.display()))?;
        }
    }

    if settings.answer_key.is_empty() {
        return Err(anyhow!("answer key is empty; add [[answers]] entries to settings"));
    }
    Ok(settings)
}

fn parse_file(content: &str) -> Result<SettingsFile> {
    Ok(toml::from_str(content)?)
}

impl Settings {
    /// Built-in defaults overlaid with one TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let mut settings = Settings::default();
        settings.merge(parse_file(DEFAULT_SETTINGS_TOML)?)?;
        settings.merge(parse_file(content)?)?;
        Ok(settings)
    }

    pub fn exam_scheme(&self) -> MarkingScheme {
        MarkingScheme {
            ladder: self.exam_ladder.ladder(),
            min_answer_chars: self.min_answer_chars,
        }
    }

    pub fn question_scheme(&self) -> MarkingScheme {
        MarkingScheme {
            ladder: self.question_ladder.ladder(),
            min_answer_chars: self.min_answer_chars,
        }
    }

    fn merge(&mut self, incoming: SettingsFile) -> Result<()> {
        // A layer that lists answers replaces the whole key; merging labels
        // across files would make question order depend on file order.
        if let Some(entries) = incoming.answers {
            self.answer_key = AnswerKey::new(entries)?;
        }
        if let Some(ocr) = incoming.ocr {
            if let Some(threshold) = ocr.threshold {
                self.ocr_threshold = threshold;
            }
            if let Some(min) = ocr.min_text_chars {
                self.min_text_chars = min;
            }
            if let Some(min) = ocr.single_min_text_chars {
                self.single_min_text_chars = min;
            }
            if let Some(program) = ocr.tesseract {
                if !program.trim().is_empty() {
                    self.tesseract_program = program;
                }
            }
            if let Some(psm) = ocr.psm {
                self.tesseract_psm = Some(psm);
            }
        }
        if let Some(marking) = incoming.marking {
            if let Some(min) = marking.min_answer_chars {
                self.min_answer_chars = min;
            }
            if let Some(kind) = marking.exam_ladder {
                self.exam_ladder = kind;
            }
            if let Some(kind) = marking.question_ladder {
                self.question_ladder = kind;
            }
        }
        Ok(())
    }
}

fn ensure_home_settings_file(home: &Path) -> Result<()> {
    fs::create_dir_all(home)
        .with_context(|| format!("failed to create settings directory: {}", home.display()))?;
    let path = home.join("settings.toml");
    if !path.exists() {
        fs::write(&path, home_settings_template())
            .with_context(|| format!("failed to write settings: {}", path.display()))?;
    }
    Ok(())
}

/// The built-in settings with every line commented out. The home file loads
/// after the working-directory layers, so it must not declare any values
/// until the user uncomments them.
fn home_settings_template() -> String {
    let mut template = String::from(
        "# Uncomment values to override the built-in settings for every exam.\n\n",
    );
    for line in DEFAULT_SETTINGS_TOML.lines() {
        if line.is_empty() || line.starts_with('#') {
            template.push_str(line);
        } else {
            template.push_str("# ");
            template.push_str(line);
        }
        template.push('\n');
    }
    template
}

fn home_dir() -> Option<PathBuf> {
    std::env::var("HOME").ok().and_then(|home| {
        let home = home.trim();
        if home.is_empty() {
            None
        } else {
            Some(Path::new(home).join(".exam-grader"))
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn built_in_defaults() {
        let settings = Settings::from_toml_str("").expect("settings");
        assert_eq!(settings.answer_key.labels(), vec!["Q1", "Q2", "Q3", "Q4"]);
        assert_eq!(settings.ocr_threshold, 150);
        assert_eq!(settings.min_text_chars, 20);
        assert_eq!(settings.single_min_text_chars, 15);
        assert_eq!(settings.min_answer_chars, 5);
        assert_eq!(settings.exam_ladder, LadderKind::Standard);
        assert_eq!(settings.question_ladder, LadderKind::FineGrained);
        assert_eq!(settings.tesseract_psm, None);
    }

    #[test]
    fn answers_layer_replaces_whole_key() {
        let settings = Settings::from_toml_str(
            r#"
            [[answers]]
            label = "A"
            text = "alpha"

            [[answers]]
            label = "B"
            text = "beta"
            "#,
        )
        .expect("settings");
        assert_eq!(settings.answer_key.labels(), vec!["A", "B"]);
        assert_eq!(settings.answer_key.reference("B"), Some("beta"));
    }

    #[test]
    fn ladders_are_selectable() {
        let settings = Settings::from_toml_str(
            r#"
            [marking]
            exam_ladder = "fine-grained"
            question_ladder = "standard"
            "#,
        )
        .expect("settings");
        assert_eq!(settings.exam_scheme().ladder.grade_question(60.0), 4);
        assert_eq!(settings.question_scheme().ladder.grade_question(60.0), 3);
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(Settings::from_toml_str("[marking]\nexam_ladder = \"strict\"").is_err());
        assert!(Settings::from_toml_str("[ocr]\nthreshold = 300").is_err());
        let duplicate = r#"
            [[answers]]
            label = "Q1"
            text = "a"
            [[answers]]
            label = "Q1"
            text = "b"
        "#;
        assert!(Settings::from_toml_str(duplicate).is_err());
    }

    #[test]
    fn later_layers_override_earlier_ones() {
        let cwd = tempdir().expect("cwd");
        let home = tempdir().expect("home");
        fs::write(cwd.path().join("settings.toml"), "[ocr]\nthreshold = 120\npsm = 4\n")
            .expect("write cwd settings");
        fs::write(home.path().join("settings.local.toml"), "[ocr]\nthreshold = 90\n")
            .expect("write home settings");
        let extra = cwd.path().join("extra.toml");
        fs::write(&extra, "[marking]\nmin_answer_chars = 3\n").expect("write extra");

        let settings =
            load_layered(cwd.path(), Some(home.path()), Some(extra.as_path())).expect("settings");
        assert_eq!(settings.ocr_threshold, 90);
        assert_eq!(settings.tesseract_psm, Some(4));
        assert_eq!(settings.min_answer_chars, 3);
        assert_eq!(settings.answer_key.len(), 4);
    }

    #[test]
    fn home_template_declares_no_values() {
        let parsed = parse_file(&home_settings_template()).expect("template parses");
        assert!(parsed.answers.is_none());
        assert!(parsed.ocr.is_none());
        assert!(parsed.marking.is_none());
    }

    #[test]
    fn working_directory_key_survives_fresh_home_file() {
        let cwd = tempdir().expect("cwd");
        let home = tempdir().expect("home");
        fs::write(
            cwd.path().join("settings.toml"),
            "[[answers]]\nlabel = \"A\"\ntext = \"alpha\"\n\n[ocr]\nthreshold = 120\n",
        )
        .expect("write cwd settings");
        ensure_home_settings_file(home.path()).expect("create home settings");

        let settings = load_layered(cwd.path(), Some(home.path()), None).expect("settings");
        assert_eq!(settings.answer_key.labels(), vec!["A"]);
        assert_eq!(settings.ocr_threshold, 120);
        assert_eq!(settings.exam_ladder, LadderKind::Standard);
    }

    #[test]
    fn missing_extra_file_is_an_error() {
        let cwd = tempdir().expect("cwd");
        let missing = cwd.path().join("nope.toml");
        let err = load_layered(cwd.path(), None, Some(missing.as_path())).unwrap_err();
        assert!(err.to_string().contains("settings file not found"));
    }

    #[test]
    fn empty_answer_key_is_an_error() {
        let cwd = tempdir().expect("cwd");
        fs::write(cwd.path().join("settings.toml"), "answers = []\n").expect("write");
        let err = load_layered(cwd.path(), None, None).unwrap_err();
        assert!(err.to_string().contains("answer key is empty"));
    }

    #[test]
    fn home_settings_file_is_created_once() {
        let home = tempdir().expect("home");
        let dir = home.path().join(".exam-grader");
        ensure_home_settings_file(&dir).expect("create");
        let path = dir.join("settings.toml");
        assert_eq!(fs::read_to_string(&path).expect("read"), home_settings_template());

        fs::write(&path, "[ocr]\nthreshold = 10\n").expect("overwrite");
        ensure_home_settings_file(&dir).expect("second call");
        assert!(fs::read_to_string(&path).expect("read").contains("threshold = 10"));
    }
}
