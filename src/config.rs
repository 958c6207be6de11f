use std::env;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::error::PipelineError;
use crate::presets;
use crate::schema::Normalizer;
use crate::topics::embeddings::ModelFormat;
use crate::topics::relevance::{ClassifierSettings, ScoreStrategy, DEFAULT_THRESHOLD};

pub const DEFAULT_FILENAME_TEMPLATE: &str = "state_M{year}_dl.csv";
pub const DEFAULT_START_YEAR: i32 = 2001;
pub const DEFAULT_END_YEAR: i32 = 2022;
pub const DEFAULT_OUTPUT_NAME: &str = "filtered.csv";
const MODEL_FILE: &str = "GoogleNews-vectors-negative300.bin";

/// Central configuration loaded from environment variables.
///
/// The .env file is loaded at startup via dotenvy; CLI flags override
/// individual fields after loading.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding one table per year
    pub input_dir: PathBuf,
    /// Per-year file name, with a `{year}` placeholder
    pub filename_template: String,
    pub start_year: i32,
    pub end_year: i32,
    /// Where the checkpoint, filtered table and title report are written
    pub output_dir: PathBuf,
    /// File name of the filtered table inside `output_dir`
    pub output_name: String,
    pub model_path: PathBuf,
    /// Explicit model format; inferred from the extension when unset
    pub model_format: Option<ModelFormat>,
    pub max_vocab: Option<usize>,
    pub threshold: f64,
    pub strategy: ScoreStrategy,
    /// State allow-list. `None` (or empty) keeps every state.
    pub states: Option<Vec<String>>,
    pub corpus_file: Option<PathBuf>,
    pub delimiter: u8,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup. Unset keys take
    /// their defaults; set but unparsable values are errors.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| non_blank(lookup(key));

        let config = Self {
            input_dir: get("OCCSIFT_INPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("./data")),
            filename_template: get("OCCSIFT_FILENAME_TEMPLATE")
                .unwrap_or_else(|| DEFAULT_FILENAME_TEMPLATE.to_string()),
            start_year: parse_or(get("OCCSIFT_START_YEAR"), "OCCSIFT_START_YEAR", DEFAULT_START_YEAR)?,
            end_year: parse_or(get("OCCSIFT_END_YEAR"), "OCCSIFT_END_YEAR", DEFAULT_END_YEAR)?,
            output_dir: get("OCCSIFT_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("./output")),
            output_name: get("OCCSIFT_OUTPUT_NAME")
                .unwrap_or_else(|| DEFAULT_OUTPUT_NAME.to_string()),
            model_path: get("OCCSIFT_MODEL_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(default_model_path),
            model_format: get("OCCSIFT_MODEL_FORMAT")
                .map(|v| v.parse::<ModelFormat>().map_err(PipelineError::InvalidConfig))
                .transpose()?,
            max_vocab: get("OCCSIFT_MAX_VOCAB")
                .map(|v| parse_value::<usize>(&v, "OCCSIFT_MAX_VOCAB"))
                .transpose()?,
            threshold: parse_or(get("OCCSIFT_THRESHOLD"), "OCCSIFT_THRESHOLD", DEFAULT_THRESHOLD)?,
            strategy: get("OCCSIFT_STRATEGY")
                .map(|v| v.parse::<ScoreStrategy>().map_err(PipelineError::InvalidConfig))
                .transpose()?
                .unwrap_or_default(),
            states: get("OCCSIFT_STATES").map(|v| parse_list(&v)),
            corpus_file: get("OCCSIFT_CORPUS_FILE").map(PathBuf::from),
            delimiter: get("OCCSIFT_DELIMITER")
                .map(|v| parse_delimiter(&v))
                .transpose()?
                .unwrap_or(b','),
        };

        Ok(config)
    }

    /// Check the settings are coherent before starting a run.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.start_year > self.end_year {
            return Err(PipelineError::InvalidConfig(format!(
                "start year {} is after end year {}",
                self.start_year, self.end_year
            )));
        }
        if !self.filename_template.contains("{year}") && !self.filename_template.contains("{yy}") {
            return Err(PipelineError::InvalidConfig(format!(
                "filename template {:?} has no {{year}} placeholder",
                self.filename_template
            )));
        }
        if !self.threshold.is_finite() {
            return Err(PipelineError::InvalidConfig(format!(
                "threshold {} is not a finite number",
                self.threshold
            )));
        }
        if self.output_name.trim().is_empty() {
            return Err(PipelineError::InvalidConfig("output name is empty".into()));
        }
        Ok(())
    }

    pub fn years(&self) -> RangeInclusive<i32> {
        self.start_year..=self.end_year
    }

    pub fn normalizer(&self) -> Normalizer {
        Normalizer::new(&self.input_dir, &self.filename_template).with_delimiter(self.delimiter)
    }

    pub fn classifier_settings(&self) -> ClassifierSettings {
        ClassifierSettings {
            model_path: self.model_path.clone(),
            model_format: self
                .model_format
                .unwrap_or_else(|| ModelFormat::infer(&self.model_path)),
            max_vocab: self.max_vocab,
            threshold: self.threshold,
            strategy: self.strategy,
        }
    }

    pub fn output_path(&self) -> PathBuf {
        self.output_dir.join(&self.output_name)
    }

    /// Check the embedding model file is where the config says it is.
    pub fn require_model(&self) -> Result<()> {
        if !self.model_path.is_file() {
            anyhow::bail!(
                "Embedding model not found: {}\n\
                 Set OCCSIFT_MODEL_PATH or pass --model to point at a word2vec file.",
                self.model_path.display()
            );
        }
        Ok(())
    }

    /// Apply a preset's states and threshold wherever the caller hasn't
    /// set them explicitly.
    pub fn apply_preset(&mut self, preset: &presets::Preset, states_set: bool, threshold_set: bool) {
        if !states_set {
            self.states = Some(preset.states.iter().map(|s| s.to_string()).collect());
        }
        if !threshold_set {
            self.threshold = preset.threshold;
        }
    }

    /// Resolve the industry corpus from exactly one source: inline text,
    /// a preset, or a corpus file (CLI or OCCSIFT_CORPUS_FILE).
    pub fn resolve_corpus(&self, inline: Option<&str>, preset: Option<&presets::Preset>) -> Result<String> {
        let sources = [inline.is_some(), preset.is_some(), self.corpus_file.is_some()]
            .iter()
            .filter(|s| **s)
            .count();
        if sources > 1 {
            return Err(PipelineError::InvalidConfig(
                "give only one of --corpus, --preset or a corpus file".into(),
            )
            .into());
        }

        let corpus = match (inline, preset, &self.corpus_file) {
            (Some(text), _, _) => text.to_string(),
            (_, Some(p), _) => p.corpus.to_string(),
            (_, _, Some(path)) => read_corpus(path)?,
            (None, None, None) => {
                return Err(PipelineError::InvalidConfig(
                    "no industry corpus: pass --corpus, --corpus-file or --preset \
                     (or set OCCSIFT_CORPUS_FILE)"
                        .into(),
                )
                .into())
            }
        };

        if corpus.trim().is_empty() {
            return Err(PipelineError::InvalidConfig("industry corpus is empty".into()).into());
        }
        Ok(corpus)
    }
}

/// Default model location: the platform data directory
/// (~/.local/share/occsift/ on Linux).
pub fn default_model_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("occsift")
        .join(MODEL_FILE)
}

/// Whether `key` is set to a non-blank value in the process environment,
/// using the same rule as `Config::load`.
pub fn env_is_set(key: &str) -> bool {
    non_blank(env::var(key).ok()).is_some()
}

/// Blank values count as unset.
fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Split a comma-separated list, trimming blanks.
pub fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// A single-byte delimiter; `\t` and `tab` mean a tab.
pub fn parse_delimiter(value: &str) -> Result<u8, PipelineError> {
    match value {
        "\\t" | "tab" | "\t" => Ok(b'\t'),
        v if v.len() == 1 && v.is_ascii() => Ok(v.as_bytes()[0]),
        v => Err(PipelineError::InvalidConfig(format!(
            "delimiter {v:?} must be a single ASCII character"
        ))),
    }
}

fn read_corpus(path: &Path) -> Result<String> {
    std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read corpus file {}", path.display()))
}

fn parse_value<T: std::str::FromStr>(value: &str, key: &str) -> Result<T, PipelineError> {
    value
        .trim()
        .parse::<T>()
        .map_err(|_| PipelineError::InvalidConfig(format!("{key}={value:?} is not valid")))
}

fn parse_or<T: std::str::FromStr>(value: Option<String>, key: &str, default: T) -> Result<T, PipelineError> {
    value.map_or(Ok(default), |v| parse_value(&v, key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|k| map.get(k).cloned())
    }

    #[test]
    fn test_defaults() {
        let c = config_from(&[]).unwrap();
        assert_eq!(c.filename_template, DEFAULT_FILENAME_TEMPLATE);
        assert_eq!(c.years(), 2001..=2022);
        assert!((c.threshold - 0.55).abs() < f64::EPSILON);
        assert_eq!(c.strategy, ScoreStrategy::MaxPair);
        assert_eq!(c.states, None);
        assert_eq!(c.delimiter, b',');
        assert!(c.validate().is_ok());
    }

    #[test]
    fn test_env_values() {
        let c = config_from(&[
            ("OCCSIFT_START_YEAR", "2019"),
            ("OCCSIFT_END_YEAR", "2021"),
            ("OCCSIFT_THRESHOLD", "0.7"),
            ("OCCSIFT_STATES", "Texas, North Carolina ,"),
            ("OCCSIFT_STRATEGY", "mean-best-match"),
            ("OCCSIFT_DELIMITER", "tab"),
            ("OCCSIFT_MODEL_PATH", "/models/vectors.txt"),
        ])
        .unwrap();
        assert_eq!(c.years(), 2019..=2021);
        assert!((c.threshold - 0.7).abs() < f64::EPSILON);
        assert_eq!(
            c.states,
            Some(vec!["Texas".to_string(), "North Carolina".to_string()])
        );
        assert_eq!(c.strategy, ScoreStrategy::MeanBestMatch);
        assert_eq!(c.delimiter, b'\t');
        assert_eq!(c.classifier_settings().model_format, ModelFormat::Text);
    }

    #[test]
    fn test_blank_value_is_unset() {
        assert_eq!(non_blank(Some("  ".to_string())), None);
        assert_eq!(non_blank(Some("0.7".to_string())), Some("0.7".to_string()));

        let c = config_from(&[("OCCSIFT_THRESHOLD", " "), ("OCCSIFT_STATES", "")]).unwrap();
        assert!((c.threshold - DEFAULT_THRESHOLD).abs() < f64::EPSILON);
        assert_eq!(c.states, None);
        assert!(!env_is_set("OCCSIFT_TEST_NEVER_SET_KEY"));
    }

    #[test]
    fn test_unparsable_value_is_error() {
        assert!(config_from(&[("OCCSIFT_THRESHOLD", "high")]).is_err());
        assert!(config_from(&[("OCCSIFT_DELIMITER", ";;")]).is_err());
    }

    #[test]
    fn test_validate_rejects_reversed_years() {
        let c = config_from(&[("OCCSIFT_START_YEAR", "2022"), ("OCCSIFT_END_YEAR", "2001")])
            .unwrap();
        assert!(matches!(c.validate(), Err(PipelineError::InvalidConfig(_))));
    }

    #[test]
    fn test_validate_rejects_template_without_year() {
        let c = config_from(&[("OCCSIFT_FILENAME_TEMPLATE", "state.csv")]).unwrap();
        assert!(c.validate().is_err());
    }

    #[test]
    fn test_resolve_corpus_sources() {
        let c = config_from(&[]).unwrap();
        assert_eq!(c.resolve_corpus(Some("forklift"), None).unwrap(), "forklift");
        assert!(c.resolve_corpus(None, None).is_err());

        let preset = presets::find("light-industrial").unwrap();
        assert!(c.resolve_corpus(Some("x"), Some(preset)).is_err());
        assert!(c.resolve_corpus(None, Some(preset)).unwrap().contains("assembly"));
    }

    #[test]
    fn test_apply_preset_respects_explicit_values() {
        let mut c = config_from(&[]).unwrap();
        c.threshold = 0.8;
        let preset = presets::find("light-industrial").unwrap();
        c.apply_preset(preset, false, true);
        assert_eq!(c.states.as_ref().map(Vec::len), Some(11));
        assert!((c.threshold - 0.8).abs() < f64::EPSILON);
    }
}
