// Relevance classifier: which occupation titles belong to an industry.
//
// Every distinct title in the unified table is tokenized and compared,
// word by word, against the tokenized industry description. Under the
// default strategy a title's score is the single best (title word, corpus
// word) similarity, so one strongly matching word is enough to qualify a
// long title. A title is relevant iff its score is strictly above the
// threshold.
//
// A pair involving an out-of-vocabulary word scores 0.0 under max-pair,
// so an unknown word can neither qualify a title nor sink it. A title
// with no tokens, or an empty corpus, scores 0.0.

use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::embeddings::{ModelFormat, WordVectors};
use super::tokenize::Tokenizer;
use super::traits::WordSimilarity;
use crate::error::Result;
use crate::schema::renames::OCC_TITLE;
use crate::schema::Table;

/// Threshold used by the reference configuration.
pub const DEFAULT_THRESHOLD: f64 = 0.55;

/// How a title's pairwise similarities are reduced to one score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScoreStrategy {
    /// Maximum over the whole title-by-corpus similarity matrix.
    #[default]
    MaxPair,
    /// Mean over title words of each word's best corpus match.
    MeanBestMatch,
}

impl ScoreStrategy {
    /// Score one tokenized title against the tokenized corpus.
    pub fn score<S: WordSimilarity + ?Sized>(
        self,
        model: &S,
        title: &[String],
        corpus: &[String],
    ) -> f64 {
        match self {
            // An out-of-vocabulary pair counts as 0.0 for that pair only.
            Self::MaxPair => title
                .iter()
                .flat_map(|t| {
                    corpus
                        .iter()
                        .map(move |c| model.similarity(t, c).unwrap_or(0.0))
                })
                .reduce(f64::max)
                .unwrap_or(0.0),
            Self::MeanBestMatch => {
                let best: Vec<f64> = title
                    .iter()
                    .filter_map(|t| best_match(model, t, corpus))
                    .collect();
                if best.is_empty() {
                    0.0
                } else {
                    best.iter().sum::<f64>() / best.len() as f64
                }
            }
        }
    }
}

impl fmt::Display for ScoreStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::MaxPair => "max-pair",
            Self::MeanBestMatch => "mean-best-match",
        })
    }
}

impl FromStr for ScoreStrategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "max-pair" | "max" => Ok(Self::MaxPair),
            "mean-best-match" | "mean" => Ok(Self::MeanBestMatch),
            other => Err(format!(
                "unknown score strategy {other:?} (expected max-pair or mean-best-match)"
            )),
        }
    }
}

/// Best similarity of `word` against any corpus token, skipping
/// out-of-vocabulary pairs. `None` if no pair had a score.
fn best_match<S: WordSimilarity + ?Sized>(model: &S, word: &str, corpus: &[String]) -> Option<f64> {
    corpus
        .iter()
        .filter_map(|c| model.similarity(word, c))
        .reduce(f64::max)
}

/// Score and verdict for one distinct title.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TitleScore {
    pub title: String,
    pub score: f64,
    pub relevant: bool,
}

/// Outcome of a classification run: every distinct title in first-seen
/// order with its score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub threshold: f64,
    pub strategy: ScoreStrategy,
    pub corpus_tokens: usize,
    pub scores: Vec<TitleScore>,
}

impl Classification {
    /// The relevant title set.
    pub fn relevant_titles(&self) -> HashSet<String> {
        self.scores
            .iter()
            .filter(|s| s.relevant)
            .map(|s| s.title.clone())
            .collect()
    }

    pub fn relevant_count(&self) -> usize {
        self.scores.iter().filter(|s| s.relevant).count()
    }

    /// Titles ranked by descending score. Ties keep first-seen order.
    pub fn ranked(&self) -> Vec<&TitleScore> {
        let mut ranked: Vec<&TitleScore> = self.scores.iter().collect();
        ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
        ranked
    }
}

/// Classifier over an already-loaded model and tokenizer.
pub struct RelevanceClassifier<'a, S: WordSimilarity + ?Sized> {
    model: &'a S,
    tokenizer: &'a Tokenizer,
    pub threshold: f64,
    pub strategy: ScoreStrategy,
}

impl<'a, S: WordSimilarity + ?Sized> RelevanceClassifier<'a, S> {
    pub fn new(model: &'a S, tokenizer: &'a Tokenizer, threshold: f64) -> Self {
        Self {
            model,
            tokenizer,
            threshold,
            strategy: ScoreStrategy::default(),
        }
    }

    pub fn with_strategy(mut self, strategy: ScoreStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Classify every distinct occupation title in `table`.
    pub fn classify(&self, table: &Table, corpus: &str) -> Classification {
        self.classify_titles(&table.distinct_values(OCC_TITLE), corpus)
    }

    /// Classify an explicit list of titles. Duplicates are scored once.
    pub fn classify_titles(&self, titles: &[&str], corpus: &str) -> Classification {
        let corpus_tokens = dedup(self.tokenizer.tokenize_corpus(corpus));
        info!(
            titles = titles.len(),
            corpus_tokens = corpus_tokens.len(),
            threshold = self.threshold,
            strategy = %self.strategy,
            "Scoring occupation titles"
        );

        let pb = ProgressBar::new(titles.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("  Titles [{bar:30}] {pos}/{len} ({eta})")
                .unwrap(),
        );

        let mut seen = HashSet::new();
        let mut scores = Vec::with_capacity(titles.len());
        for &title in titles {
            pb.inc(1);
            if !seen.insert(title) {
                continue;
            }
            let tokens = self.tokenizer.tokenize_title(title);
            let score = self.strategy.score(self.model, &tokens, &corpus_tokens);
            let relevant = score > self.threshold;
            debug!(title, score, relevant, "Scored title");
            scores.push(TitleScore {
                title: title.to_string(),
                score,
                relevant,
            });
        }
        pb.finish_and_clear();

        let classification = Classification {
            threshold: self.threshold,
            strategy: self.strategy,
            corpus_tokens: corpus_tokens.len(),
            scores,
        };
        info!(
            titles = classification.scores.len(),
            relevant = classification.relevant_count(),
            "Classified occupation titles"
        );
        classification
    }
}

/// Where the model lives and how to score.
#[derive(Debug, Clone)]
pub struct ClassifierSettings {
    pub model_path: PathBuf,
    pub model_format: ModelFormat,
    pub max_vocab: Option<usize>,
    pub threshold: f64,
    pub strategy: ScoreStrategy,
}

/// Load the model named in `settings` and classify the titles of `table`
/// against `corpus`. The model and stop-word set live for this call only.
pub fn classify_table(
    table: &Table,
    corpus: &str,
    settings: &ClassifierSettings,
) -> Result<Classification> {
    let model = WordVectors::load(&settings.model_path, settings.model_format, settings.max_vocab)?;
    let tokenizer = Tokenizer::english();
    let classification = RelevanceClassifier::new(&model, &tokenizer, settings.threshold)
        .with_strategy(settings.strategy)
        .classify(table, corpus);
    Ok(classification)
}

/// Drop repeated tokens, keeping first-seen order. Neither strategy's
/// result depends on repeats in the corpus.
fn dedup(tokens: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    tokens
        .into_iter()
        .filter(|t| seen.insert(t.clone()))
        .collect()
}
