// Pretrained word2vec vectors.
//
// Loads the classic word2vec formats (the binary layout used by the
// GoogleNews release, and the plain-text layout) into one flat f32 buffer
// with a word -> row index. Rows are L2-normalised at load; similarity is
// the cosine of the two vectors, in [-1, 1]. Out-of-vocabulary words yield
// no score rather than an error.
//
// Header counts are never trusted for allocation: upfront capacity is
// capped by what the file could actually hold.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use super::traits::WordSimilarity;
use crate::error::{PipelineError, Result};

/// On-disk layout of a word2vec model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelFormat {
    /// `<vocab> <dim>\n` then per word: `word ` followed by `dim` little-endian f32s.
    Binary,
    /// One `word v1 v2 ... vdim` line per word, optionally preceded by a
    /// `<vocab> <dim>` header line.
    Text,
}

impl ModelFormat {
    /// Guess the format from the file extension: `.txt` and `.vec` are
    /// text, anything else binary.
    pub fn infer(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("txt") | Some("vec") => Self::Text,
            _ => Self::Binary,
        }
    }
}

impl std::str::FromStr for ModelFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "binary" | "bin" => Ok(Self::Binary),
            "text" | "txt" => Ok(Self::Text),
            other => Err(format!("unknown model format {other:?} (expected binary or text)")),
        }
    }
}

/// A word vector table.
#[derive(Debug, Clone)]
pub struct WordVectors {
    dim: usize,
    index: HashMap<String, usize>,
    /// `index.len() * dim` floats, one normalised row per word.
    data: Vec<f32>,
}

impl WordVectors {
    /// Load a model file. `max_vocab` keeps only the first N entries.
    pub fn load(path: &Path, format: ModelFormat, max_vocab: Option<usize>) -> Result<Self> {
        let file = File::open(path).map_err(|e| PipelineError::model_load(path, e.to_string()))?;
        let file_len = file
            .metadata()
            .map_err(|e| PipelineError::model_load(path, e.to_string()))?
            .len();
        let reader = BufReader::with_capacity(1 << 20, file);

        let vectors = match format {
            ModelFormat::Binary => Self::read_binary(reader, path, file_len, max_vocab)?,
            ModelFormat::Text => Self::read_text(reader, path, file_len, max_vocab)?,
        };

        info!(
            path = %path.display(),
            words = vectors.len(),
            dim = vectors.dim,
            "Loaded word vectors"
        );
        Ok(vectors)
    }

    /// Build a table directly from (word, vector) pairs. All vectors must
    /// share the length of the first; later duplicates of a word are ignored.
    pub fn from_pairs<I, S>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, Vec<f32>)>,
        S: Into<String>,
    {
        let mut vectors: Option<Self> = None;
        for (word, vector) in pairs {
            let table = vectors.get_or_insert_with(|| Self::empty(vector.len()));
            if vector.len() != table.dim {
                return Err(PipelineError::model_load(
                    "<memory>",
                    format!("vector length {} != {}", vector.len(), table.dim),
                ));
            }
            table.insert(word.into(), vector);
        }
        Ok(vectors.unwrap_or_else(|| Self::empty(0)))
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn contains(&self, word: &str) -> bool {
        self.index.contains_key(word)
    }

    /// The unit-length vector stored for `word`.
    pub fn vector(&self, word: &str) -> Option<&[f32]> {
        let row = *self.index.get(word)?;
        Some(&self.data[row * self.dim..(row + 1) * self.dim])
    }

    fn empty(dim: usize) -> Self {
        Self {
            dim,
            index: HashMap::new(),
            data: Vec::new(),
        }
    }

    fn with_capacity(dim: usize, words: usize) -> Self {
        Self {
            dim,
            index: HashMap::with_capacity(words),
            data: Vec::with_capacity(words.saturating_mul(dim)),
        }
    }

    /// Append a word. Returns false (and stores nothing) for a repeat.
    fn insert(&mut self, word: String, mut vector: Vec<f32>) -> bool {
        if self.index.contains_key(&word) {
            return false;
        }
        normalize(&mut vector);
        self.index.insert(word, self.index.len());
        self.data.extend_from_slice(&vector);
        true
    }

    fn read_binary<R: BufRead>(
        mut reader: R,
        path: &Path,
        file_len: u64,
        max_vocab: Option<usize>,
    ) -> Result<Self> {
        let fail = |reason: String| PipelineError::model_load(path, reason);

        let (vocab, dim) = read_header(&mut reader, path)?;
        let row_bytes = dim
            .checked_mul(4)
            .filter(|&n| n as u64 <= file_len)
            .ok_or_else(|| fail(format!("dimension {dim} does not fit in a {file_len}-byte file")))?;
        let wanted = max_vocab.map_or(vocab, |m| m.min(vocab));
        // Each entry is at least the vector plus a one-byte word and its space.
        let capacity = capacity_hint(wanted, file_len, row_bytes.saturating_add(2));
        let mut vectors = Self::with_capacity(dim, capacity);

        let pb = load_progress(wanted);
        let mut word = Vec::with_capacity(64);
        let mut raw = vec![0u8; row_bytes];
        let mut duplicates = 0usize;

        for i in 0..wanted {
            word.clear();
            reader
                .read_until(b' ', &mut word)
                .map_err(|e| fail(format!("entry {i}: {e}")))?;
            if word.last() != Some(&b' ') {
                return Err(fail(format!("truncated at entry {i} of {vocab}")));
            }
            word.pop();
            // Entries may be separated by a newline after the previous vector.
            let start = word.iter().position(|&b| b != b'\n').unwrap_or(word.len());
            if start == word.len() {
                return Err(fail(format!("empty word at entry {i}")));
            }

            reader
                .read_exact(&mut raw)
                .map_err(|_| fail(format!("truncated vector at entry {i} of {vocab}")))?;
            let vector = raw
                .chunks_exact(4)
                .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
                .collect();

            let text = String::from_utf8_lossy(&word[start..]).into_owned();
            if !vectors.insert(text, vector) {
                duplicates += 1;
            }
            if i % 10_000 == 0 {
                pb.set_position(i as u64);
            }
        }
        pb.finish_and_clear();

        if duplicates > 0 {
            warn!(duplicates, "Model contains repeated words; kept the first of each");
        }
        Ok(vectors)
    }

    fn read_text<R: BufRead>(
        reader: R,
        path: &Path,
        file_len: u64,
        max_vocab: Option<usize>,
    ) -> Result<Self> {
        let fail = |reason: String| PipelineError::model_load(path, reason);

        let mut lines = reader.lines().enumerate().peekable();

        // An optional "<vocab> <dim>" header; GloVe-style files go straight to vectors.
        let header = match lines.peek() {
            Some((_, Ok(first))) => parse_text_header(first),
            _ => None,
        };
        // A text entry takes at least two bytes per value plus a word.
        let mut vectors = header.map(|(vocab, dim)| {
            let wanted = max_vocab.map_or(vocab, |m| m.min(vocab));
            let min_entry = dim.saturating_mul(2).saturating_add(2);
            Self::with_capacity(dim, capacity_hint(wanted, file_len, min_entry))
        });
        if header.is_some() {
            lines.next();
        }

        let limit = max_vocab.unwrap_or(usize::MAX);
        for (line_no, line) in lines {
            if vectors.as_ref().is_some_and(|t| t.len() >= limit) {
                break;
            }
            let line = line.map_err(|e| fail(format!("line {}: {e}", line_no + 1)))?;
            let mut parts = line.split_whitespace();
            let Some(word) = parts.next() else {
                continue;
            };
            let vector = parts
                .map(str::parse::<f32>)
                .collect::<std::result::Result<Vec<f32>, _>>()
                .map_err(|e| fail(format!("line {}: {e}", line_no + 1)))?;

            let table = vectors.get_or_insert_with(|| Self::empty(vector.len()));
            if vector.len() != table.dim || table.dim == 0 {
                return Err(fail(format!(
                    "line {}: expected {} values, found {}",
                    line_no + 1,
                    table.dim,
                    vector.len()
                )));
            }
            table.insert(word.to_string(), vector);
        }

        vectors.ok_or_else(|| fail("no vectors in file".to_string()))
    }
}

impl WordSimilarity for WordVectors {
    fn similarity(&self, a: &str, b: &str) -> Option<f64> {
        Some(cosine_similarity(self.vector(a)?, self.vector(b)?))
    }
}

/// Cosine similarity between two vectors of equal length, in [-1, 1].
///
/// Mismatched lengths, empty input, or a zero vector give 0.0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mag_a = dot(a, a).sqrt();
    let mag_b = dot(b, b).sqrt();
    let denom = mag_a * mag_b;
    if denom < f64::EPSILON {
        0.0
    } else {
        (dot(a, b) / denom).clamp(-1.0, 1.0)
    }
}

fn dot(a: &[f32], b: &[f32]) -> f64 {
    a.iter().zip(b).map(|(x, y)| *x as f64 * *y as f64).sum()
}

fn normalize(v: &mut [f32]) {
    let norm = dot(v, v).sqrt();
    if norm > f64::EPSILON {
        for x in v.iter_mut() {
            *x = (*x as f64 / norm) as f32;
        }
    }
}

fn read_header<R: BufRead>(reader: &mut R, path: &Path) -> Result<(usize, usize)> {
    let mut line = Vec::new();
    reader
        .read_until(b'\n', &mut line)
        .map_err(|e| PipelineError::model_load(path, e.to_string()))?;
    let text = String::from_utf8_lossy(&line);
    let mut parts = text.split_whitespace().map(str::parse::<usize>);

    match (parts.next(), parts.next(), parts.next()) {
        (Some(Ok(vocab)), Some(Ok(dim)), None) if dim > 0 => Ok((vocab, dim)),
        _ => Err(PipelineError::model_load(
            path,
            format!("bad header {:?}, expected \"<vocab> <dim>\"", text.trim()),
        )),
    }
}

/// Entries to reserve room for: the declared count, capped by how many
/// entries of at least `min_entry_bytes` the file could hold.
fn capacity_hint(declared: usize, file_len: u64, min_entry_bytes: usize) -> usize {
    let fits = file_len / min_entry_bytes.max(1) as u64;
    declared.min(usize::try_from(fits).unwrap_or(usize::MAX))
}

fn parse_text_header(line: &str) -> Option<(usize, usize)> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    match parts.as_slice() {
        [vocab, dim] => Some((vocab.parse().ok()?, dim.parse().ok()?)),
        _ => None,
    }
}

fn load_progress(len: usize) -> ProgressBar {
    let pb = ProgressBar::new(len as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("  Vectors [{bar:30}] {pos}/{len} ({eta})")
            .unwrap(),
    );
    pb
}
