// Word similarity trait: the seam between the classifier and whatever
// embedding model backs it.
//
// The default implementation is a word2vec vector table. Tests substitute
// a fixed table of pair scores so classifier results are exact.

/// A source of word-to-word similarity scores.
pub trait WordSimilarity {
    /// Similarity of two single-word tokens, in [-1, 1].
    ///
    /// Returns `None` when either word is outside the model's vocabulary.
    /// A missing score is not an error; callers skip the pair.
    fn similarity(&self, a: &str, b: &str) -> Option<f64>;
}

impl<T: WordSimilarity + ?Sized> WordSimilarity for &T {
    fn similarity(&self, a: &str, b: &str) -> Option<f64> {
        (**self).similarity(a, b)
    }
}
