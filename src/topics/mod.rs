// Topic matching: tokenization, word vectors, and title relevance scoring.

pub mod embeddings;
pub mod relevance;
pub mod tokenize;
pub mod traits;
