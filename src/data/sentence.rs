use serde::{Deserialize, Serialize};

/// Represents the per-token annotation arrays of a single sentence.
///
/// All sequences are parallel: entry `i` of each array describes token `i`.
/// Only `lemmas` and `ner_tags` are consulted by the current labeling rules;
/// the remaining fields ride along because the extraction harness supplies
/// them with every candidate row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SentenceAnnotations {
    #[serde(default)]
    pub tokens: Vec<String>,
    pub lemmas: Vec<String>,
    #[serde(default)]
    pub pos_tags: Vec<String>,
    pub ner_tags: Vec<String>,
    #[serde(default)]
    pub dep_types: Vec<String>,
    #[serde(default)]
    pub dep_heads: Vec<i64>,
}

impl SentenceAnnotations {
    /// Sentence length in tokens, taken from the lemma array
    pub fn num_tokens(&self) -> usize {
        self.lemmas.len()
    }

    /// Check that every non-empty annotation array agrees on the token count
    pub fn is_aligned(&self) -> bool {
        let n = self.num_tokens();
        let text_arrays = [&self.tokens, &self.pos_tags, &self.ner_tags, &self.dep_types];
        text_arrays.iter().all(|a| a.is_empty() || a.len() == n)
            && (self.dep_heads.is_empty() || self.dep_heads.len() == n)
    }

    /// Get the sentence as a string
    pub fn sentence_text(&self) -> String {
        self.tokens.join(" ")
    }
}
