//! Okapi BM25 scoring over the document corpus.
//!
//! The index is rebuilt per search from `(file_name, content)` pairs; the
//! corpus is small enough (hundreds of specification documents) that this
//! stays well under a millisecond.
//!
//! Terms occurring in half the corpus or more get a non-positive IDF under
//! plain Okapi. Those are floored at `EPSILON` times the average positive
//! IDF so common terms still contribute a small positive amount instead of
//! penalizing otherwise-good matches. When no term has a positive IDF the
//! floor falls back to `EPSILON` itself.

/// Term-frequency saturation parameter.
pub const K1: f64 = 1.5;

/// Length-normalization parameter.
pub const B: f64 = 0.75;

/// Floor factor for non-positive IDF values, relative to the average
/// positive IDF.
pub const EPSILON: f64 = 0.25;

/// In-memory BM25 index over named documents.
#[derive(Debug)]
pub struct Bm25Index {
    names: Vec<String>,
    term_freqs: Vec<std::collections::HashMap<String, usize>>,
    doc_lens: Vec<f64>,
    avg_doc_len: f64,
    idf: std::collections::HashMap<String, f64>,
}

/// Tokenize text into lowercased terms.
///
/// Alphanumeric runs become word tokens; CJK codepoints are emitted as
/// single-character tokens so Chinese/Japanese queries match without a
/// segmenter.
pub fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut word = String::new();

    for ch in text.chars() {
        if is_cjk(ch) {
            if !word.is_empty() {
                tokens.push(std::mem::take(&mut word));
            }
            tokens.push(ch.to_string());
        } else if ch.is_alphanumeric() {
            word.extend(ch.to_lowercase());
        } else if !word.is_empty() {
            tokens.push(std::mem::take(&mut word));
        }
    }
    if !word.is_empty() {
        tokens.push(word);
    }

    tokens
}

fn is_cjk(ch: char) -> bool {
    matches!(ch,
        '\u{4E00}'..='\u{9FFF}'   // CJK Unified Ideographs
        | '\u{3400}'..='\u{4DBF}' // Extension A
        | '\u{F900}'..='\u{FAFF}' // Compatibility Ideographs
        | '\u{3040}'..='\u{30FF}' // Hiragana + Katakana
        | '\u{AC00}'..='\u{D7AF}' // Hangul Syllables
    )
}

impl Bm25Index {
    /// Build an index from `(file_name, content)` pairs.
    pub fn build(documents: &[(String, String)]) -> Self {
        let mut names = Vec::with_capacity(documents.len());
        let mut term_freqs = Vec::with_capacity(documents.len());
        let mut doc_lens = Vec::with_capacity(documents.len());
        let mut doc_freq: std::collections::HashMap<String, usize> =
            std::collections::HashMap::new();

        for (name, content) in documents {
            let tokens = tokenize(content);
            doc_lens.push(tokens.len() as f64);

            let mut freqs: std::collections::HashMap<String, usize> =
                std::collections::HashMap::new();
            for token in tokens {
                *freqs.entry(token).or_insert(0) += 1;
            }
            for term in freqs.keys() {
                *doc_freq.entry(term.clone()).or_insert(0) += 1;
            }

            names.push(name.clone());
            term_freqs.push(freqs);
        }

        let corpus_size = names.len() as f64;
        let avg_doc_len = if doc_lens.is_empty() {
            0.0
        } else {
            doc_lens.iter().sum::<f64>() / corpus_size
        };

        // Okapi IDF, then floor non-positive values at EPSILON times the
        // average of the positive ones. The average is taken over positive
        // IDFs only: in a tiny corpus every IDF can be non-positive (one
        // document makes all of them ln(1/3)), and an all-value average
        // would yield a negative floor that keeps every score at zero.
        let mut idf: std::collections::HashMap<String, f64> = doc_freq
            .iter()
            .map(|(term, &df)| {
                let value = ((corpus_size - df as f64 + 0.5) / (df as f64 + 0.5)).ln();
                (term.clone(), value)
            })
            .collect();

        let positive_sum: f64 = idf.values().filter(|v| **v > 0.0).sum();
        let positive_count = idf.values().filter(|v| **v > 0.0).count();
        let floor = if positive_count == 0 {
            EPSILON
        } else {
            EPSILON * positive_sum / positive_count as f64
        };
        for value in idf.values_mut() {
            if *value <= 0.0 {
                *value = floor;
            }
        }

        Self {
            names,
            term_freqs,
            doc_lens,
            avg_doc_len,
            idf,
        }
    }

    /// Score every document against the query.
    fn scores(&self, query_tokens: &[String]) -> Vec<f64> {
        let mut scores = vec![0.0; self.names.len()];

        for term in query_tokens {
            let Some(&idf) = self.idf.get(term) else {
                continue;
            };
            for (i, freqs) in self.term_freqs.iter().enumerate() {
                let tf = *freqs.get(term).unwrap_or(&0) as f64;
                if tf == 0.0 {
                    continue;
                }
                let norm = K1 * (1.0 - B + B * self.doc_lens[i] / self.avg_doc_len);
                scores[i] += idf * (tf * (K1 + 1.0)) / (tf + norm);
            }
        }

        scores
    }

    /// Top `n` documents with a positive score, best first.
    pub fn search(&self, query: &str, n: usize) -> Vec<(String, f64)> {
        let query_tokens = tokenize(query);
        if query_tokens.is_empty() || self.names.is_empty() {
            return Vec::new();
        }

        let mut results: Vec<(String, f64)> = self
            .scores(&query_tokens)
            .into_iter()
            .enumerate()
            .filter(|(_, score)| *score > 0.0)
            .map(|(i, score)| (self.names[i].clone(), score))
            .collect();

        results.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        results.truncate(n);
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus() -> Vec<(String, String)> {
        vec![
            (
                "inbound".to_string(),
                "inbound order maintenance covers receiving and putaway flow".to_string(),
            ),
            (
                "picking".to_string(),
                "picking task release and wave planning for outbound order".to_string(),
            ),
            (
                "cycle-count".to_string(),
                "cycle count scheduling and inventory adjustment".to_string(),
            ),
        ]
    }

    #[test]
    fn tokenize_splits_words_and_lowercases() {
        assert_eq!(tokenize("Inbound Order-Maintenance"), vec!["inbound", "order", "maintenance"]);
        assert_eq!(tokenize("  "), Vec::<String>::new());
    }

    #[test]
    fn tokenize_splits_cjk_per_char() {
        let tokens = tokenize("商品管理 module");
        assert_eq!(tokens, vec!["商", "品", "管", "理", "module"]);
    }

    #[test]
    fn exact_term_ranks_first() {
        let index = Bm25Index::build(&corpus());
        let results = index.search("putaway receiving", 3);
        assert_eq!(results[0].0, "inbound");
    }

    #[test]
    fn absent_term_matches_nothing() {
        let index = Bm25Index::build(&corpus());
        assert!(index.search("blockchain", 3).is_empty());
    }

    #[test]
    fn empty_query_matches_nothing() {
        let index = Bm25Index::build(&corpus());
        assert!(index.search("!!!", 3).is_empty());
        assert!(index.search("", 3).is_empty());
    }

    #[test]
    fn results_respect_limit_and_order() {
        let index = Bm25Index::build(&corpus());
        let results = index.search("order inventory picking", 2);
        assert_eq!(results.len(), 2);
        assert!(results[0].1 >= results[1].1);
    }

    #[test]
    fn common_terms_get_floored_idf() {
        // "order" appears in 2 of 3 docs: raw Okapi IDF is negative
        let index = Bm25Index::build(&corpus());
        let idf = index.idf.get("order").copied().unwrap();
        assert!(idf > 0.0, "negative IDF must be floored, got {idf}");

        // And a query of only that common term still yields positive scores
        let results = index.search("order", 3);
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|(_, s)| *s > 0.0));
    }

    #[test]
    fn single_document_corpus_is_searchable() {
        // With one document every IDF is ln(1/3); an all-value average
        // would give a negative floor and suppress every result
        let docs = vec![(
            "only".to_string(),
            "inbound order receiving flow".to_string(),
        )];
        let index = Bm25Index::build(&docs);
        let results = index.search("receiving", 5);
        assert_eq!(results.len(), 1);
        assert!(results[0].1 > 0.0);
    }

    #[test]
    fn half_corpus_term_still_scores() {
        // A term in exactly 1 of 2 docs has raw IDF ln(1) = 0; it must be
        // floored up, not dropped by the positive-score filter
        let docs = vec![
            ("a".to_string(), "receiving dock schedule".to_string()),
            ("b".to_string(), "wave planning notes".to_string()),
        ];
        let index = Bm25Index::build(&docs);
        let results = index.search("receiving", 2);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].0, "a");
        assert!(results[0].1 > 0.0);
    }

    #[test]
    fn cjk_query_hits_cjk_document() {
        let docs = vec![
            ("goods".to_string(), "商品類別維護作業".to_string()),
            ("storage".to_string(), "儲位管理模組".to_string()),
        ];
        let index = Bm25Index::build(&docs);
        let results = index.search("商品", 2);
        assert_eq!(results[0].0, "goods");
    }

    #[test]
    fn empty_corpus_is_fine() {
        let index = Bm25Index::build(&[]);
        assert!(index.search("anything", 5).is_empty());
    }
}
