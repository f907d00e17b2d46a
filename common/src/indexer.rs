use std::collections::BTreeSet;

use crate::app::{split_words, KeyValue, MapReduceApp};

/// Índice invertido: para cada palabra, en qué documentos aparece.
pub struct Indexer;

impl MapReduceApp for Indexer {
    fn name(&self) -> &'static str {
        "indexer"
    }

    fn map(&self, filename: &str, contents: &str) -> Vec<KeyValue> {
        let words: BTreeSet<&str> = split_words(contents).collect();
        words
            .into_iter()
            .map(|w| KeyValue::new(w, filename))
            .collect()
    }

    // "<n> doc1,doc2,..." con documentos ordenados
    fn reduce(&self, _key: &str, values: &[String]) -> String {
        let mut docs: Vec<&str> = values.iter().map(String::as_str).collect();
        docs.sort_unstable();
        format!("{} {}", docs.len(), docs.join(","))
    }
}
