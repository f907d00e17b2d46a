use crate::app::{split_words, KeyValue, MapReduceApp};

/// Conteo de palabras: cada palabra emite `(palabra, "1")` y el reduce
/// devuelve cuántas veces apareció.
pub struct WordCount;

impl MapReduceApp for WordCount {
    fn name(&self) -> &'static str {
        "wordcount"
    }

    fn map(&self, _filename: &str, contents: &str) -> Vec<KeyValue> {
        split_words(contents)
            .map(|w| KeyValue::new(w, "1"))
            .collect()
    }

    fn reduce(&self, _key: &str, values: &[String]) -> String {
        values.len().to_string()
    }
}
