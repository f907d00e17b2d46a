use serde::{Deserialize, Serialize};

use crate::{indexer::Indexer, wordcount::WordCount};

/// Par clave/valor emitido por `map`.
///
/// Se serializa con nombres `Key`/`Value`: es el formato de los archivos
/// intermedios `mr-<m>-<r>` (una línea JSON por par).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct KeyValue {
    pub key: String,
    pub value: String,
}

impl KeyValue {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Funciones de usuario que el worker ejecuta. Deben ser puras: una tarea
/// puede ejecutarse más de una vez.
pub trait MapReduceApp: Send + Sync {
    fn name(&self) -> &'static str;

    fn map(&self, filename: &str, contents: &str) -> Vec<KeyValue>;

    fn reduce(&self, key: &str, values: &[String]) -> String;
}

pub const APP_NAMES: &[&str] = &["wordcount", "indexer"];

/// Busca una app incluida por nombre.
pub fn app_by_name(name: &str) -> Option<Box<dyn MapReduceApp>> {
    match name {
        "wordcount" | "wc" => Some(Box::new(WordCount)),
        "indexer" => Some(Box::new(Indexer)),
        _ => None,
    }
}

/// Separa en palabras: secuencias maximales de letras.
pub(crate) fn split_words(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| !c.is_alphabetic())
        .filter(|w| !w.is_empty())
}
