//! Loading survey snapshots from JSON or TOML files.

use std::collections::BTreeMap;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::{AnswerValue, Question, ScoreConfig};
use crate::core::{Error, Result};

/// Answers keyed by question id. Ordered so traces are reproducible.
pub type AnswerSet = BTreeMap<String, AnswerValue>;

/// A survey snapshot as exported by the builder.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyDocument {
    #[serde(default)]
    pub questions: Vec<Question>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score_config: Option<ScoreConfig>,
}

impl SurveyDocument {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        load_document(path)
    }
}

/// Deserialize a JSON (`.json`) or TOML (`.toml`) file.
pub fn load_document<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(Error::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    let content = std::fs::read_to_string(path)?;

    match extension.as_deref() {
        Some("json") => Ok(serde_json::from_str(&content)?),
        Some("toml") => Ok(toml::from_str(&content)?),
        _ => Err(Error::UnsupportedFormat {
            path: path.to_path_buf(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_json_document() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("survey.json");
        std::fs::write(
            &path,
            r#"{"questions":[{"id":"q1","order":0,"text":"Hi"}],"scoreConfig":{"enabled":true}}"#,
        )
        .unwrap();
        let doc = SurveyDocument::from_path(&path).unwrap();
        assert_eq!(doc.questions.len(), 1);
        assert!(doc.score_config.unwrap().enabled);
    }

    #[test]
    fn test_load_toml_document() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("survey.toml");
        std::fs::write(
            &path,
            "[[questions]]\nid = \"q1\"\norder = 0\ntext = \"Hi\"\ntype = \"rating\"\n",
        )
        .unwrap();
        let doc = SurveyDocument::from_path(&path).unwrap();
        assert_eq!(doc.questions[0].id, "q1");
        assert!(doc.score_config.is_none());
    }

    #[test]
    fn test_load_answers() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("answers.json");
        std::fs::write(&path, r#"{"q2": 3, "q1": "yes"}"#).unwrap();
        let answers: AnswerSet = load_document(&path).unwrap();
        let keys: Vec<_> = answers.keys().cloned().collect();
        assert_eq!(keys, vec!["q1".to_string(), "q2".to_string()]);
    }

    #[test]
    fn test_missing_and_unsupported() {
        let dir = TempDir::new().unwrap();
        let missing = load_document::<SurveyDocument>(dir.path().join("nope.json"));
        assert!(matches!(missing, Err(Error::FileNotFound { .. })));

        let path = dir.path().join("survey.yaml");
        std::fs::write(&path, "questions: []").unwrap();
        let unsupported = load_document::<SurveyDocument>(&path);
        assert!(matches!(unsupported, Err(Error::UnsupportedFormat { .. })));
    }
}
