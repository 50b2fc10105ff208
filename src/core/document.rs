// src/core/document.rs

use serde_json::Value;
use std::{
    fmt, fs,
    path::{Path, PathBuf},
};
use thiserror::Error;

/// Errors raised while loading a raw command document.
#[derive(Error, Debug)]
pub enum SourceError {
    /// The document could not be read from disk.
    #[error("Cannot read command document '{path}': {source}")]
    SourceUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The document was read but is not a valid JSON/TOML mapping.
    #[error("Malformed command document '{origin}': {reason}")]
    SourceMalformed { origin: String, reason: String },
}

/// Where a raw command tree comes from.
///
/// Files ending in `.toml` are parsed as TOML, everything else as JSON. Inline
/// documents are mappings built in memory (e.g. with `serde_json::json!`) or nested in
/// another document; `base_dir` is where their relative subtree files live.
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentSource {
    File(PathBuf),
    Inline {
        document: Value,
        base_dir: Option<PathBuf>,
    },
}

impl DocumentSource {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::File(path.into())
    }

    /// An in-memory document; relative subtree files resolve against the working directory.
    pub fn inline(document: Value) -> Self {
        Self::Inline {
            document,
            base_dir: None,
        }
    }

    /// Loads the raw mapping. The top level must be a mapping.
    pub fn load(&self) -> Result<Value, SourceError> {
        let value = match self {
            Self::Inline { document, .. } => document.clone(),
            Self::File(path) => {
                log::debug!("Loading command document from '{}'", path.display());
                let content =
                    fs::read_to_string(path).map_err(|e| SourceError::SourceUnreadable {
                        path: path.clone(),
                        source: e,
                    })?;
                parse_document(path, &content)?
            }
        };

        if !value.is_object() {
            return Err(SourceError::SourceMalformed {
                origin: self.to_string(),
                reason: "the top level of a command document must be a mapping".to_string(),
            });
        }
        Ok(value)
    }

    /// Directory that relative subtree references in this document resolve against.
    pub fn base_dir(&self) -> Option<PathBuf> {
        match self {
            Self::File(path) => path.parent().map(Path::to_path_buf),
            Self::Inline { base_dir, .. } => base_dir.clone(),
        }
    }
}

impl fmt::Display for DocumentSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Inline { .. } => write!(f, "<inline document>"),
        }
    }
}

fn parse_document(path: &Path, content: &str) -> Result<Value, SourceError> {
    let is_toml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));

    let parsed = if is_toml {
        toml::from_str::<Value>(content).map_err(|e| e.to_string())
    } else {
        serde_json::from_str::<Value>(content).map_err(|e| e.to_string())
    };

    parsed.map_err(|reason| SourceError::SourceMalformed {
        origin: path.display().to_string(),
        reason,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_json_file_keeps_declaration_order() {
        let mut file = NamedTempFile::with_suffix(".json").unwrap();
        write!(file, r#"{{"zeta": {{}}, "alpha": {{}}, "mid": {{}}}}"#).unwrap();

        let value = DocumentSource::file(file.path()).load().unwrap();
        let keys: Vec<_> = value.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_load_toml_file() {
        let mut file = NamedTempFile::with_suffix(".toml").unwrap();
        write!(
            file,
            "[hello]\nhelp = \"say hello\"\n[hello.cmd]\nshell = \"echo hi\"\n"
        )
        .unwrap();

        let value = DocumentSource::file(file.path()).load().unwrap();
        assert_eq!(value["hello"]["help"], json!("say hello"));
        assert_eq!(value["hello"]["cmd"]["shell"], json!("echo hi"));
    }

    #[test]
    fn test_missing_file_is_unreadable() {
        let err = DocumentSource::file("definitely/not/here.json")
            .load()
            .unwrap_err();
        assert!(matches!(err, SourceError::SourceUnreadable { .. }));
    }

    #[test]
    fn test_invalid_json_is_malformed() {
        let mut file = NamedTempFile::with_suffix(".json").unwrap();
        write!(file, "{{ not json").unwrap();
        let err = DocumentSource::file(file.path()).load().unwrap_err();
        assert!(matches!(err, SourceError::SourceMalformed { .. }));
    }

    #[test]
    fn test_top_level_must_be_a_mapping() {
        let err = DocumentSource::inline(json!(["a", "b"])).load().unwrap_err();
        assert!(matches!(err, SourceError::SourceMalformed { .. }));
    }

    #[test]
    fn test_base_dir() {
        let source = DocumentSource::file("/etc/jcmd/router.json");
        assert_eq!(source.base_dir(), Some(PathBuf::from("/etc/jcmd")));
        assert_eq!(DocumentSource::inline(json!({})).base_dir(), None);

        let nested = DocumentSource::Inline {
            document: json!({}),
            base_dir: Some(PathBuf::from("/etc/jcmd")),
        };
        assert_eq!(nested.base_dir(), Some(PathBuf::from("/etc/jcmd")));
    }
}
