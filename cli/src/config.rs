//! Read-side of `~/.chatline/config.toml`.
//!
//! Every accessor tolerates a missing or unparseable file and falls back to
//! its default, so a broken config never keeps the chat from starting.

use std::io::ErrorKind;
use std::path::Path;
use std::path::PathBuf;

use toml_edit::DocumentMut;
use toml_edit::Item as TomlItem;

/// Built-in fallback when neither `--model` nor the config file picks one.
const DEFAULT_MODEL_ID: &str = "claude-sonnet-4-5";
const DEFAULT_ENDPOINT: &str = "https://api.anthropic.com/v1/messages";
const DEFAULT_MAX_TOKENS: u64 = 4096;
const DEFAULT_PLACEHOLDER: &str = "Send a message...";

/// A resolved model selection: the opaque identifier sent to the endpoint
/// plus the label shown in the UI header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelChoice {
    pub id: String,
    pub label: String,
}

#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn new_default() -> anyhow::Result<Self> {
        let Some(home) = dirs::home_dir() else {
            anyhow::bail!("cannot determine home directory for config path");
        };
        Ok(Self::new(default_config_path(&home)))
    }

    /// Resolve `--model`: an alias from the `[models]` table wins, anything
    /// else is passed through as an opaque model identifier. With no
    /// selection at all, `default_model` from the config applies, then the
    /// built-in default.
    pub fn resolve_model(&self, selection: Option<&str>) -> anyhow::Result<ModelChoice> {
        let doc = self.document()?;

        let selection = selection
            .map(str::to_string)
            .or_else(|| doc.as_ref().and_then(read_default_model));

        let Some(selection) = selection else {
            return Ok(ModelChoice {
                id: DEFAULT_MODEL_ID.to_string(),
                label: DEFAULT_MODEL_ID.to_string(),
            });
        };

        if let Some(id) = doc.as_ref().and_then(|doc| read_model_alias(doc, &selection)) {
            return Ok(ModelChoice {
                id,
                label: selection,
            });
        }

        Ok(ModelChoice {
            id: selection.clone(),
            label: selection,
        })
    }

    pub fn endpoint(&self) -> anyhow::Result<String> {
        Ok(self
            .document()?
            .and_then(|doc| read_string(&doc, "endpoint"))
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()))
    }

    pub fn max_tokens(&self) -> anyhow::Result<u64> {
        Ok(self
            .document()?
            .and_then(|doc| read_integer(&doc, "max_tokens"))
            .unwrap_or(DEFAULT_MAX_TOKENS))
    }

    /// Placeholder text for the composer's empty state.
    pub fn placeholder(&self) -> anyhow::Result<String> {
        Ok(self
            .document()?
            .and_then(|doc| read_string(&doc, "placeholder"))
            .unwrap_or_else(|| DEFAULT_PLACEHOLDER.to_string()))
    }

    fn document(&self) -> anyhow::Result<Option<DocumentMut>> {
        let Some(content) = read_document_string(&self.path)? else {
            return Ok(None);
        };
        match content.parse::<DocumentMut>() {
            Ok(doc) => Ok(Some(doc)),
            Err(err) => {
                tracing::warn!("ignoring unparseable config {}: {err}", self.path.display());
                Ok(None)
            }
        }
    }
}

fn default_config_path(home: &Path) -> PathBuf {
    home.join(".chatline").join("config.toml")
}

fn read_document_string(path: &Path) -> anyhow::Result<Option<String>> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err.into()),
    }
}

fn read_string(doc: &DocumentMut, key: &str) -> Option<String> {
    doc.get(key)
        .and_then(TomlItem::as_value)
        .and_then(|v| v.as_str())
        .map(str::to_string)
}

fn read_integer(doc: &DocumentMut, key: &str) -> Option<u64> {
    doc.get(key)
        .and_then(TomlItem::as_value)
        .and_then(|v| v.as_integer())
        .and_then(|v| u64::try_from(v).ok())
}

fn read_default_model(doc: &DocumentMut) -> Option<String> {
    read_string(doc, "default_model")
}

fn read_model_alias(doc: &DocumentMut, alias: &str) -> Option<String> {
    doc.get("models")
        .and_then(TomlItem::as_table)
        .and_then(|models| models.get(alias))
        .and_then(TomlItem::as_value)
        .and_then(|v| v.as_str())
        .map(str::to_string)
}
