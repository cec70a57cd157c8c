use std::future::Future;
use std::path::{Component, Path, PathBuf};

use tracing::debug;

use crate::error::{Result, TranslatorError};

/// Resolves a named secret to its string value (a JSON credential blob).
pub trait SecretStore: Send + Sync {
    fn get_secret(&self, name: &str) -> impl Future<Output = Result<String>> + Send;
}

/// Secret `a/b/c` lives at `<root>/a/b/c.json`.
#[derive(Debug, Clone)]
pub struct FileSecretStore {
    root: PathBuf,
}

impl FileSecretStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        FileSecretStore { root: root.into() }
    }

    fn path_for(&self, name: &str) -> Result<PathBuf> {
        let relative = Path::new(name);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));
        if name.is_empty() || escapes {
            return Err(TranslatorError::Authentication(format!(
                "invalid secret name '{}'",
                name
            )));
        }
        Ok(self.root.join(format!("{}.json", name)))
    }
}

impl SecretStore for FileSecretStore {
    async fn get_secret(&self, name: &str) -> Result<String> {
        let path = self.path_for(name)?;
        debug!("reading secret {} from {}", name, path.display());
        tokio::fs::read_to_string(&path).await.map_err(|e| {
            TranslatorError::Authentication(format!("cannot read secret '{}': {}", name, e))
        })
    }
}
