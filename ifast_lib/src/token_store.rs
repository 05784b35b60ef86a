//! File-backed credential store scoped by service and account.

use std::io::Write;
use std::path::{Path, PathBuf};

use ifast_api::{TokenPair, TokenStore, TokenStoreError};

/// Service name the stored pair is filed under unless configured otherwise.
pub const DEFAULT_SERVICE: &str = "com.iFast.AuthAPI.TokenStore";
/// Account name the stored pair is filed under unless configured otherwise.
pub const DEFAULT_ACCOUNT: &str = "default";

/// Stores one [`TokenPair`] as JSON at `<root>/<service>/<account>.json`.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(root: impl AsRef<Path>, service: &str, account: &str) -> Self {
        let path = root
            .as_ref()
            .join(service)
            .join(format!("{}.json", account));
        Self { path }
    }

    /// Store rooted in the platform data directory, or the home directory
    /// when the platform has none.
    pub fn in_default_location(service: &str, account: &str) -> Result<Self, TokenStoreError> {
        let root = dirs::data_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join(".ifast")))
            .ok_or_else(|| {
                TokenStoreError::Unavailable("could not determine a data directory".into())
            })?;
        Ok(Self::new(root, service, account))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TokenStore for FileTokenStore {
    fn save(&self, tokens: &TokenPair) -> Result<(), TokenStoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(tokens)?;

        let mut options = std::fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options.open(&self.path)?;

        // `mode` only applies on creation; tighten a file left by an older save.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
        }
        file.write_all(contents.as_bytes())?;

        tracing::debug!("Saved tokens to {}", self.path.display());
        Ok(())
    }

    fn load(&self) -> Result<Option<TokenPair>, TokenStoreError> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_str(&contents)?))
    }

    fn delete(&self) -> Result<(), TokenStoreError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
