//! Session token persistence.
//!
//! The token survives restarts in a plain file under the user config dir,
//! filling the role the browser build gave to localStorage.

use std::fs;
use std::path::PathBuf;

use tracing::warn;

fn token_path() -> PathBuf {
    dirs::config_dir()
        .map(|dir| dir.join("cardforge"))
        .unwrap_or_else(|| PathBuf::from(".cardforge"))
        .join("token")
}

pub fn load_token() -> Option<String> {
    fs::read_to_string(token_path())
        .ok()
        .map(|raw| raw.trim().to_owned())
        .filter(|token| !token.is_empty())
}

/// Writes the token, or removes the file when logging out. Failures are
/// logged and swallowed: a lost token only costs a re-login.
pub fn store_token(token: Option<&str>) {
    let path = token_path();
    match token {
        Some(token) => {
            if let Some(dir) = path.parent() {
                let _ = fs::create_dir_all(dir);
            }
            if let Err(error) = fs::write(&path, token) {
                warn!(%error, "failed to persist session token");
            }
        }
        None => {
            if let Err(error) = fs::remove_file(&path) {
                if error.kind() != std::io::ErrorKind::NotFound {
                    warn!(%error, "failed to clear session token");
                }
            }
        }
    }
}
