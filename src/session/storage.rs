use super::types::{Session, SESSION_VERSION};
use anyhow::{Context, Result};
use atomic_write_file::AtomicWriteFile;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

/// Get the default session file path (~/.config/forestry-rating/session.json)
pub fn get_session_path() -> Result<PathBuf> {
    Ok(crate::config::get_config_dir()?.join("session.json"))
}

/// Load the stored session, if any.
///
/// A missing file means "not logged in". A file with an unsupported version
/// is an error.
pub fn load_session(path: &Path) -> Result<Option<Session>> {
    if !path.exists() {
        return Ok(None);
    }

    let file = File::open(path)
        .with_context(|| format!("Failed to open session file at {}", path.display()))?;

    let session: Session = serde_json::from_reader(file).context("Failed to load session")?;

    if session.version != SESSION_VERSION {
        anyhow::bail!("Unsupported session version: {}", session.version);
    }

    Ok(Some(session))
}

/// Save the session atomically
///
/// Uses atomic-write-file so the file is never left half-written.
/// Creates the parent directory if it doesn't exist.
pub fn save_session(path: &Path, session: &Session) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }

    let mut file = AtomicWriteFile::open(path)
        .with_context(|| format!("Failed to open atomic write file at {}", path.display()))?;

    serde_json::to_writer_pretty(&mut file, session).context("Failed to serialize session")?;

    file.commit().context("Failed to save session")?;

    restrict_to_owner(path)?;

    Ok(())
}

/// The session holds a bearer token: owner read/write only. Later atomic
/// writes keep the mode of the file they replace.
#[cfg(unix)]
fn restrict_to_owner(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, fs::Permissions::from_mode(0o600))
        .with_context(|| format!("Failed to restrict permissions on {}", path.display()))
}

#[cfg(not(unix))]
fn restrict_to_owner(_path: &Path) -> Result<()> {
    Ok(())
}

/// Remove the stored session. Missing file is fine.
pub fn clear_session(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).context("Failed to remove session file"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Actor, Role};

    fn sample_session() -> Session {
        Session::new(
            "http://localhost:3000/api",
            "token-123".to_string(),
            Actor {
                id: 4,
                email: "eng@example.org".to_string(),
                role: Role::Engineer,
            },
        )
    }

    #[test]
    fn test_load_missing_file_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = load_session(&dir.path().join("session.json")).unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("session.json");
        let session = sample_session();

        save_session(&path, &session).unwrap();
        let loaded = load_session(&path).unwrap().unwrap();

        assert_eq!(loaded, session);
    }

    #[cfg(unix)]
    #[test]
    fn test_session_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        save_session(&path, &sample_session()).unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);

        // overwriting keeps it private
        save_session(&path, &sample_session()).unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_unsupported_version() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        let mut session = sample_session();
        session.version = 99;
        save_session(&path, &session).unwrap();

        let err = load_session(&path).unwrap_err();
        assert!(err.to_string().contains("Unsupported session version"));
    }

    #[test]
    fn test_clear_session() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        save_session(&path, &sample_session()).unwrap();

        clear_session(&path).unwrap();
        assert!(!path.exists());
        // second clear is a no-op
        clear_session(&path).unwrap();
    }
}
