use std::fs;
use std::io;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::domain::user::User;

const TOKEN_ENTRY: &str = "auth_token";
const USER_ENTRY: &str = "user";

/// Current-session identity: the opaque token issued at login plus the
/// public user projection. Matches the login response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub user: User,
}

/// Persistent key/value storage for the session. Exactly two string entries:
/// the token and the serialized user projection.
pub trait SessionStore {
    fn load(&self) -> io::Result<Option<Session>>;
    fn save(&self, session: &Session) -> io::Result<()>;
    fn clear(&self) -> io::Result<()>;
}

/// Store keeping the two entries as files inside a directory.
pub struct FileSessionStore {
    dir: PathBuf,
}

impl FileSessionStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn entry(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> io::Result<Option<Session>> {
        let token = match fs::read_to_string(self.entry(TOKEN_ENTRY)) {
            Ok(token) => token,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err),
        };
        let user_json = match fs::read_to_string(self.entry(USER_ENTRY)) {
            Ok(user_json) => user_json,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err),
        };
        let user = serde_json::from_str(&user_json)
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?;
        Ok(Some(Session { token, user }))
    }

    fn save(&self, session: &Session) -> io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.entry(TOKEN_ENTRY), &session.token)?;
        let user_json = serde_json::to_string(&session.user)
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?;
        fs::write(self.entry(USER_ENTRY), user_json)?;
        Ok(())
    }

    fn clear(&self) -> io::Result<()> {
        for name in [TOKEN_ENTRY, USER_ENTRY] {
            match fs::remove_file(self.entry(name)) {
                Ok(()) => {}
                Err(err) if err.kind() == io::ErrorKind::NotFound => {}
                Err(err) => return Err(err),
            }
        }
        Ok(())
    }
}
