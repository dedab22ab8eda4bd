//! Where hierarchy payloads come from.
//!
//! A source hands back the raw JSON body; decoding and validation happen in
//! [`crate::parser`] so a malformed body is reported as a data error rather
//! than a transport failure.

use std::io::ErrorKind;
use std::path::PathBuf;

use crate::error::FetchError;

/// Caller identity passed explicitly to every fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub user: Option<String>,
    pub token: Option<String>,
}

impl Session {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            user: None,
            token: Some(token.into()),
        }
    }

    pub fn signed_in(user: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            user: Some(user.into()),
            token: Some(token.into()),
        }
    }
}

pub trait HierarchySource {
    fn fetch(&self, session: &Session) -> Result<String, FetchError>;
}

/// Reads the payload from a local JSON file.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl HierarchySource for FileSource {
    fn fetch(&self, session: &Session) -> Result<String, FetchError> {
        tracing::debug!(
            path = %self.path.display(),
            user = session.user.as_deref(),
            "reading hierarchy file"
        );
        std::fs::read_to_string(&self.path).map_err(|err| {
            let path = self.path.display().to_string();
            match err.kind() {
                ErrorKind::NotFound => FetchError::Status {
                    status: 404,
                    message: format!("{path} not found"),
                },
                ErrorKind::PermissionDenied => FetchError::Status {
                    status: 403,
                    message: format!("{path} is not readable"),
                },
                _ => FetchError::Io {
                    path,
                    message: err.to_string(),
                },
            }
        })
    }
}

/// Serves a fixed payload, or a fixed failure. Requires a session token when
/// `require_token` is set, answering 401 otherwise.
#[derive(Debug, Clone)]
pub struct StaticSource {
    payload: Result<String, FetchError>,
    require_token: bool,
}

impl StaticSource {
    pub fn new(payload: impl Into<String>) -> Self {
        Self {
            payload: Ok(payload.into()),
            require_token: false,
        }
    }

    pub fn failing(error: FetchError) -> Self {
        Self {
            payload: Err(error),
            require_token: false,
        }
    }

    pub fn require_token(mut self) -> Self {
        self.require_token = true;
        self
    }
}

impl HierarchySource for StaticSource {
    fn fetch(&self, session: &Session) -> Result<String, FetchError> {
        if self.require_token && session.token.is_none() {
            tracing::debug!(user = session.user.as_deref(), "static source refused anonymous session");
            return Err(FetchError::Status {
                status: 401,
                message: "session has no token".to_string(),
            });
        }
        self.payload.clone()
    }
}
