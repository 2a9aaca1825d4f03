use std::{collections::HashMap, fmt, io::Error as IoError};

use diesel::result::Error as DieselError;
use rocket::{
    http::Status,
    response::{Flash, Redirect},
};

#[derive(Debug, Clone, PartialEq)]
pub enum MeltType {
    DatabaseConnection,
    DatabaseError,
    RecordNotFound,

    ExpiredToken,
    InvalidToken,
    MissingToken,
    InsufficientPermissions,

    FileNotFound,
    FileOperationFailed,

    SerializationFailed,
    DeserializationFailed,
    ConfigurationError,
    EnvironmentError,

    Unknown,
}

#[derive(Debug)]
pub struct MeltDown {
    pub melt_type: MeltType,
    pub details: String,
    pub user_message: Option<String>,
    pub context: Option<HashMap<String, String>>,
}

impl MeltDown {
    pub fn new(melt_type: MeltType, details: impl Into<String>) -> Self {
        Self {
            melt_type,
            details: details.into(),
            user_message: None,
            context: None,
        }
    }

    pub fn with_user_message(mut self, message: impl Into<String>) -> Self {
        self.user_message = Some(message.into());
        self
    }

    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.get_or_insert_with(HashMap::new).insert(key.into(), value.into());
        self
    }

    pub fn user_message(&self) -> String {
        if let Some(msg) = &self.user_message {
            return msg.clone();
        }

        match self.melt_type {
            MeltType::DatabaseConnection => "Unable to reach the data store. Please try again later.".to_string(),
            MeltType::DatabaseError => "A data store error occurred. Please try again later.".to_string(),
            MeltType::RecordNotFound => format!("{} not found.", self.details),

            MeltType::ExpiredToken => "Your session has expired. Please sign in again.".to_string(),
            MeltType::InvalidToken => "Invalid session. Please sign in again.".to_string(),
            MeltType::MissingToken => "Sign in required.".to_string(),
            MeltType::InsufficientPermissions => "You don't have permission to view this page.".to_string(),

            MeltType::FileNotFound => format!("File not found: {}", self.details),
            MeltType::FileOperationFailed => "File operation failed.".to_string(),

            MeltType::SerializationFailed | MeltType::DeserializationFailed => "Data processing error.".to_string(),
            MeltType::ConfigurationError => "Application configuration error.".to_string(),
            MeltType::EnvironmentError => "Environment setup error.".to_string(),

            MeltType::Unknown => "An unexpected error occurred.".to_string(),
        }
    }

    pub fn log_message(&self) -> String {
        let mut message = format!("[{}] {}", self.melt_type_str(), self.details);

        if let Some(context) = &self.context {
            let mut pairs: Vec<_> = context.iter().collect();
            pairs.sort();
            for (key, value) in pairs {
                message.push_str(&format!(" | {}={}", key, value));
            }
        }

        message
    }

    pub fn melt_type_str(&self) -> &'static str {
        match self.melt_type {
            MeltType::DatabaseConnection => "DatabaseConnection",
            MeltType::DatabaseError => "DatabaseError",
            MeltType::RecordNotFound => "RecordNotFound",
            MeltType::ExpiredToken => "ExpiredToken",
            MeltType::InvalidToken => "InvalidToken",
            MeltType::MissingToken => "MissingToken",
            MeltType::InsufficientPermissions => "InsufficientPermissions",
            MeltType::FileNotFound => "FileNotFound",
            MeltType::FileOperationFailed => "FileOperationFailed",
            MeltType::SerializationFailed => "SerializationFailed",
            MeltType::DeserializationFailed => "DeserializationFailed",
            MeltType::ConfigurationError => "ConfigurationError",
            MeltType::EnvironmentError => "EnvironmentError",
            MeltType::Unknown => "Unknown",
        }
    }

    pub fn status_code(&self) -> Status {
        match self.melt_type {
            MeltType::ExpiredToken | MeltType::InvalidToken | MeltType::MissingToken => Status::Unauthorized,
            MeltType::InsufficientPermissions => Status::Forbidden,
            MeltType::RecordNotFound | MeltType::FileNotFound => Status::NotFound,

            MeltType::DatabaseConnection => Status::ServiceUnavailable,
            MeltType::DatabaseError
            | MeltType::FileOperationFailed
            | MeltType::SerializationFailed
            | MeltType::DeserializationFailed
            | MeltType::ConfigurationError
            | MeltType::EnvironmentError
            | MeltType::Unknown => Status::InternalServerError,
        }
    }

    /// Token problems mean "no session"; anything else is an operator issue.
    pub fn is_token_problem(&self) -> bool {
        matches!(self.melt_type, MeltType::ExpiredToken | MeltType::InvalidToken | MeltType::MissingToken)
    }

    pub fn log(&self) {
        use crate::img_log;

        match self.status_code().code {
            400..=499 => img_log!(Warning, self.log_message()),
            _ => img_log!(Error, self.log_message()),
        }
    }
}

impl fmt::Display for MeltDown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.user_message())
    }
}

impl std::error::Error for MeltDown {}

impl From<jsonwebtoken::errors::Error> for MeltDown {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match err.kind() {
            ErrorKind::ExpiredSignature => MeltDown::new(MeltType::ExpiredToken, format!("Session token expired: {}", err)),
            ErrorKind::InvalidKeyFormat => MeltDown::new(MeltType::ConfigurationError, format!("Invalid session signing key: {}", err)),
            // A cookie that fails to parse is just as untrusted as one with a bad signature.
            _ => MeltDown::new(MeltType::InvalidToken, format!("Invalid session token: {}", err)),
        }
    }
}

impl From<MeltDown> for Flash<Redirect> {
    fn from(error: MeltDown) -> Self {
        error.log();

        Flash::error(Redirect::to("/auth/login"), error.user_message())
    }
}

impl From<std::env::VarError> for MeltDown {
    fn from(err: std::env::VarError) -> Self {
        MeltDown::new(MeltType::EnvironmentError, format!("Environment variable error: {}", err))
    }
}

impl From<toml::de::Error> for MeltDown {
    fn from(err: toml::de::Error) -> Self {
        MeltDown::new(MeltType::ConfigurationError, format!("Invalid configuration file: {}", err))
    }
}

impl From<DieselError> for MeltDown {
    fn from(err: DieselError) -> Self {
        match err {
            DieselError::NotFound => MeltDown::new(MeltType::RecordNotFound, "Record"),
            DieselError::DeserializationError(e) => MeltDown::new(MeltType::DeserializationFailed, format!("Failed to deserialize result: {}", e)),
            DieselError::SerializationError(e) => MeltDown::new(MeltType::SerializationFailed, format!("Failed to serialize query: {}", e)),
            DieselError::DatabaseError(kind, info) => {
                let mut error = MeltDown::new(MeltType::DatabaseError, format!("{:?}: {}", kind, info.message()));
                if let Some(table) = info.table_name() {
                    error = error.with_context("table", table);
                }
                error
            }
            other => MeltDown::new(MeltType::DatabaseError, format!("Database error: {:?}", other)),
        }
    }
}

impl From<IoError> for MeltDown {
    fn from(err: IoError) -> Self {
        use std::io::ErrorKind;

        match err.kind() {
            ErrorKind::NotFound => MeltDown::new(MeltType::FileNotFound, err.to_string()),
            _ => MeltDown::new(MeltType::FileOperationFailed, err.to_string()),
        }
    }
}

impl MeltDown {
    pub fn db_connection(details: impl Into<String>) -> Self {
        Self::new(MeltType::DatabaseConnection, details)
    }

    pub fn record_not_found(entity: impl Into<String>) -> Self {
        Self::new(MeltType::RecordNotFound, entity)
    }

    pub fn invalid_token(details: impl Into<String>) -> Self {
        Self::new(MeltType::InvalidToken, details)
    }

    pub fn missing_token() -> Self {
        Self::new(MeltType::MissingToken, "Session cookie is missing")
    }

    pub fn insufficient_permissions() -> Self {
        Self::new(MeltType::InsufficientPermissions, "Administrator role required")
    }
}
