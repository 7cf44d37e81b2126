use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    /// A setting required by the requested operation is absent.
    #[error("Missing required setting {setting}: {message}")]
    MissingSetting { setting: String, message: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    pub fn missing(setting: &str, message: impl Into<String>) -> Self {
        Error::MissingSetting {
            setting: setting.to_string(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
