//! Error types for process execution

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Error running: {command} ({})", describe_exit(.code))]
    CommandFailed { command: String, code: Option<i32> },

    #[error("Container inspection failed: {0}")]
    InspectionFailed(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {}", code),
        None => "terminated by signal".to_string(),
    }
}

pub type Result<T> = std::result::Result<T, ProviderError>;
