use thiserror::Error;

#[derive(Error, Debug)]
pub enum BenchError {
    #[error("missing required argument: {0}")]
    MissingArgument(&'static str),

    #[error("input is not valid JSON: {0}")]
    InvalidInputFormat(String),

    #[error("external tool `{program}` failed: {message}")]
    ExternalTool { program: String, message: String },

    #[error("schema violation: {0}")]
    SchemaViolation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BenchError {
    pub fn external_tool(program: impl Into<String>, message: impl Into<String>) -> Self {
        BenchError::ExternalTool {
            program: program.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, BenchError>;
