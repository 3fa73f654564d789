use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScriptkitError {
    #[error("missing required argument: {0}")]
    MissingArgument(&'static str),

    #[error("invalid script name '{0}': must not be empty or contain path separators")]
    InvalidScriptName(String),

    #[error("unknown template kind '{0}': expected one of basic, advanced, spa")]
    UnknownTemplateKind(String),

    #[error("template not found: {0}")]
    TemplateNotFound(String),

    #[error("script not found: {0}")]
    ScriptNotFound(String),

    #[error("invalid metadata block: {0}")]
    InvalidMetadata(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ScriptkitError>;
