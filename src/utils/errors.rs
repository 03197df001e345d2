use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("invalid objectFormat: {0}")]
    InvalidFormat(String),

    #[error("invalid objectEncoding: {0}")]
    InvalidEncoding(String),

    #[error("failed to decode {encoding} content: {reason}")]
    Decode { encoding: String, reason: String },

    #[error("Parsing error: {0}")]
    Parse(String),

    #[error("Unsupported key type: {0}")]
    UnsupportedKeyType(String),

    #[error("Malformed key component '{component}': {reason}")]
    MalformedComponent { component: String, reason: String },

    #[error("no leaf found")]
    NoLeafFound,

    #[error("constructing chain resulted in cycle")]
    CycleDetected,

    #[error("Invalid object: {0}")]
    InvalidObject(String),

    #[error("unknown content type '{0}'")]
    UnknownContentType(String),

    #[error("{0} is nil")]
    MissingField(String),

    #[error("Vault source error: {0}")]
    Source(String),

    #[error("failed to get objectType:{object_type}, objectName:{object_name}, objectVersion:{object_version}: {source}")]
    Object {
        object_type: String,
        object_name: String,
        object_version: String,
        #[source]
        source: Box<ProviderError>,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl ProviderError {
    /// Attach the identity of the vault object being processed
    pub fn for_object(self, object_type: &str, object_name: &str, object_version: &str) -> Self {
        ProviderError::Object {
            object_type: object_type.to_string(),
            object_name: object_name.to_string(),
            object_version: object_version.to_string(),
            source: Box::new(self),
        }
    }

    /// The innermost error, skipping object context wrappers
    pub fn root(&self) -> &ProviderError {
        match self {
            ProviderError::Object { source, .. } => source.root(),
            other => other,
        }
    }
}

pub type Result<T> = std::result::Result<T, ProviderError>;
