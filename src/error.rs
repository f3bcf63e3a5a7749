use thiserror::Error;

pub type Result<T> = std::result::Result<T, PspError>;

#[derive(Error, Debug)]
pub enum PspError {
    #[error("XML parse error in {doc}: {source}")]
    Xml {
        doc: String,
        #[source]
        source: roxmltree::Error,
    },

    #[error("Unknown tag <{tag}> in {doc}")]
    UnknownTag { doc: String, tag: String },

    #[error("Structural error in {doc} at <{node}>: {message}")]
    Structure {
        doc: String,
        node: String,
        message: String,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl PspError {
    pub fn exit_code(&self) -> i32 {
        2
    }
}
