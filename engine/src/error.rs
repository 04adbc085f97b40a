use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("unknown node: {0}")]
    UnknownNode(String),
    #[error("unknown graph: {0}")]
    UnknownGraph(String),
    #[error("no socket '{socket}' on node '{node}'")]
    UnknownSocket { node: String, socket: String },
    #[error("unknown node kind: {0}")]
    UnknownKind(String),
    #[error("node kind already registered: {0}")]
    DuplicateKind(String),
    #[error("node already exists in graph: {0}")]
    DuplicateNode(String),
    #[error("invalid node kind definition: {0}")]
    InvalidKind(String),
    #[error("empty value: {0}")]
    EmptyValue(String),
    #[error("no value returned at socket '{socket}' on node '{node}'")]
    MissingResult { node: String, socket: String },
    #[error("functor for kind '{kind}' returned {got} outputs, expected {expected}")]
    ArityMismatch {
        kind: String,
        expected: usize,
        got: usize,
    },
    #[error("invalid connection: {0}")]
    InvalidConnection(String),
    #[error("functor error: {0}")]
    Functor(String),
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl EngineError {
    pub fn unknown_socket(node: &str, socket: &str) -> Self {
        EngineError::UnknownSocket {
            node: node.to_string(),
            socket: socket.to_string(),
        }
    }

    pub fn functor(message: impl Into<String>) -> Self {
        EngineError::Functor(message.into())
    }
}
