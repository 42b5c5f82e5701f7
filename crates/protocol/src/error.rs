use std::fmt;

#[derive(Debug)]
pub enum DecodeError {
    Json(serde_json::Error),
    MissingType,
    UnknownType(String),
    /// A known message whose listed fields have the wrong shape.
    InvalidFields {
        kind: &'static str,
        fields: Vec<String>,
        source: serde_json::Error,
    },
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::Json(err) => write!(f, "malformed message: {err}"),
            DecodeError::MissingType => write!(f, "message has no `type` field"),
            DecodeError::UnknownType(ty) => write!(f, "unknown message type: {ty}"),
            DecodeError::InvalidFields { kind, fields, source } => {
                write!(f, "invalid {kind} fields [{}]: {source}", fields.join(", "))
            }
        }
    }
}

impl std::error::Error for DecodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DecodeError::Json(err) => Some(err),
            DecodeError::InvalidFields { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for DecodeError {
    fn from(err: serde_json::Error) -> Self {
        DecodeError::Json(err)
    }
}
