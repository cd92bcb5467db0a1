use thiserror::Error;

pub type Result<T> = std::result::Result<T, NidusError>;

#[derive(Debug, Error)]
pub enum NidusError {
    #[error("Instance not found for {token}")]
    InstanceNotFound { token: String },

    #[error("Class [{type_name}] is not injectable")]
    NotInjectable { type_name: String },

    #[error("Cannot resolve token [{token}], please provide a value or factory")]
    MissingFactory { token: String },

    #[error("Failed to downcast type: {type_name}")]
    DowncastFailed { type_name: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl axum::response::IntoResponse for NidusError {
    fn into_response(self) -> axum::response::Response {
        let message = self.to_string();
        (axum::http::StatusCode::INTERNAL_SERVER_ERROR, message).into_response()
    }
}
