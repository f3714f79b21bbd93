use nova_core::agents::AgentKind;
use nova_core::error::{ErrorBody, ValidationError, codes};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SyncError>;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Transport failure (`status` is `None`) or a non-2xx answer.
    #[error("request to {endpoint} failed: {message}")]
    RequestFailed {
        endpoint: String,
        status: Option<u16>,
        message: String,
    },

    /// 2xx answer whose body is not the shape the endpoint promises.
    #[error("malformed response from {endpoint}: {message}")]
    MalformedResponse { endpoint: String, message: String },

    /// 2xx answer carrying `ok: false` / `success: false`.
    #[error("{kind} agent rejected the request: {message}")]
    AgentRejected { kind: AgentKind, message: String },

    #[error("user {0} is not in the user directory")]
    UnknownUser(u64),

    #[error("session has been torn down")]
    SessionClosed,

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl SyncError {
    pub fn code(&self) -> &'static str {
        match self {
            SyncError::Validation(_) => codes::VALIDATION_FAILED,
            SyncError::RequestFailed { .. } | SyncError::MalformedResponse { .. } => {
                codes::REQUEST_FAILED
            }
            SyncError::AgentRejected { .. } => codes::AGENT_REJECTED,
            SyncError::UnknownUser(_) => codes::UNKNOWN_USER,
            SyncError::SessionClosed => codes::SESSION_CLOSED,
            SyncError::Config(_) => codes::VALIDATION_FAILED,
        }
    }

    /// True for failures caught before anything was sent.
    pub fn is_local(&self) -> bool {
        matches!(self, SyncError::Validation(_) | SyncError::Config(_))
    }

    pub fn to_body(&self) -> ErrorBody {
        match self {
            SyncError::Validation(err) => err.to_body(),
            SyncError::RequestFailed { .. } | SyncError::MalformedResponse { .. } => {
                ErrorBody::new(self.code(), self.to_string())
                    .with_docs_hint("Is the backend running? Check NOVA_API_URL.")
            }
            SyncError::UnknownUser(_) => ErrorBody::new(self.code(), self.to_string())
                .with_field("user_id")
                .with_docs_hint("List valid ids with `nova users`"),
            _ => ErrorBody::new(self.code(), self.to_string()),
        }
    }
}
