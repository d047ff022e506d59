//! Mapping of library errors to HTTP responses.
//!
//! Response bodies follow the shapes clients already rely on:
//!
//! * query parameter errors: `{"<param>": "<reason>"}`
//! * body field errors: `{"<field>": ["<reason>"]}`
//! * everything else: `{"detail": "<reason>"}`
//!
//! Internal failures are logged and answered with a generic message.

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use denuncia_analytics::AnalyticsError;
use denuncia_database::DbError;
use denuncia_filters::FilterError;
use denuncia_history::HistoryError;
use denuncia_report::{INVALID_FORMAT_REASON, RenderError};

/// Message sent with every 403.
pub const FORBIDDEN_DETAIL: &str = "Você não tem permissão para executar essa ação.";

/// Message sent with every 404.
pub const NOT_FOUND_DETAIL: &str = "Não encontrado.";

/// Message sent with every 500.
pub const INTERNAL_DETAIL: &str = "Erro interno do servidor.";

/// Errors returned by request handlers.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// A query parameter was rejected.
    #[error(transparent)]
    Filter(#[from] FilterError),

    /// A request body field was rejected.
    #[error("{field}: {reason}")]
    Field {
        /// Body field name.
        field: String,
        /// Human-readable reason.
        reason: String,
    },

    /// The request body could not be decoded.
    #[error("Malformed body: {0}")]
    MalformedBody(String),

    /// The actor may not perform the action.
    #[error("Forbidden")]
    Forbidden,

    /// The incident does not exist.
    #[error("Not found")]
    NotFound,

    /// Store failure.
    #[error(transparent)]
    Store(#[from] DbError),

    /// Query or aggregation failure.
    #[error(transparent)]
    Analytics(#[from] AnalyticsError),

    /// Report rendering failure.
    #[error(transparent)]
    Render(#[from] RenderError),

    /// History failure.
    #[error(transparent)]
    History(#[from] HistoryError),
}

impl ApiError {
    /// Body field error.
    pub fn field(field: &str, reason: impl Into<String>) -> Self {
        Self::Field {
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    const fn is_internal(&self) -> bool {
        match self {
            Self::Filter(_)
            | Self::Field { .. }
            | Self::MalformedBody(_)
            | Self::Forbidden
            | Self::NotFound => false,
            Self::Render(e) => !matches!(e, RenderError::InvalidFormat { .. }),
            Self::History(e) => !matches!(e, HistoryError::NotFound { .. }),
            Self::Store(_) | Self::Analytics(_) => true,
        }
    }

    fn body(&self) -> serde_json::Value {
        match self {
            Self::Filter(FilterError::InvalidParameter { param, reason }) => {
                serde_json::json!({ param.as_str(): reason })
            }
            Self::Filter(FilterError::InvalidRange { reason }) | Self::MalformedBody(reason) => {
                serde_json::json!({ "detail": reason })
            }
            Self::Field { field, reason } => serde_json::json!({ field.as_str(): [reason] }),
            Self::Render(RenderError::InvalidFormat { .. }) => {
                serde_json::json!({ "formato": INVALID_FORMAT_REASON })
            }
            Self::Forbidden => serde_json::json!({ "detail": FORBIDDEN_DETAIL }),
            Self::NotFound | Self::History(HistoryError::NotFound { .. }) => {
                serde_json::json!({ "detail": NOT_FOUND_DETAIL })
            }
            Self::Store(_) | Self::Analytics(_) | Self::Render(_) | Self::History(_) => {
                serde_json::json!({ "detail": INTERNAL_DETAIL })
            }
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            _ if self.is_internal() => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::NotFound | Self::History(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::BAD_REQUEST,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if self.is_internal() {
            log::error!("Request failed: {self}");
        } else {
            log::debug!("Request rejected: {self}");
        }
        HttpResponse::build(self.status_code()).json(self.body())
    }
}
