use axum::http::StatusCode;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("payment gateway error: {0}")]
    Gateway(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Forbidden(String),
    /// The gateway accepted a charge that could not be recorded locally.
    #[error("charge {transaction_id:?} for order {order_id} was not recorded")]
    OrphanedCharge {
        order_id: Uuid,
        transaction_id: Option<String>,
    },
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl EngineError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            EngineError::Validation(_) => StatusCode::BAD_REQUEST,
            EngineError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            EngineError::Gateway(_) => StatusCode::BAD_GATEWAY,
            EngineError::NotFound(_) => StatusCode::NOT_FOUND,
            EngineError::Conflict(_) => StatusCode::CONFLICT,
            EngineError::Forbidden(_) => StatusCode::FORBIDDEN,
            EngineError::OrphanedCharge { .. } | EngineError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message safe to return to API callers and webhook senders.
    pub fn public_message(&self) -> String {
        match self {
            EngineError::Gateway(_) => "payment gateway error".to_string(),
            EngineError::OrphanedCharge { .. } | EngineError::Internal(_) => {
                "internal server error".to_string()
            }
            other => other.to_string(),
        }
    }
}

pub type EngineResult<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn internal_details_are_not_public() {
        let err = EngineError::Internal(anyhow::anyhow!("connection refused to 10.0.0.3"));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.public_message(), "internal server error");

        let err = EngineError::Gateway("status 500 from upstream".to_string());
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
        assert_eq!(err.public_message(), "payment gateway error");
    }

    #[test]
    fn caller_errors_keep_their_message() {
        let err = EngineError::Conflict("order already pending".to_string());
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
        assert_eq!(err.public_message(), "order already pending");

        for (err, status) in [
            (EngineError::Validation("bad".to_string()), StatusCode::BAD_REQUEST),
            (EngineError::Unauthorized("bad".to_string()), StatusCode::UNAUTHORIZED),
            (EngineError::NotFound("bad".to_string()), StatusCode::NOT_FOUND),
            (EngineError::Forbidden("bad".to_string()), StatusCode::FORBIDDEN),
        ] {
            assert_eq!(err.status_code(), status);
            assert_eq!(err.public_message(), "bad");
        }
    }

    #[test]
    fn orphaned_charge_is_a_server_error() {
        let err = EngineError::OrphanedCharge {
            order_id: Uuid::nil(),
            transaction_id: Some("abc123".to_string()),
        };
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.public_message(), "internal server error");
    }
}
