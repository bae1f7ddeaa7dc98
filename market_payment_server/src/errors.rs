use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use market_payment_engine::traits::PaymentGatewayError;
use thiserror::Error;
use tosspay_tools::TossPayApiError;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("{0}")]
    StockConflict(String),
    #[error("Insufficient Permissions. {0}")]
    InsufficientPermissions(String),
    #[error("결제 서버에 연결할 수 없습니다. 잠시 후 다시 시도해 주세요. ({0})")]
    GatewayUnreachable(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::StockConflict(_) => StatusCode::CONFLICT,
            Self::InsufficientPermissions(_) => StatusCode::FORBIDDEN,
            Self::GatewayUnreachable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "success": false, "message": self.to_string() }).to_string())
    }
}

impl From<PaymentGatewayError> for ServerError {
    fn from(e: PaymentGatewayError) -> Self {
        match e {
            PaymentGatewayError::ProductNotFound(_) |
            PaymentGatewayError::OrderNotFound(_) |
            PaymentGatewayError::CheckoutNotFound(_) |
            PaymentGatewayError::PaymentNotFound(_) => Self::NoRecordFound(e.to_string()),
            PaymentGatewayError::InsufficientStock { .. } => Self::StockConflict(e.to_string()),
            PaymentGatewayError::NotSellerOrder { .. } => Self::InsufficientPermissions(e.to_string()),
            PaymentGatewayError::EmptyOrder |
            PaymentGatewayError::InvalidQuantity { .. } |
            PaymentGatewayError::TotalMismatch { .. } |
            PaymentGatewayError::OrderAlreadyExists(_) => Self::InvalidRequestBody(e.to_string()),
            PaymentGatewayError::DatabaseError(_) | PaymentGatewayError::MalformedCheckout(_) => {
                Self::BackendError(e.to_string())
            },
        }
    }
}

impl From<TossPayApiError> for ServerError {
    fn from(e: TossPayApiError) -> Self {
        match e {
            TossPayApiError::Unreachable(msg) => Self::GatewayUnreachable(msg),
            TossPayApiError::Initialization(msg) => Self::InitializeError(msg),
            other => Self::BackendError(other.to_string()),
        }
    }
}
