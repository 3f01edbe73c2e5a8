use http::{HeaderName, HeaderValue, Response, StatusCode, header::WWW_AUTHENTICATE};
use lsat_core::{errors::Error, header::Challenge};
use serde::{Deserialize, Serialize};

pub const PAYMENT_REQUIRED_MESSAGE: &str = "Payment Required";

/// Represents an error response from the paywall.
#[derive(Debug, Clone)]
pub struct ErrorResponse {
    pub status: StatusCode,
    /// Challenge to send in `WWW-Authenticate`, for `402` responses.
    pub challenge: Option<Challenge>,
    pub body: ErrorBody,
}

/// JSON body of a paywall error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: u16,
    pub message: String,
}

impl ErrorResponse {
    /// `402 Payment Required` carrying an LSAT challenge.
    pub fn payment_required(challenge: Challenge) -> Self {
        ErrorResponse {
            status: StatusCode::PAYMENT_REQUIRED,
            challenge: Some(challenge),
            body: ErrorBody {
                code: StatusCode::PAYMENT_REQUIRED.as_u16(),
                message: PAYMENT_REQUIRED_MESSAGE.to_string(),
            },
        }
    }

    /// Response for a request classified as invalid.
    ///
    /// Credential and proof failures are `401 Unauthorized`; failures to issue a
    /// challenge are `500 Internal Server Error`.
    pub fn invalid(err: &Error) -> Self {
        let status = match err {
            Error::MalformedToken(_)
            | Error::MalformedIdentifier(_)
            | Error::InvalidSignature
            | Error::PaymentNotProven => StatusCode::UNAUTHORIZED,
            Error::ConfigurationError(_)
            | Error::InvalidPrice(_)
            | Error::PaymentBackendError(_)
            | Error::SigningError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        ErrorResponse {
            status,
            challenge: None,
            body: ErrorBody {
                code: status.as_u16(),
                message: err.to_string(),
            },
        }
    }

    /// Get the header to include in the response.
    ///
    /// Returns `None` if there is no challenge or its value is not a valid header.
    pub fn header_value(&self) -> Option<(HeaderName, HeaderValue)> {
        self.challenge.as_ref().and_then(|challenge| {
            HeaderValue::from_str(&challenge.header_value())
                .ok()
                .map(|v| (WWW_AUTHENTICATE, v))
        })
    }
}

impl From<ErrorResponse> for Response<String> {
    fn from(value: ErrorResponse) -> Self {
        let body = match serde_json::to_string(&value.body) {
            Ok(body) => body,
            Err(err) => {
                #[cfg(feature = "tracing")]
                tracing::error!("Failed to serialize ErrorResponse body to JSON: {err}");
                #[cfg(not(feature = "tracing"))]
                let _ = err;

                let mut response = Response::new(String::new());
                *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
                return response;
            }
        };

        let mut response = Response::new(body);
        *response.status_mut() = value.status;
        response.headers_mut().insert(
            http::header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        if let Some((name, val)) = value.header_value() {
            response.headers_mut().insert(name, val);
        }
        response
    }
}

#[cfg(feature = "axum")]
impl axum::response::IntoResponse for ErrorResponse {
    fn into_response(self) -> axum::response::Response {
        let header = self.header_value();
        let mut response = (self.status, axum::extract::Json(self.body)).into_response();
        if let Some((name, val)) = header {
            response.headers_mut().insert(name, val);
        }
        response
    }
}
