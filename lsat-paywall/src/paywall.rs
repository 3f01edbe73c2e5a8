//! HTTP paywall issuing and verifying LSATs.
//!
//! For details, see the [`PayWall`] struct documentation.

use bon::Builder;
use http::{Request, Response};
use lsat_core::{
    backend::PaymentBackend, errors::Error, identifier::TokenIdentifier, types::Preimage,
};

use crate::{
    classifier::Classification, errors::ErrorResponse, issuer::Issuer, verifier::Verifier,
};

/// A HTTP paywall that challenges clients for payment and admits paid requests.
///
/// ## Building a PayWall
///
/// A `PayWall` combines an [`Issuer`], which creates invoices and mints
/// macaroons, with a [`Verifier`] holding the same root key.
///
/// ## Request Flow
///
/// [`handle_request`](PayWall::handle_request) classifies the request (see
/// [`classify`](PayWall::classify)) and then:
///
/// - answers `402 Payment Required` with a `WWW-Authenticate` challenge when one
///   was issued;
/// - otherwise attaches an [`LsatInfo`] to the request extensions and runs the
///   handler. Invalid credentials are not rejected unless
///   [`PayWallConfig::reject_invalid`] is set; the handler decides.
#[derive(Builder, Debug, Clone)]
pub struct PayWall<B: PaymentBackend> {
    /// Creates challenges for clients that accept LSATs.
    pub issuer: Issuer<B>,
    /// Verifies presented tokens.
    pub verifier: Verifier,
    /// Paywall behavior configuration.
    #[builder(default)]
    pub config: PayWallConfig,
}

/// Paywall configuration options.
///
/// The default behavior is to annotate invalid requests and let the handler
/// decide how to answer them.
#[derive(Builder, Debug, Clone, Default)]
pub struct PayWallConfig {
    /// Answer invalid requests directly with an error response
    #[builder(default, with = || true)]
    pub reject_invalid: bool,
}

/// The LSAT state of a request, attached to its extensions before the handler runs.
///
/// # Example
///
/// ```rust
/// use axum::{extract::Extension, http::StatusCode, Json};
/// use serde_json::{json, Value};
/// use lsat_paywall::paywall::LsatInfo;
///
/// async fn handler(Extension(lsat): Extension<LsatInfo>) -> Result<Json<Value>, StatusCode> {
///     match lsat {
///         LsatInfo::Paid { identifier, .. } => Ok(Json(json!({
///             "message": "Protected Content",
///             "token": identifier,
///         }))),
///         LsatInfo::Free => Ok(Json(json!({ "message": "Free Content" }))),
///         LsatInfo::Invalid(_) => Err(StatusCode::UNAUTHORIZED),
///     }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LsatInfo {
    /// No token was presented and none was asked for.
    Free,
    /// The request carries a verified, paid token.
    Paid {
        identifier: TokenIdentifier,
        preimage: Preimage,
    },
    /// The request presented a token that failed verification.
    Invalid(Error),
}

impl LsatInfo {
    pub fn is_paid(&self) -> bool {
        matches!(self, LsatInfo::Paid { .. })
    }
}

impl<B: PaymentBackend> PayWall<B> {
    /// Standard LSAT flow.
    ///
    /// Classifies the request, stops with a `402` challenge when payment is
    /// required, and otherwise **runs** the handler with an [`LsatInfo`]
    /// attached to the request extensions.
    pub async fn handle_request<Fun, Fut, Req, Res>(
        &self,
        request: Request<Req>,
        handler: Fun,
    ) -> Result<Response<Res>, ErrorResponse>
    where
        Fun: FnOnce(Request<Req>) -> Fut,
        Fut: Future<Output = Response<Res>>,
    {
        let (mut parts, body) = request.into_parts();

        let info = match self.classify(&parts).await {
            Classification::PaymentRequired(challenge) => {
                return Err(ErrorResponse::payment_required(challenge));
            }
            Classification::Free => LsatInfo::Free,
            Classification::Paid {
                identifier,
                preimage,
            } => LsatInfo::Paid {
                identifier,
                preimage,
            },
            Classification::Invalid(err) => {
                if self.config.reject_invalid {
                    return Err(ErrorResponse::invalid(&err));
                }
                LsatInfo::Invalid(err)
            }
        };

        parts.extensions.insert(info);
        Ok(handler(Request::from_parts(parts, body)).await)
    }
}
