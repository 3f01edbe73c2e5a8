//! # LSAT Paywall
//!
//! A framework-agnostic HTTP paywall for the LSAT pay-per-request protocol.
//!
//! Clients either present a paid token or receive a payment challenge:
//!
//! - **Challenge**: a client sending `Accept: application/vnd.lsat.v1.full`
//!   without a token gets `402 Payment Required` and
//!   `WWW-Authenticate: LSAT macaroon=<base64>, invoice=<invoice>`.
//! - **Paid**: after paying the invoice, the client retries with
//!   `Authorization: LSAT <macaroon>:<preimage hex>`; the paywall checks the
//!   macaroon signature and that the preimage hashes to the invoice's payment hash.
//! - **Free**: clients that do not announce LSAT support are let through.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use lsat_core::root_key::RootKeyStore;
//! use lsat_paywall::{issuer::Issuer, paywall::PayWall, verifier::Verifier};
//!
//! let root_key = RootKeyStore::global()?;
//!
//! let paywall = PayWall::builder()
//!     .issuer(
//!         Issuer::builder()
//!             .backend(my_lightning_backend)
//!             .root_key(root_key.clone())
//!             .price(|_parts: &http::request::Parts| 1000)
//!             .build(),
//!     )
//!     .verifier(Verifier::builder().root_key(root_key).build())
//!     .build();
//!
//! let app = axum::Router::new()
//!     .route("/protected", axum::routing::get(handler))
//!     .layer(paywall);
//! ```
//!
//! ## Modules
//!
//! - [`issuer`]: [`Issuer`](issuer::Issuer) creates invoices and mints macaroons.
//! - [`verifier`]: [`Verifier`](verifier::Verifier) authenticates tokens and checks payment.
//! - [`classifier`]: [`Classification`](classifier::Classification) of a single request.
//! - [`paywall`]: [`PayWall`](paywall::PayWall) and the request flow.
//! - [`errors`]: [`ErrorResponse`](errors::ErrorResponse) for `402`/`401` answers.
//!
//! ## Error Handling
//!
//! [`ErrorResponse`](errors::ErrorResponse) implements `IntoResponse` for axum and
//! converts into `http::Response<String>` for other frameworks:
//!
//! - `402 Payment Required`: a challenge was issued.
//! - `401 Unauthorized`: a presented token was rejected (only with `reject_invalid`).
//! - `500 Internal Server Error`: a challenge could not be issued (only with `reject_invalid`).

#[cfg(feature = "axum")]
pub mod axum;
pub mod classifier;
pub mod errors;
pub mod issuer;
pub mod paywall;
pub mod verifier;
