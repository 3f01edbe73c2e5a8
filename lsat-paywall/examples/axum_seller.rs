//! An axum server selling `/resource` for 1000 sat per request.
//!
//! The invoices come from a fake node that logs each preimage, so the flow can
//! be exercised with curl:
//!
//! ```text
//! curl -i -H 'Accept: application/vnd.lsat.v1.full' localhost:3000/resource
//! curl -i -H 'Authorization: LSAT <macaroon>:<preimage>' localhost:3000/resource
//! ```

use std::sync::Arc;

use axum::{
    Extension, Json, Router,
    http::{StatusCode, request::Parts},
    routing::get,
};
use lsat_core::{
    backend::{Invoice, PaymentBackend},
    root_key::{RootKey, RootKeyStore},
    types::{Amount, Preimage},
};
use lsat_paywall::{
    issuer::Issuer,
    paywall::{LsatInfo, PayWall},
    verifier::Verifier,
};
use serde_json::{Value, json};
use tower_http::trace::TraceLayer;

/// Stand-in for a Lightning node. Never use outside of local testing.
#[derive(Debug, Clone)]
struct FakeNode;

impl PaymentBackend for FakeNode {
    type Error = std::convert::Infallible;

    async fn create_invoice(
        &self,
        amount: Amount,
        memo: &str,
    ) -> Result<Invoice, Self::Error> {
        let preimage = Preimage::random();
        let payment_hash = preimage.hash();
        tracing::info!(
            "Invoice for {amount} ({memo}): payment_hash={payment_hash}, preimage={}",
            preimage.to_hex()
        );
        Ok(Invoice {
            payment_request: format!("lnbcrt{}n1fake{}", amount.0, payment_hash),
            payment_hash,
        })
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let root_key = RootKeyStore::global().unwrap_or_else(|err| {
        tracing::warn!("{err}; using a random root key for this run");
        Arc::new(RootKey::generate())
    });

    let paywall = PayWall::builder()
        .issuer(
            Issuer::builder()
                .backend(FakeNode)
                .root_key(root_key.clone())
                .price(|_: &Parts| 1000)
                .build(),
        )
        .verifier(Verifier::builder().root_key(root_key).build())
        .build();

    let app = Router::new()
        .route("/resource", get(example_handler).layer(paywall))
        .layer(TraceLayer::new_for_http());

    let port = std::env::var("PORT")
        .unwrap_or_else(|_| "3000".to_string())
        .parse::<u16>()
        .expect("PORT must be a valid u16 integer");
    let addr: std::net::SocketAddr = ([0, 0, 0, 0], port).into();

    tracing::info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app).await.expect("Server failed");
}

async fn example_handler(Extension(lsat): Extension<LsatInfo>) -> (StatusCode, Json<Value>) {
    match lsat {
        LsatInfo::Paid { identifier, .. } => (
            StatusCode::OK,
            Json(json!({
                "message": "Protected Content",
                "token": identifier,
            })),
        ),
        LsatInfo::Free => (StatusCode::OK, Json(json!({ "message": "Free Content" }))),
        LsatInfo::Invalid(err) => (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "message": err.to_string() })),
        ),
    }
}
