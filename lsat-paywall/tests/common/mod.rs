//! Test payment backend standing in for a Lightning node.

#![allow(dead_code)]

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use http::request::Parts;
use lsat_core::{
    backend::{Invoice, PaymentBackend},
    root_key::RootKey,
    types::{Amount, PaymentHash, Preimage},
};
use lsat_paywall::{issuer::Issuer, paywall::PayWall, verifier::Verifier};

#[derive(Debug, thiserror::Error)]
#[error("lightning node unreachable")]
pub struct Unreachable;

/// Mints a random preimage per invoice and remembers it, so tests can "pay".
#[derive(Debug, Clone, Default)]
pub struct MockLightning {
    pub(crate) preimages: Arc<Mutex<HashMap<PaymentHash, Preimage>>>,
    pub(crate) invoiced: Arc<Mutex<Vec<Amount>>>,
    pub unreachable: bool,
}

impl MockLightning {
    /// Settle the invoice for `payment_hash`, revealing its preimage.
    pub fn pay(&self, payment_hash: &PaymentHash) -> Preimage {
        self.preimages.lock().unwrap()[payment_hash]
    }

    pub fn invoiced(&self) -> Vec<Amount> {
        self.invoiced.lock().unwrap().clone()
    }
}

impl PaymentBackend for MockLightning {
    type Error = Unreachable;

    async fn create_invoice(
        &self,
        amount: Amount,
        _memo: &str,
    ) -> Result<Invoice, Unreachable> {
        if self.unreachable {
            return Err(Unreachable);
        }
        let preimage = Preimage::random();
        let payment_hash = preimage.hash();
        self.preimages.lock().unwrap().insert(payment_hash, preimage);
        self.invoiced.lock().unwrap().push(amount);
        Ok(Invoice {
            payment_request: format!("lnbcrt{}n1mock{}", amount.0, payment_hash),
            payment_hash,
        })
    }
}

pub fn paywall(backend: MockLightning, price: i64) -> PayWall<MockLightning> {
    paywall_with_key(backend, price, Arc::new(RootKey::generate()))
}

pub fn paywall_with_key(
    backend: MockLightning,
    price: i64,
    root_key: Arc<RootKey>,
) -> PayWall<MockLightning> {
    PayWall::builder()
        .issuer(
            Issuer::builder()
                .backend(backend)
                .root_key(root_key.clone())
                .price(move |_: &Parts| price)
                .build(),
        )
        .verifier(Verifier::builder().root_key(root_key).build())
        .build()
}
