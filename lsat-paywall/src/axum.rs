//! [`tower::Layer`] integration for axum routers.

use std::{convert::Infallible, pin::Pin, sync::Arc};

use axum::{
    extract::Request,
    response::{IntoResponse, Response},
};
use lsat_core::backend::PaymentBackend;
use tower::{Layer, Service};

use crate::paywall::PayWall;

impl<B: PaymentBackend + Clone, S> Layer<S> for PayWall<B> {
    type Service = PayWallService<B, S>;

    fn layer(&self, inner: S) -> Self::Service {
        PayWallService {
            paywall: Arc::new(self.clone()),
            inner,
        }
    }
}

pub struct PayWallService<B: PaymentBackend, S> {
    paywall: Arc<PayWall<B>>,
    inner: S,
}

impl<B: PaymentBackend, S: Clone> Clone for PayWallService<B, S> {
    fn clone(&self) -> Self {
        PayWallService {
            paywall: self.paywall.clone(),
            inner: self.inner.clone(),
        }
    }
}

impl<B, S> Service<Request> for PayWallService<B, S>
where
    B: PaymentBackend + Send + Sync + 'static,
    S: Service<Request, Response = Response, Error = Infallible> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request) -> Self::Future {
        let paywall = self.paywall.clone();
        // The readied service handles this request; a fresh clone takes its place.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move {
            let response = paywall
                .handle_request(request, |req| async move {
                    match inner.call(req).await {
                        Ok(response) => response,
                        Err(never) => match never {},
                    }
                })
                .await
                .unwrap_or_else(|err| err.into_response());

            Ok(response)
        })
    }
}
