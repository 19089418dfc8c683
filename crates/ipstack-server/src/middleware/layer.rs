use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use axum::http::{Request, Response};
use tower::{Layer, Service};

use super::{GeoIpMiddleware, Outcome};

/// Tower layer running [`GeoIpMiddleware`] in front of the wrapped service.
#[derive(Clone)]
pub struct GeoIpLayer {
    middleware: GeoIpMiddleware,
}

impl GeoIpLayer {
    pub fn new(middleware: GeoIpMiddleware) -> Self {
        Self { middleware }
    }
}

impl<S> Layer<S> for GeoIpLayer {
    type Service = GeoIpService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        GeoIpService {
            inner,
            middleware: self.middleware.clone(),
        }
    }
}

#[derive(Clone)]
pub struct GeoIpService<S> {
    inner: S,
    middleware: GeoIpMiddleware,
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for GeoIpService<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    ReqBody: Send + 'static,
    ResBody: Default + Send + 'static,
{
    type Response = Response<ResBody>;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<ReqBody>) -> Self::Future {
        // The readied service goes into the future; a fresh clone stays behind.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let middleware = self.middleware.clone();

        Box::pin(async move {
            match middleware.process(request).await {
                Outcome::Proceed(request) => inner.call(request).await,
                Outcome::Reject(status) => {
                    let mut response = Response::new(ResBody::default());
                    *response.status_mut() = status;
                    Ok(response)
                }
            }
        })
    }
}
