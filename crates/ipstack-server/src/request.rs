use std::collections::BTreeMap;
use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, Request},
    http,
    middleware::Next,
    response::Response,
};
use serde::Serialize;
use serde_json::Value;

/// Name of the server parameter holding the peer IP.
pub const REMOTE_ADDR: &str = "REMOTE_ADDR";
pub const REMOTE_PORT: &str = "REMOTE_PORT";

/// Named values attached to a request by middleware, stored in its extensions.
///
/// Updates are functional: [`RequestAttributes::with`] consumes the bag and
/// returns the updated one, and [`AttributeExt::with_attribute`] does the same
/// for the whole request.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RequestAttributes(BTreeMap<String, Value>);

impl RequestAttributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }
}

/// Transport-level request parameters (`REMOTE_ADDR`, `REMOTE_PORT`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServerParams(BTreeMap<String, String>);

impl ServerParams {
    pub fn from_peer(peer: SocketAddr) -> Self {
        Self::default()
            .with(REMOTE_ADDR, peer.ip().to_string())
            .with(REMOTE_PORT, peer.port().to_string())
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }
}

/// Attribute access on `http::Request`.
pub trait AttributeExt: Sized {
    fn attribute(&self, name: &str) -> Option<&Value>;
    fn attributes(&self) -> Option<&RequestAttributes>;
    fn with_attribute(self, name: &str, value: impl Into<Value>) -> Self;
    fn server_param(&self, name: &str) -> Option<&str>;
}

impl<B> AttributeExt for http::Request<B> {
    fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes().and_then(|attrs| attrs.get(name))
    }

    fn attributes(&self) -> Option<&RequestAttributes> {
        self.extensions().get::<RequestAttributes>()
    }

    fn with_attribute(mut self, name: &str, value: impl Into<Value>) -> Self {
        let attrs = self
            .extensions_mut()
            .remove::<RequestAttributes>()
            .unwrap_or_default()
            .with(name, value);
        self.extensions_mut().insert(attrs);
        self
    }

    fn server_param(&self, name: &str) -> Option<&str> {
        self.extensions()
            .get::<ServerParams>()
            .and_then(|params| params.get(name))
    }
}

/// Fill [`ServerParams`] from the accepted connection's peer address.
///
/// Needs the app to be served with
/// `into_make_service_with_connect_info::<SocketAddr>()`. Requests that
/// already carry `ServerParams` are left untouched.
pub async fn server_params(mut request: Request, next: Next) -> Response {
    if request.extensions().get::<ServerParams>().is_none() {
        let peer = request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(peer)| *peer);
        if let Some(peer) = peer {
            request.extensions_mut().insert(ServerParams::from_peer(peer));
        }
    }
    next.run(request).await
}
