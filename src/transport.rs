use crate::errors::BinderError;
use reqwest::{
    header::{ACCEPT, CONTENT_TYPE as CONTENT_TYPE_HEADER},
    Client, Method, Url,
};
use serde_json::Value;
use std::future::Future;
use tracing::debug;

pub const CONTENT_TYPE: &str = "application/json; charset=UTF-8";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundRequest {
    pub method: Method,
    pub url: String,
    pub body: String,
}

impl OutboundRequest {
    pub fn post(url: impl Into<String>, body: String) -> Self {
        Self {
            method: Method::POST,
            url: url.into(),
            body,
        }
    }

    pub fn put(url: impl Into<String>, body: String) -> Self {
        Self {
            method: Method::PUT,
            url: url.into(),
            body,
        }
    }
}

/// Sends one JSON request and yields the parsed JSON reply.
pub trait Transport: Send + Sync + 'static {
    fn send(
        &self,
        request: OutboundRequest,
    ) -> impl Future<Output = Result<Value, BinderError>> + Send;
}

#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: Option<Url>,
}

impl HttpTransport {
    pub fn new(base_url: Option<&str>) -> Result<Self, BinderError> {
        let base_url = base_url
            .map(|raw| Url::parse(raw).map_err(|err| BinderError::invalid_target(raw, err)))
            .transpose()?;

        Ok(Self {
            client: Client::new(),
            base_url,
        })
    }

    pub fn resolve(&self, target: &str) -> Result<Url, BinderError> {
        if let Ok(url) = Url::parse(target) {
            return Ok(url);
        }

        match &self.base_url {
            Some(base) => base
                .join(target)
                .map_err(|err| BinderError::invalid_target(target, err)),
            None => Err(BinderError::invalid_target(
                target,
                "relative path and no base url configured",
            )),
        }
    }
}

impl Transport for HttpTransport {
    async fn send(&self, request: OutboundRequest) -> Result<Value, BinderError> {
        let url = self.resolve(&request.url)?;
        debug!(method = %request.method, %url, body = %request.body, "sending time block request");

        let response = self
            .client
            .request(request.method, url)
            .header(CONTENT_TYPE_HEADER, CONTENT_TYPE)
            .header(ACCEPT, "application/json")
            .body(request.body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BinderError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}
