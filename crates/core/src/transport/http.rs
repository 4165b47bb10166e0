//! reqwest-backed transport with a cookie jar.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{
    Client, Url,
    cookie::{CookieStore, Jar},
};
use thiserror::Error;
use tracing::debug;

use super::{ApiRequest, ApiResponse, Method, RequestBody, Transport, TransportError};

/// Errors raised while building an [`HttpTransport`].
#[derive(Debug, Error)]
pub enum HttpTransportError {
    /// The storefront base URL is not a valid absolute URL.
    #[error("invalid base url: {0}")]
    BaseUrl(#[from] url::ParseError),

    /// The underlying HTTP client could not be built.
    #[error("http client error: {0}")]
    Client(#[from] reqwest::Error),
}

/// HTTP session against one storefront origin.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    base_url: Url,
    jar: Arc<Jar>,
    http: Client,
}

impl HttpTransport {
    /// Create a session rooted at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL does not parse or the client cannot be built.
    pub fn new(base_url: &str) -> Result<Self, HttpTransportError> {
        let base_url = Url::parse(base_url)?;
        let jar = Arc::new(Jar::default());

        let http = Client::builder()
            .cookie_provider(Arc::clone(&jar))
            .build()?;

        Ok(Self {
            base_url,
            jar,
            http,
        })
    }

    /// Seed the jar with a cookie, as if the server had set it.
    pub fn add_cookie(&self, cookie: &str) {
        self.jar.add_cookie_str(cookie, &self.base_url);
    }

    fn resolve(&self, path: &str) -> Result<Url, TransportError> {
        self.base_url
            .join(path)
            .map_err(|error| TransportError::Other(format!("invalid path {path}: {error}")))
    }
}

#[async_trait(?Send)]
impl Transport for HttpTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        let url = self.resolve(&request.path)?;

        debug!(method = ?request.method, %url, "sending request");

        let mut builder = match request.method {
            Method::Get => self.http.get(url),
            Method::Post => self.http.post(url),
        }
        .timeout(request.timeout);

        for (name, value) in &request.headers {
            builder = builder.header(*name, value);
        }

        builder = match &request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(body) => builder.json(body),
            RequestBody::Form(pairs) => builder.form(pairs),
        };

        let response = builder.send().await.map_err(into_transport_error)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(into_transport_error)?;

        Ok(ApiResponse { status, body })
    }

    fn cookie_header(&self) -> Option<String> {
        self.jar
            .cookies(&self.base_url)
            .and_then(|value| value.to_str().map(str::to_string).ok())
    }
}

fn into_transport_error(error: reqwest::Error) -> TransportError {
    if error.is_timeout() {
        TransportError::Timeout
    } else if error.is_connect() {
        TransportError::Connect(error.to_string())
    } else {
        TransportError::Other(error.to_string())
    }
}
