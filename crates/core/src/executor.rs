//! Request executor
//!
//! Sends one request per user action with the security headers attached, and folds every
//! outcome into an [`ActionResult`]. Nothing is retried: a failure is final for that action.

use std::{cell::RefCell, fmt, rc::Rc, time::Duration};

use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use crate::{
    transport::{
        ApiRequest, ApiResponse, CSRF_HEADER, Method, REQUESTED_WITH_HEADER,
        REQUESTED_WITH_VALUE, RequestBody, Transport, TransportError, cookie_value,
    },
    wire::CartResponse,
};

/// Failure category of an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Transport failure, timeout, cancellation or unreadable reply.
    NetworkError,

    /// Non-2xx status.
    HttpError,

    /// 2xx reply whose payload reports a business failure.
    Rejected,

    /// Client-side precondition failed before any request.
    ValidationError,
}

/// Why an action failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    /// Transport failure, timeout, cancellation or unreadable reply.
    #[error("network error: {0}")]
    Network(String),

    /// Non-2xx status, with the server's message when the body carried one.
    #[error("http status {status}")]
    Http {
        /// Status code.
        status: u16,

        /// Server message from the error body.
        message: Option<String>,
    },

    /// The server answered `success: false`.
    #[error("rejected by server")]
    Rejected(Option<String>),

    /// A client-side precondition failed.
    #[error("validation failed: {0}")]
    Validation(String),
}

impl ActionError {
    /// Failure category.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ActionError::Network(_) => ErrorKind::NetworkError,
            ActionError::Http { .. } => ErrorKind::HttpError,
            ActionError::Rejected(_) => ErrorKind::Rejected,
            ActionError::Validation(_) => ErrorKind::ValidationError,
        }
    }

    /// Message supplied by the server, if any.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ActionError::Http { message, .. } | ActionError::Rejected(message) => {
                message.as_deref()
            }
            ActionError::Network(_) | ActionError::Validation(_) => None,
        }
    }

    /// Message to show the user: the server's own words when it sent any, otherwise
    /// `network` for transport failures and `fallback` for everything else.
    pub fn user_message(&self, fallback: &str, network: &str) -> String {
        match self {
            ActionError::Network(_) => network.to_string(),
            ActionError::Validation(message) => message.clone(),
            ActionError::Http { .. } | ActionError::Rejected(_) => self
                .server_message()
                .unwrap_or(fallback)
                .to_string(),
        }
    }
}

impl From<TransportError> for ActionError {
    fn from(error: TransportError) -> Self {
        ActionError::Network(error.to_string())
    }
}

/// Outcome of one request.
pub type ActionResult = Result<CartResponse, ActionError>;

/// Sends requests on behalf of the dispatcher.
pub struct RequestExecutor {
    transport: Rc<dyn Transport>,
    csrf_cookie: String,
    timeout: Duration,
    navigation: RefCell<CancellationToken>,
}

impl fmt::Debug for RequestExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestExecutor")
            .field("csrf_cookie", &self.csrf_cookie)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl RequestExecutor {
    /// Create an executor over `transport`.
    pub fn new(transport: Rc<dyn Transport>, csrf_cookie: impl Into<String>, timeout: Duration) -> Self {
        Self {
            transport,
            csrf_cookie: csrf_cookie.into(),
            timeout,
            navigation: RefCell::new(CancellationToken::new()),
        }
    }

    /// A fresh token for one action, cancelled by [`RequestExecutor::cancel_all`] as well as
    /// directly.
    pub fn cancellation(&self) -> CancellationToken {
        self.navigation.borrow().child_token()
    }

    /// Cancel every in-flight request (navigation away). Later actions are unaffected.
    pub fn cancel_all(&self) {
        let previous = self.navigation.replace(CancellationToken::new());

        previous.cancel();
    }

    /// Anti-forgery token from the session's cookies.
    pub fn csrf_token(&self) -> Option<String> {
        self.transport
            .cookie_header()
            .and_then(|header| cookie_value(&header, &self.csrf_cookie))
            .filter(|token| !token.is_empty())
    }

    /// Send one request and interpret the reply.
    ///
    /// # Errors
    ///
    /// - [`ActionError::Network`]: transport failure, timeout, cancellation or unreadable body.
    /// - [`ActionError::Http`]: non-2xx status.
    /// - [`ActionError::Rejected`]: 2xx reply with `success: false`.
    pub async fn execute(
        &self,
        endpoint: &str,
        method: Method,
        body: RequestBody,
        cancel: &CancellationToken,
    ) -> ActionResult {
        let request = self.build_request(endpoint, method, body);

        debug!(endpoint, ?method, "dispatching request");

        let response = tokio::select! {
            () = cancel.cancelled() => {
                warn!(endpoint, "request cancelled");

                return Err(ActionError::Network("request cancelled".to_string()));
            }
            () = tokio::time::sleep(self.timeout) => {
                error!(endpoint, timeout = ?self.timeout, "request timed out");

                return Err(TransportError::Timeout.into());
            }
            sent = self.transport.send(request) => sent,
        };

        let response = response.map_err(|source| {
            error!(endpoint, "request failed: {source}");

            ActionError::from(source)
        })?;

        interpret(endpoint, &response)
    }

    fn build_request(&self, endpoint: &str, method: Method, body: RequestBody) -> ApiRequest {
        let mut headers = vec![(REQUESTED_WITH_HEADER, REQUESTED_WITH_VALUE.to_string())];

        if method.is_mutating() {
            if let Some(token) = self.csrf_token() {
                headers.push((CSRF_HEADER, token));
            } else {
                warn!(cookie = %self.csrf_cookie, "no anti-forgery cookie in session");
            }
        }

        ApiRequest {
            method,
            path: endpoint.to_string(),
            body,
            headers,
            timeout: self.timeout,
        }
    }
}

fn interpret(endpoint: &str, response: &ApiResponse) -> ActionResult {
    if !response.is_success() {
        let message = serde_json::from_str::<CartResponse>(&response.body)
            .ok()
            .and_then(|payload| payload.message().map(str::to_string));

        error!(endpoint, status = response.status, "request returned error status");

        return Err(ActionError::Http {
            status: response.status,
            message,
        });
    }

    let payload: CartResponse = serde_json::from_str(&response.body).map_err(|source| {
        error!(endpoint, "unreadable response body: {source}");

        ActionError::Network(format!("unreadable response: {source}"))
    })?;

    if !payload.success {
        warn!(endpoint, message = ?payload.message(), "request rejected");

        return Err(ActionError::Rejected(payload.message().map(str::to_string)));
    }

    Ok(payload)
}

#[cfg(test)]
mod tests {
    use std::future;

    use async_trait::async_trait;
    use testresult::TestResult;

    use crate::transport::MockTransport;

    use super::*;

    const TIMEOUT: Duration = Duration::from_secs(10);

    fn executor(transport: MockTransport) -> RequestExecutor {
        RequestExecutor::new(Rc::new(transport), "csrftoken", TIMEOUT)
    }

    fn transport_replying(response: ApiResponse) -> MockTransport {
        let mut transport = MockTransport::new();

        transport
            .expect_cookie_header()
            .returning(|| Some("sessionid=s; csrftoken=tok".to_string()));
        transport
            .expect_send()
            .once()
            .return_once(move |_| Ok(response));

        transport
    }

    /// Never answers.
    struct SilentTransport;

    #[async_trait(?Send)]
    impl Transport for SilentTransport {
        async fn send(&self, _request: ApiRequest) -> Result<ApiResponse, TransportError> {
            future::pending().await
        }

        fn cookie_header(&self) -> Option<String> {
            None
        }
    }

    #[tokio::test]
    async fn mutating_request_carries_security_headers() -> TestResult {
        let mut transport = MockTransport::new();

        transport
            .expect_cookie_header()
            .returning(|| Some("csrftoken=tok%3D1".to_string()));
        transport
            .expect_send()
            .once()
            .withf(|request| {
                request.header(CSRF_HEADER) == Some("tok=1")
                    && request.header(REQUESTED_WITH_HEADER) == Some(REQUESTED_WITH_VALUE)
                    && request.method == Method::Post
                    && request.path == "/cart/clear/"
            })
            .return_once(|_| Ok(ApiResponse::ok(r#"{"success": true}"#)));

        let response = executor(transport)
            .execute(
                "/cart/clear/",
                Method::Post,
                RequestBody::Empty,
                &CancellationToken::new(),
            )
            .await?;

        assert!(response.success);

        Ok(())
    }

    #[tokio::test]
    async fn read_request_skips_csrf_token() -> TestResult {
        let mut transport = MockTransport::new();

        transport.expect_cookie_header().never();
        transport
            .expect_send()
            .once()
            .withf(|request| request.header(CSRF_HEADER).is_none())
            .return_once(|_| Ok(ApiResponse::ok(r#"{"cart_quantity": 2}"#)));

        let response = executor(transport)
            .execute(
                "/cart/ajax/count/",
                Method::Get,
                RequestBody::Empty,
                &CancellationToken::new(),
            )
            .await?;

        assert_eq!(response.cart_quantity, Some(2));

        Ok(())
    }

    #[tokio::test]
    async fn success_false_is_rejected_with_message() {
        let transport = transport_replying(ApiResponse::ok(
            r#"{"success": false, "message": "Invalid coupon"}"#,
        ));

        let result = executor(transport)
            .execute("/x/", Method::Post, RequestBody::Empty, &CancellationToken::new())
            .await;

        assert_eq!(
            result,
            Err(ActionError::Rejected(Some("Invalid coupon".to_string())))
        );
    }

    #[tokio::test]
    async fn error_status_is_http_error_keeping_server_message() -> TestResult {
        let transport = transport_replying(ApiResponse {
            status: 404,
            body: r#"{"success": false, "message": "Not found"}"#.to_string(),
        });

        let result = executor(transport)
            .execute("/x/", Method::Post, RequestBody::Empty, &CancellationToken::new())
            .await;

        let Err(error) = result else {
            return Err("expected an error".into());
        };

        assert_eq!(error.kind(), ErrorKind::HttpError);
        assert_eq!(error.server_message(), Some("Not found"));

        Ok(())
    }

    #[tokio::test]
    async fn error_status_with_html_body_has_no_message() {
        let transport = transport_replying(ApiResponse {
            status: 500,
            body: "<html>oops</html>".to_string(),
        });

        let result = executor(transport)
            .execute("/x/", Method::Post, RequestBody::Empty, &CancellationToken::new())
            .await;

        assert_eq!(
            result,
            Err(ActionError::Http {
                status: 500,
                message: None
            })
        );
    }

    #[tokio::test]
    async fn transport_failure_is_network_error() {
        let mut transport = MockTransport::new();

        transport.expect_cookie_header().returning(|| None);
        transport
            .expect_send()
            .once()
            .return_once(|_| Err(TransportError::Connect("dns".to_string())));

        let result = executor(transport)
            .execute("/x/", Method::Post, RequestBody::Empty, &CancellationToken::new())
            .await;

        assert_eq!(result.map_err(|error| error.kind()), Err(ErrorKind::NetworkError));
    }

    #[tokio::test]
    async fn unreadable_success_body_is_network_error() {
        let transport = transport_replying(ApiResponse::ok("not json"));

        let result = executor(transport)
            .execute("/x/", Method::Post, RequestBody::Empty, &CancellationToken::new())
            .await;

        assert_eq!(result.map_err(|error| error.kind()), Err(ErrorKind::NetworkError));
    }

    #[tokio::test(start_paused = true)]
    async fn hung_request_times_out_as_network_error() {
        let executor = RequestExecutor::new(Rc::new(SilentTransport), "csrftoken", TIMEOUT);

        let result = executor
            .execute("/x/", Method::Get, RequestBody::Empty, &CancellationToken::new())
            .await;

        assert_eq!(
            result,
            Err(ActionError::Network("request timed out".to_string()))
        );
    }

    #[tokio::test]
    async fn navigation_cancels_in_flight_requests_only() {
        let executor = RequestExecutor::new(Rc::new(SilentTransport), "csrftoken", TIMEOUT);
        let cancel = executor.cancellation();

        let (result, ()) = tokio::join!(
            executor.execute("/x/", Method::Get, RequestBody::Empty, &cancel),
            async { executor.cancel_all() },
        );

        assert_eq!(
            result,
            Err(ActionError::Network("request cancelled".to_string()))
        );
        assert!(!executor.cancellation().is_cancelled());
    }

    #[test]
    fn user_message_prefers_server_text() {
        let rejected = ActionError::Rejected(Some("Out of stock".to_string()));
        let silent = ActionError::Rejected(None);
        let network = ActionError::Network("dns".to_string());

        assert_eq!(rejected.user_message("fallback", "offline"), "Out of stock");
        assert_eq!(silent.user_message("fallback", "offline"), "fallback");
        assert_eq!(network.user_message("fallback", "offline"), "offline");
    }
}
