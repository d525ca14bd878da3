//! The `ajax` network primitive.
//!
//! Requests run on the ambient tokio runtime through a [`Transport`]. Their
//! completions come back over an unbounded channel and are delivered to the
//! caller's [`EventSubject`] on the UI side, either by [`Network::pump`] (the
//! app loop) or by [`Network::settle`] (tests). Subjects therefore only ever
//! fire on the thread that owns the components.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::reactive::EventSubject;

// ---------------------------------------------------------------------------
// Request / response
// ---------------------------------------------------------------------------

/// HTTP method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Head,
}

impl HttpMethod {
    /// Upper-case method name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::Patch => "PATCH",
            Self::Head => "HEAD",
        }
    }
}

impl FromStr for HttpMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "DELETE" => Ok(Self::Delete),
            "PATCH" => Ok(Self::Patch),
            "HEAD" => Ok(Self::Head),
            other => Err(Error::Network(format!("unsupported method `{other}`"))),
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An outgoing request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    #[serde(default)]
    pub headers: Vec<(String, String)>,
    #[serde(default)]
    pub body: Option<String>,
}

impl HttpRequest {
    /// A request with no headers and no body.
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    /// Add a header (builder).
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Set the body (builder).
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }
}

/// What a transport hands back: status and raw body text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    /// Whether the status is in the 2xx range.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Interpret the response: 2xx bodies are parsed as JSON (an empty body
    /// is `null`), anything else is [`Error::HttpStatus`].
    pub fn into_json(self) -> Result<Value> {
        if !self.is_success() {
            return Err(Error::HttpStatus {
                status: self.status,
                body: self.body,
            });
        }
        if self.body.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&self.body)?)
    }
}

// ---------------------------------------------------------------------------
// Transport
// ---------------------------------------------------------------------------

/// Boxed future returned by [`Transport::send`].
pub type TransportFuture = Pin<Box<dyn Future<Output = Result<HttpResponse>> + Send>>;

/// Performs HTTP requests. Swapped out in tests.
pub trait Transport: Send + Sync {
    fn send(&self, request: HttpRequest) -> TransportFuture;
}

/// Default transport backed by `reqwest`.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a preconfigured client (timeouts, proxies, default headers).
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Transport for ReqwestTransport {
    fn send(&self, request: HttpRequest) -> TransportFuture {
        let client = self.client.clone();
        Box::pin(async move {
            let method = reqwest::Method::from_bytes(request.method.as_str().as_bytes())
                .map_err(|e| Error::Network(e.to_string()))?;
            let mut builder = client.request(method, &request.url);
            for (name, value) in &request.headers {
                builder = builder.header(name.as_str(), value.as_str());
            }
            if let Some(body) = request.body {
                builder = builder.body(body);
            }
            let response = builder
                .send()
                .await
                .map_err(|e| Error::Network(e.to_string()))?;
            let status = response.status().as_u16();
            let body = response
                .text()
                .await
                .map_err(|e| Error::Network(e.to_string()))?;
            Ok(HttpResponse { status, body })
        })
    }
}

// ---------------------------------------------------------------------------
// Network
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct Completion {
    request: u64,
    result: Result<HttpResponse>,
}

/// Issues requests and routes their completions back to subjects.
pub struct Network {
    transport: Arc<dyn Transport>,
    tx: mpsc::UnboundedSender<Completion>,
    rx: RefCell<Option<mpsc::UnboundedReceiver<Completion>>>,
    pending: RefCell<HashMap<u64, EventSubject<Value>>>,
    next_request: Cell<u64>,
}

impl fmt::Debug for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Network")
            .field("pending", &self.pending_count())
            .finish()
    }
}

impl Network {
    /// Create a network service over `transport`.
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            transport,
            tx,
            rx: RefCell::new(Some(rx)),
            pending: RefCell::new(HashMap::new()),
            next_request: Cell::new(0),
        }
    }

    /// Start a request. The returned subject emits the parsed JSON body, or
    /// an error on its error channel. Nothing is emitted synchronously.
    pub fn ajax(&self, request: HttpRequest) -> EventSubject<Value> {
        let id = self.next_request.get();
        self.next_request.set(id + 1);
        let subject = EventSubject::new();
        self.pending.borrow_mut().insert(id, subject.clone());
        debug!(id, method = %request.method, url = %request.url, "ajax request");

        let tx = self.tx.clone();
        match Handle::try_current() {
            Ok(handle) => {
                let transport = Arc::clone(&self.transport);
                handle.spawn(async move {
                    let result = transport.send(request).await;
                    // The receiver only goes away with the Network itself.
                    let _ = tx.send(Completion {
                        request: id,
                        result,
                    });
                });
            }
            Err(_) => {
                warn!(id, "ajax called outside a tokio runtime");
                let _ = tx.send(Completion {
                    request: id,
                    result: Err(Error::Network("no tokio runtime available".into())),
                });
            }
        }
        subject
    }

    /// Deliver every completion that has already arrived. Returns how many
    /// were delivered.
    pub fn pump(&self) -> usize {
        let mut delivered = 0;
        loop {
            let next = match self.rx.borrow_mut().as_mut() {
                Some(rx) => rx.try_recv().ok(),
                None => None,
            };
            let Some(completion) = next else {
                break;
            };
            self.deliver(completion);
            delivered += 1;
        }
        delivered
    }

    /// Wait until every outstanding request has completed and been
    /// delivered.
    pub async fn settle(&self) -> usize {
        let mut delivered = self.pump();
        while self.pending_count() > 0 {
            let Some(mut rx) = self.rx.borrow_mut().take() else {
                break;
            };
            let completion = rx.recv().await;
            *self.rx.borrow_mut() = Some(rx);
            match completion {
                Some(completion) => {
                    self.deliver(completion);
                    delivered += 1;
                }
                None => break,
            }
        }
        delivered
    }

    /// Requests started but not yet delivered.
    pub fn pending_count(&self) -> usize {
        self.pending.borrow().len()
    }

    fn deliver(&self, completion: Completion) {
        let Some(subject) = self.pending.borrow_mut().remove(&completion.request) else {
            return;
        };
        match completion.result.and_then(HttpResponse::into_json) {
            Ok(value) => {
                debug!(id = completion.request, "ajax completed");
                subject.next(&value);
            }
            Err(err) => {
                debug!(id = completion.request, error = %err, "ajax failed");
                subject.error(&err);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::rc::Rc;

    struct Canned(HttpResponse);

    impl Transport for Canned {
        fn send(&self, _request: HttpRequest) -> TransportFuture {
            let response = self.0.clone();
            Box::pin(async move { Ok(response) })
        }
    }

    fn canned(status: u16, body: &str) -> Network {
        Network::new(Arc::new(Canned(HttpResponse {
            status,
            body: body.into(),
        })))
    }

    fn capture(subject: &EventSubject<Value>) -> Rc<RefCell<Vec<Result<Value>>>> {
        let log = Rc::new(RefCell::new(Vec::new()));
        let (ok, err) = (Rc::clone(&log), Rc::clone(&log));
        subject.subscribe_with_error(
            move |v: &Value| ok.borrow_mut().push(Ok(v.clone())),
            move |e: &Error| err.borrow_mut().push(Err(e.clone())),
        );
        log
    }

    #[test]
    fn method_parses_case_insensitively() {
        assert_eq!("post".parse::<HttpMethod>().unwrap(), HttpMethod::Post);
        assert!("BREW".parse::<HttpMethod>().is_err());
    }

    #[test]
    fn response_interpretation() {
        let ok = HttpResponse {
            status: 200,
            body: r#"{"a":1}"#.into(),
        };
        assert_eq!(ok.into_json().unwrap(), json!({"a": 1}));

        let empty = HttpResponse {
            status: 204,
            body: String::new(),
        };
        assert_eq!(empty.into_json().unwrap(), Value::Null);

        let missing = HttpResponse {
            status: 404,
            body: "nope".into(),
        };
        assert_eq!(
            missing.into_json().unwrap_err(),
            Error::HttpStatus {
                status: 404,
                body: "nope".into()
            }
        );

        let garbage = HttpResponse {
            status: 200,
            body: "{".into(),
        };
        assert!(matches!(garbage.into_json(), Err(Error::Decode(_))));
    }

    #[tokio::test]
    async fn settle_delivers_the_parsed_body() {
        let network = canned(200, r#"[1,2,3]"#);
        let subject = network.ajax(HttpRequest::new(HttpMethod::Get, "http://test/items"));
        let log = capture(&subject);
        assert!(log.borrow().is_empty());
        assert_eq!(network.settle().await, 1);
        assert_eq!(*log.borrow(), vec![Ok(json!([1, 2, 3]))]);
        assert_eq!(network.pending_count(), 0);
    }

    #[tokio::test]
    async fn non_2xx_goes_to_the_error_channel() {
        let network = canned(500, "boom");
        let subject = network.ajax(HttpRequest::new(HttpMethod::Post, "http://test/items"));
        let log = capture(&subject);
        network.settle().await;
        assert_eq!(
            *log.borrow(),
            vec![Err(Error::HttpStatus {
                status: 500,
                body: "boom".into()
            })]
        );
    }

    #[test]
    fn outside_a_runtime_the_error_is_queued() {
        let network = canned(200, "{}");
        let subject = network.ajax(HttpRequest::new(HttpMethod::Get, "http://test"));
        let log = capture(&subject);
        assert_eq!(network.pump(), 1);
        assert!(matches!(log.borrow()[0], Err(Error::Network(_))));
    }
}
