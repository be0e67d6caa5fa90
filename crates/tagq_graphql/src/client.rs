//! GraphQL client.
//!
//! Sends a query document and its variables as a JSON POST body and decodes
//! the whole response body into the caller's type.
//!
//! ```ignore
//! use tagq_graphql::{build_query, Client, ClientConfig, Request};
//!
//! let client = Client::new(ClientConfig::new("http://localhost:8080/graphql"));
//!
//! let mut request = Request::new(build_query::<Contract>(Some("ContractFiltersInput")));
//! request.var("limit", 50)?;
//! request.var("filter", &filter)?;
//! request.header("Authorization", "Bearer token");
//!
//! let response: Envelope<ContractPage> = client.run(&request).await?;
//! ```

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tagq_core::{Result, TagqError};
use tracing::debug;

const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// URL of the GraphQL endpoint.
    pub url: String,
    /// Timeout applied to each transport phase.
    pub timeout: Duration,
    /// Headers sent with every request, before per-request headers.
    pub headers: Vec<(String, String)>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            timeout: Duration::from_secs(30),
            headers: Vec::new(),
        }
    }
}

impl ClientConfig {
    /// Creates a new config with a URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Sets the timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Adds a default header.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }
}

/// A GraphQL request under construction.
///
/// Owned by one caller; variables are allocated on the first `var` call.
#[derive(Debug, Clone, Default)]
pub struct Request {
    query: String,
    vars: Option<serde_json::Map<String, serde_json::Value>>,
    headers: BTreeMap<String, Vec<String>>,
}

impl Request {
    /// Creates a request for a query document.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }

    /// Sets a variable, replacing any previous value under `key`.
    pub fn var(&mut self, key: impl Into<String>, value: impl Serialize) -> Result<&mut Self> {
        let value = serde_json::to_value(value)
            .map_err(|e| TagqError::encoding(e.to_string()).with_source(e))?;
        self.vars
            .get_or_insert_with(serde_json::Map::new)
            .insert(key.into(), value);
        Ok(self)
    }

    /// Adds a header value; repeated keys keep every value.
    pub fn header(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.headers.entry(key.into()).or_default().push(value.into());
        self
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn vars(&self) -> Option<&serde_json::Map<String, serde_json::Value>> {
        self.vars.as_ref()
    }

    pub fn headers(&self) -> &BTreeMap<String, Vec<String>> {
        &self.headers
    }
}

#[derive(Serialize)]
struct RequestBody<'a> {
    query: &'a str,
    variables: Option<&'a serde_json::Map<String, serde_json::Value>>,
}

/// Delivers an encoded request body and returns the raw response body.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn post(&self, url: &str, body: String, headers: &[(String, String)])
        -> Result<String>;
}

/// The GraphQL client.
#[derive(Clone)]
pub struct Client {
    config: ClientConfig,
    transport: Arc<dyn Transport>,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Creates a client using the built-in HTTP transport.
    pub fn new(config: ClientConfig) -> Self {
        let transport = HttpTransport::new(config.timeout);
        Self::with_transport(config, transport)
    }

    /// Creates a client over a custom transport.
    pub fn with_transport(config: ClientConfig, transport: impl Transport + 'static) -> Self {
        Self {
            config,
            transport: Arc::new(transport),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Runs a request and decodes the response body into `T`.
    ///
    /// Errors are returned as they happen; nothing is retried.
    pub async fn run<T: DeserializeOwned>(&self, request: &Request) -> Result<T> {
        let body = serde_json::to_string(&RequestBody {
            query: &request.query,
            variables: request.vars.as_ref(),
        })
        .map_err(|e| TagqError::encoding(e.to_string()).with_source(e))?;

        let headers = self.headers_for(request);

        debug!(
            url = %self.config.url,
            query = %request.query.chars().take(100).collect::<String>(),
            "sending GraphQL request"
        );

        let response = self.transport.post(&self.config.url, body, &headers).await?;

        serde_json::from_str(&response).map_err(|e| {
            TagqError::decoding(format!(
                "Failed to decode response: {}. Body: {}",
                e,
                response.chars().take(200).collect::<String>()
            ))
            .with_source(e)
        })
    }

    fn headers_for(&self, request: &Request) -> Vec<(String, String)> {
        let mut headers = vec![
            ("Content-Type".to_string(), JSON_CONTENT_TYPE.to_string()),
            ("Accept".to_string(), JSON_CONTENT_TYPE.to_string()),
        ];
        headers.extend(self.config.headers.iter().cloned());
        for (key, values) in &request.headers {
            headers.extend(values.iter().map(|value| (key.clone(), value.clone())));
        }
        headers
    }
}

/// HTTP/1.1 transport over plain TCP.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    timeout: Duration,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post(
        &self,
        url: &str,
        body: String,
        headers: &[(String, String)],
    ) -> Result<String> {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};
        use tokio::net::TcpStream;
        use tokio::time::timeout;

        let (host, port, path) = parse_url(url)?;

        let mut stream = timeout(self.timeout, TcpStream::connect((host.as_str(), port)))
            .await
            .map_err(|_| TagqError::timeout())?
            .map_err(|e| TagqError::transport(format!("Connection failed: {e}")).with_source(e))?;

        let mut request = format!(
            "POST {path} HTTP/1.1\r\n\
             Host: {}\r\n\
             Content-Length: {}\r\n\
             Connection: close\r\n",
            host_header(&host, port),
            body.len()
        );
        for (key, value) in headers {
            request.push_str(&format!("{key}: {value}\r\n"));
        }
        request.push_str("\r\n");
        request.push_str(&body);

        timeout(self.timeout, stream.write_all(request.as_bytes()))
            .await
            .map_err(|_| TagqError::timeout())?
            .map_err(|e| TagqError::transport(format!("Write failed: {e}")).with_source(e))?;

        let mut response = Vec::new();
        timeout(self.timeout, stream.read_to_end(&mut response))
            .await
            .map_err(|_| TagqError::timeout())?
            .map_err(|e| TagqError::transport(format!("Read failed: {e}")).with_source(e))?;

        parse_http_response(&response)
    }
}

/// `Host` header value; the port is omitted only when it is the HTTP default.
fn host_header(host: &str, port: u16) -> String {
    if port == 80 {
        host.to_string()
    } else {
        format!("{host}:{port}")
    }
}

/// Parses a URL into host, port, and path.
fn parse_url(url: &str) -> Result<(String, u16, String)> {
    let url = url.trim();

    if url.starts_with("https://") {
        return Err(TagqError::invalid_url(
            "HTTPS is not supported by the built-in transport; supply a Transport",
        ));
    }
    let without_scheme = url.strip_prefix("http://").unwrap_or(url);

    let (host_port, path) = match without_scheme.find('/') {
        Some(slash) => without_scheme.split_at(slash),
        None => (without_scheme, "/"),
    };
    if host_port.is_empty() {
        return Err(TagqError::invalid_url(format!("Missing host: {url:?}")));
    }

    let (host, port) = match host_port.rsplit_once(':') {
        Some((host, port)) => {
            let port = port
                .parse()
                .map_err(|_| TagqError::invalid_url(format!("Invalid port: {port}")))?;
            (host.to_string(), port)
        }
        None => (host_port.to_string(), 80),
    };

    Ok((host, port, path.to_string()))
}

/// Checks the status line and extracts the body.
///
/// The body is decoded as UTF-8 only after chunks are joined, so a character
/// may straddle a chunk boundary.
fn parse_http_response(response: &[u8]) -> Result<String> {
    let Some((head, body)) =
        split_once_bytes(response, b"\r\n\r\n").or_else(|| split_once_bytes(response, b"\n\n"))
    else {
        return Err(TagqError::transport("Could not find response body"));
    };
    let head = String::from_utf8_lossy(head);

    let status_line = head.lines().next().unwrap_or_default();
    let status = status_line
        .split_whitespace()
        .nth(1)
        .and_then(|code| code.parse::<u16>().ok())
        .ok_or_else(|| TagqError::transport(format!("Malformed status line: {status_line:?}")))?;
    if !(200..300).contains(&status) {
        return Err(TagqError::transport(format!("HTTP error: {status_line}")));
    }

    let body = if head.lines().skip(1).any(is_chunked_header) {
        parse_chunked_body(body)?
    } else {
        body.to_vec()
    };

    String::from_utf8(body).map_err(|e| {
        TagqError::decoding(format!("Response body is not valid UTF-8: {e}")).with_source(e)
    })
}

/// Whether a header line declares chunked as the final transfer coding.
fn is_chunked_header(line: &str) -> bool {
    let Some((name, value)) = line.split_once(':') else {
        return false;
    };
    name.trim().eq_ignore_ascii_case("transfer-encoding")
        && value
            .rsplit(',')
            .next()
            .is_some_and(|coding| coding.trim().eq_ignore_ascii_case("chunked"))
}

fn split_once_bytes<'a>(haystack: &'a [u8], needle: &[u8]) -> Option<(&'a [u8], &'a [u8])> {
    let at = haystack
        .windows(needle.len())
        .position(|window| window == needle)?;
    Some((&haystack[..at], &haystack[at + needle.len()..]))
}

/// Decodes a chunked transfer-encoding body.
fn parse_chunked_body(body: &[u8]) -> Result<Vec<u8>> {
    let mut result = Vec::new();
    let mut remaining = body;

    loop {
        let Some((size_line, rest)) = split_once_bytes(remaining, b"\n") else {
            break;
        };
        let size_line = String::from_utf8_lossy(size_line);
        let size_str = size_line.trim().split(';').next().unwrap_or_default();
        let chunk_size = usize::from_str_radix(size_str.trim(), 16)
            .map_err(|_| TagqError::transport(format!("Invalid chunk size: {size_str:?}")))?;
        if chunk_size == 0 {
            break;
        }

        let chunk = rest.get(..chunk_size).ok_or_else(|| {
            TagqError::transport("Chunk extends past the end of the response")
        })?;
        result.extend_from_slice(chunk);

        let rest = &rest[chunk_size..];
        remaining = rest
            .strip_prefix(b"\r\n")
            .or_else(|| rest.strip_prefix(b"\n"))
            .unwrap_or(rest);
    }

    Ok(result)
}
