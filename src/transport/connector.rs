//! Outbound WebSocket dialing.
//!
//! # Connection Flow
//!
//! 1. Build the connect URL, appending `sec_access_token` when present
//! 2. Build the upgrade request with custom headers and the `Cookie` header
//! 3. Dial directly or through an HTTP CONNECT proxy tunnel
//! 4. Require status 101 from the upgrade response
//! 5. Wrap the socket in a [`Connection`] with no inbound size limit

// ============================================================================
// Imports
// ============================================================================

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use rustc_hash::FxHashMap;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Error as WsError;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::handshake::client::{Request, Response};
use tokio_tungstenite::tungstenite::http::{HeaderName, HeaderValue, StatusCode, header};
use tokio_tungstenite::tungstenite::protocol::WebSocketConfig;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, info};
use url::Url;

use crate::error::{Error, Result};
use crate::session::SessionConfig;

use super::Connection;

// ============================================================================
// Constants
// ============================================================================

/// Query parameter carrying the conversation access token.
pub const ACCESS_TOKEN_PARAM: &str = "sec_access_token";

/// Bytes escaped in cookie values: everything except unreserved path
/// characters and `$&+=:@`.
const COOKIE_VALUE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b'$')
    .remove(b'&')
    .remove(b'+')
    .remove(b'=')
    .remove(b':')
    .remove(b'@');

/// Upper bound on a proxy CONNECT response head.
const MAX_PROXY_RESPONSE: usize = 8 * 1024;

// ============================================================================
// Types
// ============================================================================

/// Socket type produced by [`connect`].
pub type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

// ============================================================================
// Connect
// ============================================================================

/// Dials the configured endpoint and returns a framed connection.
///
/// # Errors
///
/// - [`Error::ConnectionTimeout`] if dial and upgrade exceed the connect timeout
/// - [`Error::UpgradeRejected`] if the remote does not answer 101
/// - [`Error::Connection`] if the dial or proxy tunnel fails
/// - [`Error::InvalidHeader`] if a header cannot be encoded
pub async fn connect(config: &SessionConfig, access_token: &str) -> Result<Connection<WsStream>> {
    let url = connect_url(&config.endpoint, access_token)?;
    let request = upgrade_request(&url, &config.headers, &config.cookies)?;
    let proxy = config.proxy.as_deref().map(parse_proxy).transpose()?;

    let ws_config = WebSocketConfig::default()
        .max_message_size(None)
        .max_frame_size(None);

    let connect_timeout = config.timeouts.connect;
    let (stream, response) = timeout(connect_timeout, dial(&url, request, proxy, ws_config))
        .await
        .map_err(|_| Error::connection_timeout(connect_timeout.as_millis() as u64))??;

    if response.status() != StatusCode::SWITCHING_PROTOCOLS {
        return Err(Error::upgrade_rejected(response.status().as_u16()));
    }

    info!(host = url.host_str().unwrap_or_default(), "WebSocket connection established");

    Ok(Connection::new(stream)
        .with_debug(config.debug)
        .with_timeouts(config.timeouts.write, config.timeouts.read))
}

/// Builds the connect URL, appending the access token when non-empty.
///
/// # Errors
///
/// Returns [`Error::Url`] if the endpoint is not a valid URL.
pub fn connect_url(endpoint: &str, access_token: &str) -> Result<Url> {
    let mut url = Url::parse(endpoint)?;
    if !access_token.is_empty() {
        url.query_pairs_mut()
            .append_pair(ACCESS_TOKEN_PARAM, access_token);
    }
    Ok(url)
}

/// Formats cookies as a `Cookie` header value.
///
/// Each pair is rendered as `name=escaped_value; `. Order is unspecified.
#[must_use]
pub fn format_cookie_header(cookies: &FxHashMap<String, String>) -> String {
    let mut header = String::new();
    for (name, value) in cookies {
        header.push_str(name);
        header.push('=');
        header.push_str(&escape_cookie_value(value));
        header.push_str("; ");
    }
    header
}

/// Percent-encodes a cookie value as a URL path segment.
#[must_use]
pub fn escape_cookie_value(value: &str) -> String {
    utf8_percent_encode(value, COOKIE_VALUE).to_string()
}

// ============================================================================
// Helpers
// ============================================================================

/// Builds the upgrade request with headers and cookies.
fn upgrade_request(
    url: &Url,
    headers: &FxHashMap<String, String>,
    cookies: &FxHashMap<String, String>,
) -> Result<Request> {
    let mut request = url.as_str().into_client_request()?;

    for (name, value) in headers {
        let header_name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| Error::invalid_header(format!("{name}: {e}")))?;
        let header_value = HeaderValue::from_str(value)
            .map_err(|e| Error::invalid_header(format!("{name}: {e}")))?;
        request.headers_mut().insert(header_name, header_value);
    }

    if !cookies.is_empty() {
        let cookie = HeaderValue::from_str(&format_cookie_header(cookies))
            .map_err(|e| Error::invalid_header(format!("Cookie: {e}")))?;
        request.headers_mut().insert(header::COOKIE, cookie);
    }

    Ok(request)
}

/// Validates a proxy URL; only `http://` proxies are supported.
pub(crate) fn parse_proxy(proxy: &str) -> Result<Url> {
    let url = Url::parse(proxy)?;
    if url.scheme() != "http" {
        return Err(Error::config(format!(
            "Unsupported proxy scheme '{}', expected http",
            url.scheme()
        )));
    }
    if url.host_str().is_none() {
        return Err(Error::config(format!("Proxy URL has no host: {proxy}")));
    }
    Ok(url)
}

/// Dials directly or through the proxy and performs the upgrade.
async fn dial(
    url: &Url,
    request: Request,
    proxy: Option<Url>,
    ws_config: WebSocketConfig,
) -> Result<(WsStream, Response)> {
    let result = match proxy {
        None => tokio_tungstenite::connect_async_with_config(request, Some(ws_config), false).await,
        Some(proxy) => {
            let tunnel = open_tunnel(&proxy, url).await?;
            tokio_tungstenite::client_async_tls_with_config(request, tunnel, Some(ws_config), None)
                .await
        }
    };

    result.map_err(|e| match e {
        WsError::Http(response) => Error::upgrade_rejected(response.status().as_u16()),
        other => Error::connection(other.to_string()),
    })
}

/// Opens an HTTP CONNECT tunnel to the target through the proxy.
async fn open_tunnel(proxy: &Url, target: &Url) -> Result<TcpStream> {
    let proxy_host = proxy.host_str().unwrap_or_default();
    let proxy_port = proxy.port_or_known_default().unwrap_or(80);
    let target_host = target
        .host_str()
        .ok_or_else(|| Error::config(format!("Endpoint has no host: {target}")))?;
    let target_port = target
        .port_or_known_default()
        .ok_or_else(|| Error::config(format!("Endpoint has no port: {target}")))?;

    let mut stream = TcpStream::connect((proxy_host, proxy_port))
        .await
        .map_err(|e| Error::connection(format!("Proxy dial failed: {e}")))?;

    let authority = format!("{target_host}:{target_port}");
    let mut head = format!("CONNECT {authority} HTTP/1.1\r\nHost: {authority}\r\n");
    if !proxy.username().is_empty() {
        let username = urlencoding::decode(proxy.username())
            .map_err(|e| Error::config(format!("Invalid proxy username: {e}")))?;
        let password = urlencoding::decode(proxy.password().unwrap_or_default())
            .map_err(|e| Error::config(format!("Invalid proxy password: {e}")))?;
        let credentials = BASE64.encode(format!("{username}:{password}"));
        head.push_str(&format!("Proxy-Authorization: Basic {credentials}\r\n"));
    }
    head.push_str("\r\n");
    stream.write_all(head.as_bytes()).await?;

    let status = read_tunnel_status(&mut stream).await?;
    if status != 200 {
        return Err(Error::connection(format!(
            "Proxy refused CONNECT to {authority}: HTTP {status}"
        )));
    }

    debug!(proxy = proxy_host, %authority, "Proxy tunnel established");
    Ok(stream)
}

/// Reads the CONNECT response head and returns its status code.
async fn read_tunnel_status(stream: &mut TcpStream) -> Result<u16> {
    let mut head = Vec::with_capacity(256);
    let mut byte = [0u8; 1];

    while !head.ends_with(b"\r\n\r\n") {
        if head.len() >= MAX_PROXY_RESPONSE {
            return Err(Error::connection("Proxy response head too large"));
        }
        if stream.read(&mut byte).await? == 0 {
            return Err(Error::connection("Proxy closed during CONNECT"));
        }
        head.push(byte[0]);
    }

    let head = String::from_utf8_lossy(&head);
    head.split_whitespace()
        .nth(1)
        .and_then(|code| code.parse().ok())
        .ok_or_else(|| Error::connection("Malformed proxy response"))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;

    #[test]
    fn test_connect_url_without_token() {
        let url = connect_url("wss://sydney.bing.com/sydney/ChatHub", "").unwrap();
        assert_eq!(url.as_str(), "wss://sydney.bing.com/sydney/ChatHub");
    }

    #[test]
    fn test_connect_url_with_token() {
        let url = connect_url("wss://sydney.bing.com/sydney/ChatHub", "a+b/c=").unwrap();
        assert_eq!(
            url.as_str(),
            "wss://sydney.bing.com/sydney/ChatHub?sec_access_token=a%2Bb%2Fc%3D"
        );

        let (key, value) = url.query_pairs().next().unwrap();
        assert_eq!(key, ACCESS_TOKEN_PARAM);
        assert_eq!(value, "a+b/c=");
    }

    #[test]
    fn test_connect_url_invalid() {
        assert!(matches!(
            connect_url("not a url", "").unwrap_err(),
            Error::Url(_)
        ));
    }

    #[test]
    fn test_format_cookie_header() {
        let mut cookies = FxHashMap::default();
        cookies.insert("_U".to_string(), "abc def".to_string());
        assert_eq!(format_cookie_header(&cookies), "_U=abc%20def; ");
    }

    #[test]
    fn test_format_cookie_header_multiple() {
        let mut cookies = FxHashMap::default();
        cookies.insert("a".to_string(), "1".to_string());
        cookies.insert("b".to_string(), "2".to_string());

        let header = format_cookie_header(&cookies);
        assert!(header.contains("a=1; "));
        assert!(header.contains("b=2; "));
        assert_eq!(header.len(), "a=1; b=2; ".len());
    }

    #[test]
    fn test_escape_cookie_value_keeps_base64() {
        assert_eq!(escape_cookie_value("AbC+/x=="), "AbC+%2Fx==");
        assert_eq!(escape_cookie_value("a;b,c?"), "a%3Bb%2Cc%3F");
    }

    #[test]
    fn test_escape_cookie_value_path_set() {
        assert_eq!(escape_cookie_value("-_.~$&+=:@"), "-_.~$&+=:@");
        assert_eq!(escape_cookie_value("a b\"%/"), "a%20b%22%25%2F");
        assert_eq!(escape_cookie_value("é"), "%C3%A9");
    }

    #[test]
    fn test_upgrade_request_headers_and_cookie() {
        let url = connect_url("wss://example.com/hub", "").unwrap();
        let mut headers = FxHashMap::default();
        headers.insert("Origin".to_string(), "https://www.bing.com".to_string());
        let mut cookies = FxHashMap::default();
        cookies.insert("_U".to_string(), "token".to_string());

        let request = upgrade_request(&url, &headers, &cookies).unwrap();
        assert_eq!(request.headers()["origin"], "https://www.bing.com");
        assert_eq!(request.headers()["cookie"], "_U=token; ");
    }

    #[test]
    fn test_upgrade_request_invalid_header() {
        let url = connect_url("wss://example.com/hub", "").unwrap();
        let mut headers = FxHashMap::default();
        headers.insert("Bad Header".to_string(), "x".to_string());

        let err = upgrade_request(&url, &headers, &FxHashMap::default()).unwrap_err();
        assert!(matches!(err, Error::InvalidHeader { .. }));
    }

    #[test]
    fn test_parse_proxy() {
        assert!(parse_proxy("http://127.0.0.1:7890").is_ok());
        assert!(matches!(
            parse_proxy("socks5://127.0.0.1:1080").unwrap_err(),
            Error::Config { .. }
        ));
    }

    proptest! {
        #[test]
        fn prop_escaped_cookie_decodes_to_original(value in "\\PC{0,32}") {
            let escaped = escape_cookie_value(&value);
            prop_assert!(!escaped.contains(';'));
            prop_assert!(!escaped.contains(' '));
            let decoded = urlencoding::decode(&escaped).unwrap();
            prop_assert_eq!(decoded.as_ref(), value.as_str());
        }
    }
}
