use http::{
    header::{CONTENT_LENGTH, CONTENT_TYPE},
    HeaderValue, Method, Request, Response, StatusCode,
};

use crate::error::HttpParseError;

/// Longest request head accepted, request line plus headers
pub const MAX_HEAD_BYTES: usize = 64 * 1024;
/// Largest request body accepted
pub const MAX_BODY_BYTES: usize = 1024 * 1024 * 1024;

/// Position just past the blank line that ends the request head
pub fn find_head_end(buffer: &[u8]) -> Option<usize> {
    buffer
        .windows(4)
        .position(|window| window == b"\r\n\r\n")
        .map(|position| position + 4)
}

/// Parses a request head (request line and headers, no body).
pub fn try_bytes_to_request(head: &[u8]) -> Result<Request<()>, HttpParseError> {
    let text = std::str::from_utf8(head).map_err(|_| HttpParseError::InvalidEncoding)?;
    let mut lines = text.split("\r\n");

    let request_line = lines
        .next()
        .filter(|line| !line.is_empty())
        .ok_or(HttpParseError::MissingComponent {
            message_type: "request",
            component: "request line",
        })?;
    let mut parts = request_line.split_whitespace();
    let method = parts.next().ok_or(HttpParseError::MissingComponent {
        message_type: "request",
        component: "method",
    })?;
    let uri = parts.next().ok_or(HttpParseError::MissingComponent {
        message_type: "request",
        component: "path",
    })?;
    let method = Method::from_bytes(method.as_bytes()).map_err(|_| {
        HttpParseError::InvalidMethod {
            method: method.to_string(),
        }
    })?;

    let mut builder = Request::builder().method(method).uri(uri);
    for line in lines.take_while(|line| !line.is_empty()) {
        let (name, value) = line
            .split_once(':')
            .ok_or_else(|| HttpParseError::InvalidHeader {
                line: line.to_string(),
            })?;
        builder = builder.header(name.trim(), value.trim());
    }

    builder.body(()).map_err(|_| HttpParseError::RequestBuildFailed)
}

/// Declared body length, 0 when absent
pub fn content_length<T>(request: &Request<T>) -> Result<usize, HttpParseError> {
    let Some(value) = request.headers().get(CONTENT_LENGTH) else {
        return Ok(0);
    };
    let text = value.to_str().unwrap_or_default();
    let length: usize = text
        .trim()
        .parse()
        .map_err(|_| HttpParseError::InvalidContentLength {
            value: text.to_string(),
        })?;
    if length > MAX_BODY_BYTES {
        return Err(HttpParseError::BodyTooLarge {
            length,
            limit: MAX_BODY_BYTES,
        });
    }
    Ok(length)
}

/// Serializes a response, closing the connection after it.
pub fn response_to_bytes(response: &Response<Vec<u8>>) -> Vec<u8> {
    let status = response.status();
    let body = response.body();

    let mut head = format!(
        "HTTP/1.1 {} {}\r\n",
        status.as_u16(),
        status.canonical_reason().unwrap_or("Unknown")
    );
    for (name, value) in response.headers() {
        if name == CONTENT_LENGTH {
            continue;
        }
        head.push_str(name.as_str());
        head.push_str(": ");
        head.push_str(value.to_str().unwrap_or_default());
        head.push_str("\r\n");
    }
    head.push_str(&format!(
        "Content-Length: {}\r\nConnection: close\r\n\r\n",
        body.len()
    ));

    let mut bytes = head.into_bytes();
    bytes.extend_from_slice(body);
    bytes
}

pub fn respond(status: StatusCode, content_type: HeaderValue, body: Vec<u8>) -> Response<Vec<u8>> {
    let mut response = Response::new(body);
    *response.status_mut() = status;
    response.headers_mut().insert(CONTENT_TYPE, content_type);
    response
}

pub fn text_response(status: StatusCode, text: &str) -> Response<Vec<u8>> {
    respond(
        status,
        HeaderValue::from_static("text/plain"),
        text.as_bytes().to_vec(),
    )
}

pub fn binary_response(body: Vec<u8>) -> Response<Vec<u8>> {
    respond(
        StatusCode::OK,
        HeaderValue::from_static("application/octet-stream"),
        body,
    )
}
