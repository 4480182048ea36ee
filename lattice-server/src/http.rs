use std::io::{BufRead, Read, Write};

use thiserror::Error;

/// Upper bound on the request line plus header block.
const MAX_HEADER_BYTES: usize = 8 * 1024;

/// Upper bound on a request body.
const MAX_BODY_BYTES: usize = 64 * 1024;

#[derive(Error, Debug)]
pub enum HttpError {
    #[error("Client closed the connection before sending a request")]
    Eof,
    #[error("Malformed request line")]
    BadRequestLine,
    #[error("Malformed header line")]
    BadHeader,
    #[error("Header block exceeds {MAX_HEADER_BYTES} bytes")]
    HeadersTooLarge,
    #[error("Invalid Content-Length")]
    BadContentLength,
    #[error("Body exceeds {MAX_BODY_BYTES} bytes")]
    BodyTooLarge,
    #[error("Connection error: {0}")]
    Io(#[from] std::io::Error),
}

/// One framed HTTP/1.1 request. Query string and body are kept raw;
/// decoding them is the router's concern.
#[derive(Debug)]
pub struct Request {
    pub method: String,
    pub path: String,
    pub query: String,
    pub body: Vec<u8>,
}

/// A response ready to be written: status code plus optional JSON body.
#[derive(Debug)]
pub struct Response {
    pub status: u16,
    pub body: Option<String>,
}

impl Response {
    pub fn json(status: u16, body: String) -> Self {
        Self {
            status,
            body: Some(body),
        }
    }

    pub fn empty(status: u16) -> Self {
        Self { status, body: None }
    }
}

/// Reads and frames one request from `reader`.
///
/// Accepts the request line, headers up to `MAX_HEADER_BYTES`, and a body of
/// up to `MAX_BODY_BYTES` when `Content-Length` is present. Header names
/// match case-insensitively.
pub fn read_request<R: BufRead>(reader: &mut R) -> Result<Request, HttpError> {
    let mut limited = reader.by_ref().take(MAX_HEADER_BYTES as u64);

    let request_line = read_crlf_line(&mut limited)?.ok_or(HttpError::Eof)?;
    let mut parts = request_line.split_whitespace();
    let method = parts.next().ok_or(HttpError::BadRequestLine)?.to_string();
    let target = parts.next().ok_or(HttpError::BadRequestLine)?.to_string();
    let version = parts.next().ok_or(HttpError::BadRequestLine)?;
    if !version.starts_with("HTTP/") {
        return Err(HttpError::BadRequestLine);
    }

    let mut content_length = 0usize;
    loop {
        let line = read_crlf_line(&mut limited)?.ok_or(HttpError::HeadersTooLarge)?;
        if line.is_empty() {
            break;
        }
        let (name, value) = line.split_once(':').ok_or(HttpError::BadHeader)?;
        if name.trim().eq_ignore_ascii_case("content-length") {
            content_length = value
                .trim()
                .parse()
                .map_err(|_| HttpError::BadContentLength)?;
        }
    }

    if content_length > MAX_BODY_BYTES {
        return Err(HttpError::BodyTooLarge);
    }

    let mut body = vec![0u8; content_length];
    if content_length > 0 {
        reader.read_exact(&mut body)?;
    }

    let (path, query) = match target.split_once('?') {
        Some((p, q)) => (p.to_string(), q.to_string()),
        None => (target, String::new()),
    };

    Ok(Request {
        method,
        path,
        query,
        body,
    })
}

/// Reads one CRLF-terminated line. `None` means the stream (or the header
/// budget) ran out before a terminator arrived.
fn read_crlf_line<R: BufRead>(reader: &mut R) -> Result<Option<String>, HttpError> {
    let mut buf = Vec::new();
    let n = reader.read_until(b'\n', &mut buf)?;
    if n == 0 || buf.last() != Some(&b'\n') {
        return Ok(None);
    }
    buf.pop();
    if buf.last() == Some(&b'\r') {
        buf.pop();
    }
    String::from_utf8(buf)
        .map(Some)
        .map_err(|_| HttpError::BadHeader)
}

/// Writes `response` with the service's CORS headers, one exchange per
/// connection.
pub fn write_response<W: Write>(writer: &mut W, response: &Response) -> std::io::Result<()> {
    write!(
        writer,
        "HTTP/1.1 {} {}\r\n",
        response.status,
        reason(response.status)
    )?;
    write!(writer, "Access-Control-Allow-Origin: *\r\n")?;
    write!(writer, "Access-Control-Allow-Methods: GET, POST, OPTIONS\r\n")?;
    write!(writer, "Access-Control-Allow-Headers: Content-Type\r\n")?;
    match &response.body {
        Some(body) => {
            write!(writer, "Content-Type: application/json\r\n")?;
            write!(writer, "Content-Length: {}\r\n", body.len())?;
        }
        None => write!(writer, "Content-Length: 0\r\n")?,
    }
    write!(writer, "Connection: close\r\n\r\n")?;
    if let Some(body) = &response.body {
        writer.write_all(body.as_bytes())?;
    }
    writer.flush()
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        400 => "Bad Request",
        404 => "Not Found",
        405 => "Method Not Allowed",
        413 => "Payload Too Large",
        431 => "Request Header Fields Too Large",
        500 => "Internal Server Error",
        _ => "Unknown",
    }
}
