/// HTTP status codes the server emits.
///
/// - `Ok` (200): File or script output follows
/// - `NotFound` (404): Nothing servable at the target
/// - `InternalServerError` (500): Open, stat, pipe or spawn failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    /// 200 OK
    Ok,
    /// 404 Not Found
    NotFound,
    /// 500 Internal Server Error
    InternalServerError,
}

const HTTP_VERSION: &str = "HTTP/1.1";

const NOT_FOUND_BODY: &str = "<html><body>\
<h1>404 Not Found</h1>\
<p>The requested resource could not be found on this server.</p>\
</body></html>";

const SERVER_ERROR_BODY: &str = "<html><body>\
<h1>500 Internal Server Error</h1>\
<p>The server encountered an error while processing your request.</p>\
</body></html>";

impl StatusCode {
    /// Returns the numeric HTTP status code.
    ///
    /// # Example
    ///
    /// ```
    /// # use porter::http::response::StatusCode;
    /// assert_eq!(StatusCode::Ok.as_u16(), 200);
    /// assert_eq!(StatusCode::NotFound.as_u16(), 404);
    /// ```
    pub fn as_u16(&self) -> u16 {
        match self {
            StatusCode::Ok => 200,
            StatusCode::NotFound => 404,
            StatusCode::InternalServerError => 500,
        }
    }

    /// Returns the standard HTTP reason phrase for this status code.
    pub fn reason_phrase(&self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::NotFound => "Not Found",
            StatusCode::InternalServerError => "Internal Server Error",
        }
    }
}

/// Status line plus the only headers the server ever sends.
///
/// Serialized in a fixed order: `Content-Type`, optional `Content-Length`,
/// `Connection: close`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseHead {
    pub status: StatusCode,
    pub content_type: String,
    /// Omitted for script output and canned pages
    pub content_length: Option<u64>,
}

impl ResponseHead {
    pub fn ok(content_type: impl Into<String>, content_length: Option<u64>) -> Self {
        Self {
            status: StatusCode::Ok,
            content_type: content_type.into(),
            content_length,
        }
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut head = format!(
            "{} {} {}\r\nContent-Type: {}\r\n",
            HTTP_VERSION,
            self.status.as_u16(),
            self.status.reason_phrase(),
            self.content_type,
        );

        if let Some(len) = self.content_length {
            head.push_str(&format!("Content-Length: {len}\r\n"));
        }

        head.push_str("Connection: close\r\n\r\n");
        head.into_bytes()
    }
}

/// Full bytes of a canned error page: head and constant HTML body.
///
/// `Ok` has no canned page and yields an empty-bodied 200.
pub fn canned(status: StatusCode) -> Vec<u8> {
    let body = match status {
        StatusCode::NotFound => NOT_FOUND_BODY,
        StatusCode::InternalServerError => SERVER_ERROR_BODY,
        StatusCode::Ok => "",
    };

    let mut bytes = ResponseHead {
        status,
        content_type: "text/html".to_string(),
        content_length: None,
    }
    .serialize();
    bytes.extend_from_slice(body.as_bytes());
    bytes
}
