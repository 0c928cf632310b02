//! Successful handler output.

use http::header::{HeaderName, HeaderValue};
use http::StatusCode;
use serde::Serialize;

type Serializer = Box<dyn FnOnce() -> serde_json::Result<Vec<u8>> + Send>;

/// A JSON body whose serialisation is deferred to the response writer.
///
/// Deferring lets the writer log a serialisation failure after the status has
/// been committed instead of the handler having to deal with it. Output is
/// plain `serde_json`, which does not HTML-escape `<`, `>` or `&`.
pub struct JsonBody {
    serialize: Serializer,
}

impl JsonBody {
    /// Wraps a serialisable value.
    pub fn new<T>(value: T) -> Self
    where
        T: Serialize + Send + 'static,
    {
        Self {
            serialize: Box::new(move || serde_json::to_vec(&value)),
        }
    }

    /// Serialises the body.
    pub fn into_bytes(self) -> serde_json::Result<Vec<u8>> {
        (self.serialize)()
    }
}

impl std::fmt::Debug for JsonBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("JsonBody(..)")
    }
}

/// Status, headers and optional JSON body returned by a handler.
///
/// Headers may repeat and keep insertion order.
///
/// # Example
///
/// ```
/// use cfgate_core::ApiResponse;
/// use http::StatusCode;
///
/// let resp = ApiResponse::accepted()
///     .with_header("location", "https://api.example.com/v3/jobs/app.delete~a1")
///     .unwrap();
/// assert_eq!(resp.status(), StatusCode::ACCEPTED);
/// assert!(resp.body().is_none());
/// ```
#[derive(Debug)]
pub struct ApiResponse {
    status: StatusCode,
    headers: Vec<(HeaderName, HeaderValue)>,
    body: Option<JsonBody>,
}

impl ApiResponse {
    /// Creates a response with `status` and nothing else.
    #[must_use]
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: None,
        }
    }

    /// `200 OK` with a JSON body.
    pub fn ok<T>(body: T) -> Self
    where
        T: Serialize + Send + 'static,
    {
        Self::new(StatusCode::OK).with_body(body)
    }

    /// `201 Created` with a JSON body.
    pub fn created<T>(body: T) -> Self
    where
        T: Serialize + Send + 'static,
    {
        Self::new(StatusCode::CREATED).with_body(body)
    }

    /// `202 Accepted` with no body.
    #[must_use]
    pub fn accepted() -> Self {
        Self::new(StatusCode::ACCEPTED)
    }

    /// `204 No Content`.
    #[must_use]
    pub fn no_content() -> Self {
        Self::new(StatusCode::NO_CONTENT)
    }

    /// Sets the JSON body.
    #[must_use]
    pub fn with_body<T>(mut self, body: T) -> Self
    where
        T: Serialize + Send + 'static,
    {
        self.body = Some(JsonBody::new(body));
        self
    }

    /// Appends a header, keeping any existing values with the same name.
    ///
    /// # Errors
    ///
    /// Returns an error if the name or value is not a valid header.
    pub fn with_header(mut self, name: &str, value: &str) -> Result<Self, http::Error> {
        let name = HeaderName::try_from(name)?;
        let value = HeaderValue::try_from(value)?;
        self.headers.push((name, value));
        Ok(self)
    }

    /// Appends an already-validated header.
    #[must_use]
    pub fn with_typed_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.push((name, value));
        self
    }

    /// Status code.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Headers in insertion order.
    #[must_use]
    pub fn headers(&self) -> &[(HeaderName, HeaderValue)] {
        &self.headers
    }

    /// Body, if any.
    #[must_use]
    pub fn body(&self) -> Option<&JsonBody> {
        self.body.as_ref()
    }

    /// Splits the response into its parts.
    #[must_use]
    pub fn into_parts(self) -> (StatusCode, Vec<(HeaderName, HeaderValue)>, Option<JsonBody>) {
        (self.status, self.headers, self.body)
    }
}
