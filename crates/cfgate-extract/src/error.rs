//! Decode error types and their mapping into the client taxonomy.

use cfgate_core::ApiError;
use thiserror::Error;

/// Why a request payload could not be turned into a typed value.
///
/// Every variant converts into exactly one [`ApiError`]:
///
/// | Variant | Renders as |
/// |---|---|
/// | `UnsupportedContentType` | `CF-InvalidRequest` (400) |
/// | `PayloadTooLarge` | `CF-InvalidRequest` (400) |
/// | `TypeMismatch` | `CF-UnprocessableEntity` (422), `"<Field> must be a <Type>"` |
/// | `IncorrectType` | `CF-UnprocessableEntity` (422) |
/// | `MissingField` | `CF-UnprocessableEntity` (422), `"<Field> is a required field"` |
/// | `UnknownField` | `CF-UnprocessableEntity` (422), `"invalid request body: <msg>"` |
/// | `Invalid` | `CF-UnprocessableEntity` (422), field messages |
/// | `UnknownKey` | `CF-BadQueryParameter` (400) |
/// | `Malformed` | `CF-MessageParseError` (400) |
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The `Content-Type` is not JSON or a YAML alias.
    #[error("Unsupported Content-Type: {0}")]
    UnsupportedContentType(String),

    /// The body exceeds the configured limit.
    #[error("request body too large: max {limit} bytes, got {actual} bytes")]
    PayloadTooLarge {
        /// Configured limit.
        limit: usize,
        /// Actual body size.
        actual: usize,
    },

    /// A field holds a value of the wrong type.
    #[error("{field} must be a {expected}")]
    TypeMismatch {
        /// Title-cased field path, e.g. `Name` or `Lifecycle.data`.
        field: String,
        /// Expected type as the decoder names it, e.g. `string`.
        expected: String,
        /// Raw decoder message, for logs.
        message: String,
    },

    /// A value had the wrong type somewhere that could not be attributed to a
    /// field, e.g. the document root.
    #[error("incorrect data type: {0}")]
    IncorrectType(String),

    /// A required field is absent.
    #[error("{field} is a required field")]
    MissingField {
        /// Title-cased field path, e.g. `Name` or `Lifecycle.type`.
        field: String,
    },

    /// A field is not part of the target schema.
    #[error("invalid request body: {0}")]
    UnknownField(String),

    /// The payload decoded but failed semantic validation.
    #[error("{0}")]
    Invalid(#[from] crate::validate::ValidationErrors),

    /// A query parameter is not accepted by the endpoint.
    #[error("unsupported query parameter: {key}")]
    UnknownKey {
        /// The offending key.
        key: String,
        /// Keys the endpoint accepts.
        supported: Vec<String>,
    },

    /// Anything else: syntax errors, truncated input, bad encodings.
    #[error("malformed payload: {0}")]
    Malformed(String),
}

/// Client-visible message for [`DecodeError::IncorrectType`].
pub const INCORRECT_TYPE_DETAIL: &str =
    "invalid request body: the request body contains an incorrect data type";

impl From<DecodeError> for ApiError {
    fn from(err: DecodeError) -> Self {
        match err {
            DecodeError::UnsupportedContentType(_) | DecodeError::PayloadTooLarge { .. } => {
                let detail = err.to_string();
                ApiError::invalid_request(detail).with_cause(err)
            }
            DecodeError::TypeMismatch { .. }
            | DecodeError::MissingField { .. }
            | DecodeError::UnknownField(_)
            | DecodeError::Invalid(_) => {
                let detail = err.to_string();
                ApiError::unprocessable(detail).with_cause(err)
            }
            DecodeError::IncorrectType(_) => {
                ApiError::unprocessable(INCORRECT_TYPE_DETAIL).with_cause(err)
            }
            DecodeError::UnknownKey { supported, .. } => ApiError::unknown_key(supported),
            DecodeError::Malformed(_) => ApiError::message_parse(err),
        }
    }
}

/// Sorts a raw serde message into a [`DecodeError`].
///
/// `path` is the location the decoder reached, `None` at the document root.
/// Checks run in priority order: attributable type mismatch, any other type
/// error, missing field, unknown field, then everything else.
pub(crate) fn classify(path: Option<&str>, message: &str) -> DecodeError {
    let message = strip_position(message);

    if let Some(rest) = message.find("invalid type: ").map(|i| &message[i..]) {
        return match (path, expected_type(rest)) {
            (Some(field), Some(expected)) => DecodeError::TypeMismatch {
                field: title_case(field),
                expected,
                message: message.to_string(),
            },
            _ => DecodeError::IncorrectType(message.to_string()),
        };
    }

    if message.contains("invalid value: ") || message.contains("invalid length ") {
        return DecodeError::IncorrectType(message.to_string());
    }

    if let Some(name) = missing_field(message) {
        let field = match path {
            Some(parent) => format!("{parent}.{name}"),
            None => name.to_string(),
        };
        return DecodeError::MissingField {
            field: title_case(&field),
        };
    }

    if let Some(i) = message.find("unknown field") {
        return DecodeError::UnknownField(message[i..].to_string());
    }

    DecodeError::Malformed(message.to_string())
}

fn strip_position(message: &str) -> &str {
    message
        .rsplit_once(" at line ")
        .map_or(message, |(head, _)| head)
}

fn missing_field(message: &str) -> Option<&str> {
    let (_, rest) = message.split_once("missing field `")?;
    rest.split_once('`').map(|(name, _)| name)
}

fn expected_type(message: &str) -> Option<String> {
    let (_, expected) = message.rsplit_once(", expected ")?;
    let expected = expected
        .strip_prefix("a ")
        .or_else(|| expected.strip_prefix("an "))
        .unwrap_or(expected);
    Some(expected.trim().to_string())
}

fn title_case(field: &str) -> String {
    let mut chars = field.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
