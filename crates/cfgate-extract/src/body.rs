//! Body and query decoding.

use cfgate_core::{ApiError, RequestContext};
use serde::de::DeserializeOwned;

use crate::content_type::ContentType;
use crate::error::{classify, DecodeError};
use crate::query::KeyedPayload;
use crate::validate::Validate;

/// Default maximum body size (1 MB).
pub const DEFAULT_MAX_BODY_SIZE: usize = 1024 * 1024;

/// Whether fields absent from the target type are an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnknownFields {
    /// Reject the payload.
    #[default]
    Reject,
    /// Drop them silently.
    Ignore,
}

/// Decodes request payloads into typed values and validates them.
///
/// Cheap to copy; one instance is shared by all handlers.
///
/// # Example
///
/// ```rust
/// use cfgate_extract::{DecoderValidator, UnknownFields};
/// use serde::Deserialize;
///
/// #[derive(Debug, Deserialize)]
/// struct Foo {
///     foo: u32,
/// }
///
/// let decoder = DecoderValidator::new();
/// let body = br#"{"foo":1,"bar":"x"}"#;
///
/// let err = decoder
///     .decode::<Foo>("application/json", body, UnknownFields::Reject)
///     .unwrap_err();
/// assert!(err.to_string().contains("unknown field `bar`"));
///
/// let foo: Foo = decoder
///     .decode("application/json", body, UnknownFields::Ignore)
///     .unwrap();
/// assert_eq!(foo.foo, 1);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct DecoderValidator {
    max_body_size: usize,
}

impl Default for DecoderValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl DecoderValidator {
    /// Creates a decoder with the default body limit.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            max_body_size: DEFAULT_MAX_BODY_SIZE,
        }
    }

    /// Sets the body limit in bytes.
    #[must_use]
    pub const fn with_max_body_size(mut self, limit: usize) -> Self {
        self.max_body_size = limit;
        self
    }

    /// Configured body limit.
    #[must_use]
    pub const fn max_body_size(&self) -> usize {
        self.max_body_size
    }

    /// Decodes `body` according to `content_type`.
    ///
    /// # Errors
    ///
    /// Returns a classified [`DecodeError`]; see its docs for the mapping.
    pub fn decode<T>(
        &self,
        content_type: &str,
        body: &[u8],
        unknown_fields: UnknownFields,
    ) -> Result<T, DecodeError>
    where
        T: DeserializeOwned,
    {
        let content_type = ContentType::from_header(content_type)?;

        if body.len() > self.max_body_size {
            return Err(DecodeError::PayloadTooLarge {
                limit: self.max_body_size,
                actual: body.len(),
            });
        }

        match content_type {
            ContentType::Json => decode_json(body, unknown_fields),
            ContentType::Yaml => decode_yaml(body, unknown_fields),
        }
    }

    /// Takes the request body, decodes it, then runs [`Validate`].
    ///
    /// The body is moved out of `ctx` whatever the outcome, so it is
    /// consumed exactly once.
    ///
    /// # Errors
    ///
    /// The [`ApiError`] a decode or validation failure renders as.
    pub fn decode_and_validate<T>(
        &self,
        ctx: &mut RequestContext,
        unknown_fields: UnknownFields,
    ) -> Result<T, ApiError>
    where
        T: DeserializeOwned + Validate,
    {
        let body = ctx.take_body();
        let payload: T = self
            .decode(ctx.content_type(), &body, unknown_fields)
            .map_err(|err| reject(ctx, err))?;

        payload
            .validate()
            .map_err(|errors| reject(ctx, DecodeError::Invalid(errors)))?;

        Ok(payload)
    }

    /// Decodes and validates the query string of `ctx`.
    ///
    /// # Errors
    ///
    /// `CF-BadQueryParameter` for keys the payload does not support,
    /// `CF-MessageParseError` for values that do not decode and
    /// `CF-UnprocessableEntity` for validation failures.
    pub fn decode_and_validate_query<T>(&self, ctx: &RequestContext) -> Result<T, ApiError>
    where
        T: KeyedPayload + Validate,
    {
        let payload: T = crate::query::decode_query(ctx.uri().query().unwrap_or_default())
            .map_err(|err| reject(ctx, err))?;

        payload
            .validate()
            .map_err(|errors| reject(ctx, DecodeError::Invalid(errors)))?;

        Ok(payload)
    }
}

fn reject(ctx: &RequestContext, err: DecodeError) -> ApiError {
    tracing::debug!(
        correlation_id = %ctx.correlation_id(),
        method = %ctx.method(),
        path = ctx.uri().path(),
        error = %err,
        "payload rejected"
    );
    err.into()
}

fn decode_json<T: DeserializeOwned>(
    body: &[u8],
    unknown_fields: UnknownFields,
) -> Result<T, DecodeError> {
    let mut ignored = Vec::new();
    let mut track = |path: serde_ignored::Path<'_>| ignored.push(render_ignored(&path));

    let mut de = serde_json::Deserializer::from_slice(body);
    let value = serde_path_to_error::deserialize(serde_ignored::Deserializer::new(&mut de, &mut track))
        .map_err(|err| classify(field_path(err.path()).as_deref(), &err.inner().to_string()))?;
    de.end().map_err(|err| classify(None, &err.to_string()))?;

    check_ignored(unknown_fields, &ignored)?;
    Ok(value)
}

fn decode_yaml<T: DeserializeOwned>(
    body: &[u8],
    unknown_fields: UnknownFields,
) -> Result<T, DecodeError> {
    let mut ignored = Vec::new();
    let mut track = |path: serde_ignored::Path<'_>| ignored.push(render_ignored(&path));

    let de = serde_yaml::Deserializer::from_slice(body);
    let value = serde_path_to_error::deserialize(serde_ignored::Deserializer::new(de, &mut track))
        .map_err(|err| classify(field_path(err.path()).as_deref(), &err.inner().to_string()))?;

    check_ignored(unknown_fields, &ignored)?;
    Ok(value)
}

fn field_path(path: &serde_path_to_error::Path) -> Option<String> {
    let rendered = path.to_string();
    (rendered != ".").then_some(rendered)
}

/// Dotted path of an ignored key, skipping `Option` and newtype wrappers.
fn render_ignored(path: &serde_ignored::Path<'_>) -> String {
    use serde_ignored::Path;

    let join = |parent: &Path<'_>, segment: &str| {
        let parent = render_ignored(parent);
        if parent.is_empty() {
            segment.to_string()
        } else {
            format!("{parent}.{segment}")
        }
    };

    match path {
        Path::Root => String::new(),
        Path::Seq { parent, index } => join(parent, &index.to_string()),
        Path::Map { parent, key } => join(parent, key),
        Path::Some { parent } | Path::NewtypeStruct { parent } | Path::NewtypeVariant { parent } => {
            render_ignored(parent)
        }
    }
}

fn check_ignored(unknown_fields: UnknownFields, ignored: &[String]) -> Result<(), DecodeError> {
    match (unknown_fields, ignored.first()) {
        (UnknownFields::Reject, Some(path)) => {
            Err(DecodeError::UnknownField(format!("unknown field `{path}`")))
        }
        _ => Ok(()),
    }
}
