//! Content negotiation.

use crate::error::DecodeError;

/// Media types the body decoder understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    /// `application/json`, also the default when no type is declared.
    Json,
    /// `application/x-yaml`, `text/x-yaml` or `text/yaml`.
    Yaml,
}

impl ContentType {
    /// Picks a decoder from a `Content-Type` header value.
    ///
    /// Media type parameters such as `charset` are ignored and the match is
    /// case-insensitive.
    ///
    /// # Errors
    ///
    /// [`DecodeError::UnsupportedContentType`] for anything but JSON or YAML.
    ///
    /// # Example
    ///
    /// ```
    /// use cfgate_extract::ContentType;
    ///
    /// assert_eq!(ContentType::from_header("").unwrap(), ContentType::Json);
    /// assert_eq!(
    ///     ContentType::from_header("application/json; charset=utf-8").unwrap(),
    ///     ContentType::Json
    /// );
    /// assert_eq!(ContentType::from_header("text/yaml").unwrap(), ContentType::Yaml);
    /// assert!(ContentType::from_header("text/plain").is_err());
    /// ```
    pub fn from_header(value: &str) -> Result<Self, DecodeError> {
        let media_type = value
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        match media_type.as_str() {
            "" | "application/json" => Ok(Self::Json),
            "application/x-yaml" | "text/x-yaml" | "text/yaml" => Ok(Self::Yaml),
            _ => Err(DecodeError::UnsupportedContentType(value.to_string())),
        }
    }

    /// Canonical media type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::Yaml => "application/x-yaml",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yaml_aliases() {
        for value in ["application/x-yaml", "text/x-yaml", "text/yaml", "Text/YAML"] {
            assert_eq!(ContentType::from_header(value).unwrap(), ContentType::Yaml);
        }
    }

    #[test]
    fn test_unsupported_names_the_type() {
        for value in ["text/plain", "application/xml", "multipart/form-data; boundary=x"] {
            let err = ContentType::from_header(value).unwrap_err();
            assert_eq!(err.to_string(), format!("Unsupported Content-Type: {value}"));
        }
    }
}
