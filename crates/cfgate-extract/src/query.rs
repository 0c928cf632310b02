//! Query string payloads.

use serde::de::DeserializeOwned;

use crate::error::DecodeError;

/// A payload decoded from the query string that accepts a fixed key set.
///
/// Any key outside [`supported_keys`](KeyedPayload::supported_keys) is
/// rejected before decoding, so list endpoints fail loudly on typos.
///
/// # Example
///
/// ```rust
/// use cfgate_extract::KeyedPayload;
/// use serde::Deserialize;
///
/// #[derive(Debug, Deserialize)]
/// struct AppList {
///     names: Option<String>,
/// }
///
/// impl KeyedPayload for AppList {
///     fn supported_keys() -> &'static [&'static str] {
///         &["names"]
///     }
/// }
///
/// let list: AppList = cfgate_extract::decode_query("names=a,b").unwrap();
/// assert_eq!(list.names.as_deref(), Some("a,b"));
/// assert!(cfgate_extract::decode_query::<AppList>("nmes=a").is_err());
/// ```
pub trait KeyedPayload: DeserializeOwned {
    /// Keys the endpoint accepts.
    fn supported_keys() -> &'static [&'static str];
}

/// Decodes a raw query string into `T`.
///
/// # Errors
///
/// [`DecodeError::UnknownKey`] for an unsupported key and
/// [`DecodeError::Malformed`] when the values do not fit `T`.
pub fn decode_query<T: KeyedPayload>(query: &str) -> Result<T, DecodeError> {
    let pairs: Vec<(String, String)> =
        serde_urlencoded::from_str(query).map_err(|err| DecodeError::Malformed(err.to_string()))?;

    let supported = T::supported_keys();
    if let Some((key, _)) = pairs.iter().find(|(key, _)| !supported.contains(&key.as_str())) {
        return Err(DecodeError::UnknownKey {
            key: key.clone(),
            supported: supported.iter().map(|k| (*k).to_string()).collect(),
        });
    }

    serde_urlencoded::from_str(query).map_err(|err| DecodeError::Malformed(err.to_string()))
}
