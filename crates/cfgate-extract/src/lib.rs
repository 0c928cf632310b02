//! # cfgate extract
//!
//! Turns request payloads into typed values.
//!
//! - [`ContentType`] picks JSON or YAML from the `Content-Type` header
//! - [`DecoderValidator`] decodes the body, optionally rejecting unknown
//!   fields, classifies failures and runs [`Validate`]
//! - [`KeyedPayload`] / [`decode_query`] decode query strings against a fixed
//!   key set
//!
//! Failures are [`DecodeError`]s, which convert into the client-facing
//! [`cfgate_core::ApiError`] taxonomy.

#![doc(html_root_url = "https://docs.rs/cfgate-extract/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod body;
mod content_type;
mod error;
mod query;
mod validate;

pub use body::{DecoderValidator, UnknownFields, DEFAULT_MAX_BODY_SIZE};
pub use content_type::ContentType;
pub use error::{DecodeError, INCORRECT_TYPE_DETAIL};
pub use query::{decode_query, KeyedPayload};
pub use validate::{FieldError, Validate, ValidationErrors};
