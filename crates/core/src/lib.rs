//! `weknora-core`: shared contract types for the client layer.
//!
//! This crate holds the caller-facing error envelope and the identifiers that
//! travel on every request. It has no transport or storage concerns.

pub mod error;
pub mod id;

pub use error::{
    ApiResult, ErrorEnvelope, ErrorKind, LOGIN_REJECTED_MESSAGE, NETWORK_ERROR_MESSAGE,
    SESSION_EXPIRED_MESSAGE,
};
pub use id::{RequestId, TenantId};
