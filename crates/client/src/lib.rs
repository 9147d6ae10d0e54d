//! `weknora-client`: the request/response pipeline every API call goes through.
//!
//! Outbound, each request gets the auth and tenant headers derived from the
//! current session plus a fresh correlation id. Inbound, 200/201 payloads are
//! handed back unchanged and everything else becomes an [`ErrorEnvelope`].
//! A 401 outside of login clears the session and sends the user to the login
//! surface once.

pub mod config;
pub mod context;
pub mod guard;
pub mod normalize;
pub mod pipeline;
pub mod stream;
pub mod upload;

pub use config::{ClientConfig, ConfigError};
pub use context::{ContextResolver, DerivedHeaders};
pub use guard::{GuardState, Navigator, SessionGuard, TracingNavigator};
pub use pipeline::{HttpClient, RequestOptions, ResponseKind};
pub use stream::EventStream;
pub use upload::{ProgressCallback, UploadForm, UploadProgress};

pub use weknora_core::{ApiResult, ErrorEnvelope, ErrorKind};
