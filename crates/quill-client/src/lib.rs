//! Client side of Quill's token protocol.
//!
//! [`ApiClient`] is the interception layer every authenticated request goes
//! through. It attaches the stored access token; when the server answers
//! with the "JWT expired" signal it refreshes the token once (one refresh
//! in flight no matter how many requests hit the signal together),
//! retries the original request once, and hands the caller only the final
//! answer. If the refresh itself is refused, stored credentials are wiped
//! and the [`SignOut`] hook fires.

mod client;
mod credentials;
mod error;

pub use client::{ApiClient, ApiResponse};
pub use credentials::{CredentialStore, Credentials, MemoryCredentials, SignOut};
pub use error::ClientError;
