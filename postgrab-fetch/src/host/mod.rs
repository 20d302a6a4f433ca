//! Host APIs for retrieval strategies.
//!
//! - [`http`] - HTTP client with tracing and domain allowlist
//! - [`browser`] - Headless browser sessions

pub mod browser;
pub mod http;

pub use browser::{
    BrowserLauncher, BrowserSession, ChromiumLauncher, DomElement, ReadyState, SessionProfile,
    Viewport,
};
pub use http::{HttpClient, ResponseExt};
