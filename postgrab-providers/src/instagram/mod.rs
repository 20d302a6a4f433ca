//! Instagram source implementation.
//!
//! Three strategies, tried in this order:
//!
//! - `instagram.browser`: renders the profile in headless Chromium
//! - `instagram.static`: parses the plain profile document
//! - `instagram.api`: reads the Graph API, only with a credential

mod api;
mod browser;
mod descriptor;
mod error;
pub mod parser;
pub mod selectors;
mod strategies;
mod web;

pub use api::{GraphApiClient, MediaItem, MediaListResponse};
pub use browser::InstagramBrowserScraper;
pub use descriptor::{build_instagram_pipeline, instagram_descriptor};
pub use error::InstagramError;
pub use parser::parse_profile_document;
pub use strategies::{InstagramApiStrategy, InstagramBrowserStrategy, InstagramStaticStrategy};
pub use web::{InstagramWebClient, ProfileDocument};
