//! Static profile page client.

use postgrab_core::{PostRecord, TargetConfig};
use postgrab_fetch::{
    ArtifactKind, FetchContext, HttpError, ResponseExt, RetryDecision, random_identity,
};
use std::time::Duration;
use tracing::{debug, instrument, warn};

use super::error::InstagramError;
use super::parser::parse_profile_document;

/// A fetched profile document.
#[derive(Debug)]
pub struct ProfileDocument {
    /// Raw response body.
    pub body: String,
    /// Attempts it took.
    pub attempts: u32,
    /// Waits taken between attempts.
    pub delays: Vec<Duration>,
}

/// Fetches and parses the public profile page over plain HTTP.
#[derive(Debug, Default, Clone, Copy)]
pub struct InstagramWebClient;

impl InstagramWebClient {
    /// Creates a new client.
    pub fn new() -> Self {
        Self
    }

    /// Downloads the profile page, retrying transient failures.
    ///
    /// One identity is picked per call and reused for every attempt.
    #[instrument(skip(self, ctx, target), fields(profile = %target.identifier()))]
    pub async fn fetch_document(
        &self,
        ctx: &FetchContext,
        target: &TargetConfig,
    ) -> Result<ProfileDocument, InstagramError> {
        let url = target.profile_url(&ctx.settings.profile_base_url);
        let identity = random_identity();
        let request_timeout = ctx.settings.request_timeout;

        let outcome = ctx
            .settings
            .retry
            .execute(
                |attempt| {
                    let url = url.as_str();
                    let headers = identity.to_headers();
                    async move {
                        debug!(attempt, "Requesting profile page");
                        let response = ctx
                            .http
                            .get_with_headers(url, headers, Some(request_timeout))
                            .await?
                            .check_status()?;
                        let body = response.text().await.map_err(HttpError::Request)?;
                        Ok::<_, HttpError>(body)
                    }
                },
                |err: &HttpError| {
                    if err.is_transient() {
                        RetryDecision::Retry {
                            floor: err.retry_after(),
                        }
                    } else {
                        RetryDecision::Stop
                    }
                },
            )
            .await;

        match outcome.result {
            Ok(body) => Ok(ProfileDocument {
                body,
                attempts: outcome.attempts,
                delays: outcome.delays,
            }),
            Err(last_error) if last_error.is_transient() => {
                warn!(attempts = outcome.attempts, error = %last_error, "Profile fetch retries exhausted");
                Err(InstagramError::RetriesExhausted {
                    attempts: outcome.attempts,
                    last_error,
                })
            }
            Err(e) => Err(InstagramError::Http(e)),
        }
    }

    /// Downloads and parses the profile page into the latest post.
    pub async fn fetch_latest(
        &self,
        ctx: &FetchContext,
        target: &TargetConfig,
    ) -> Result<PostRecord, InstagramError> {
        let document = self.fetch_document(ctx, target).await?;
        debug!(
            attempts = document.attempts,
            bytes = document.body.len(),
            "Profile page downloaded"
        );

        parse_profile_document(&document.body).inspect_err(|e| {
            debug!(error = %e, "Profile page did not parse");
            if ctx.artifacts.enabled() {
                ctx.artifacts
                    .write(ArtifactKind::StaticMarkup, document.body.as_bytes());
            }
        })
    }
}
