//! Client identity pool.
//!
//! Each retrieval picks one realistic desktop browser identity at random and
//! presents it consistently: the same user agent and headers are used for
//! every request of that call, and for the headless browser's session.

use rand::seq::SliceRandom;
use reqwest::header::{
    ACCEPT, ACCEPT_LANGUAGE, CACHE_CONTROL, HeaderMap, HeaderName, HeaderValue, USER_AGENT,
};

/// A browser identity presented to the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIdentity {
    /// User-Agent header value.
    pub user_agent: &'static str,
    /// Accept-Language header value.
    pub accept_language: &'static str,
    /// `sec-ch-ua-platform` value, if the browser sends client hints.
    pub platform_hint: Option<&'static str>,
}

const ACCEPT_HTML: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8";

/// The fixed identity pool.
pub const IDENTITIES: &[ClientIdentity] = &[
    ClientIdentity {
        user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
        accept_language: "en-US,en;q=0.9",
        platform_hint: Some("\"Windows\""),
    },
    ClientIdentity {
        user_agent: "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
        accept_language: "en-US,en;q=0.9",
        platform_hint: Some("\"macOS\""),
    },
    ClientIdentity {
        user_agent: "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Safari/605.1.15",
        accept_language: "en-GB,en;q=0.9",
        platform_hint: None,
    },
    ClientIdentity {
        user_agent: "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36",
        accept_language: "en-US,en;q=0.8",
        platform_hint: Some("\"Linux\""),
    },
    ClientIdentity {
        user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:125.0) Gecko/20100101 Firefox/125.0",
        accept_language: "en-US,en;q=0.5",
        platform_hint: None,
    },
];

/// Picks an identity uniformly at random.
pub fn random_identity() -> &'static ClientIdentity {
    IDENTITIES
        .choose(&mut rand::thread_rng())
        .unwrap_or(&IDENTITIES[0])
}

impl ClientIdentity {
    /// Returns the request headers for this identity.
    pub fn to_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(self.user_agent));
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_HTML));
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_static(self.accept_language),
        );
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
        if let Some(platform) = self.platform_hint {
            headers.insert(
                HeaderName::from_static("sec-ch-ua-platform"),
                HeaderValue::from_static(platform),
            );
            headers.insert(
                HeaderName::from_static("sec-ch-ua-mobile"),
                HeaderValue::from_static("?0"),
            );
        }
        headers
    }

    /// Returns the extra headers a browser session should send.
    ///
    /// The user agent is set separately through the browser override.
    pub fn extra_browser_headers(&self) -> Vec<(String, String)> {
        vec![(
            "Accept-Language".to_string(),
            self.accept_language.to_string(),
        )]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_identity_from_pool() {
        for _ in 0..10 {
            let identity = random_identity();
            assert!(IDENTITIES.contains(identity));
        }
    }

    #[test]
    fn test_headers_carry_user_agent() {
        let identity = &IDENTITIES[0];
        let headers = identity.to_headers();
        assert_eq!(headers[USER_AGENT], identity.user_agent);
        assert!(headers.contains_key("sec-ch-ua-platform"));

        let firefox = &IDENTITIES[4];
        assert!(!firefox.to_headers().contains_key("sec-ch-ua-platform"));
    }
}
