//! Subscription key and bearer token handling

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};

use crate::error::{ApiError, Result};

/// Header carrying the API portal subscription key
pub const SUBSCRIPTION_KEY_HEADER: &str = "Ocp-Apim-Subscription-Key";

/// Credentials for one Artdatabanken API product
///
/// Each product (species information, observations) has its own
/// subscription key. An access token is only needed for user-scoped data.
#[derive(Clone)]
pub struct Credentials {
    subscription_key: String,
    access_token: Option<String>,
}

impl Credentials {
    pub fn new(subscription_key: impl Into<String>) -> Self {
        Self {
            subscription_key: subscription_key.into(),
            access_token: None,
        }
    }

    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    pub fn subscription_key(&self) -> &str {
        &self.subscription_key
    }

    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    /// Build the authentication headers sent with every request
    pub fn headers(&self) -> Result<HeaderMap> {
        if self.subscription_key.trim().is_empty() {
            return Err(ApiError::Config("API subscription key is empty".to_string()));
        }

        let mut headers = HeaderMap::new();
        let mut key = HeaderValue::from_str(&self.subscription_key).map_err(|_| {
            ApiError::Config("API subscription key is not a valid header value".to_string())
        })?;
        key.set_sensitive(true);
        headers.insert(SUBSCRIPTION_KEY_HEADER, key);

        if let Some(token) = self.access_token.as_deref().filter(|t| !t.is_empty()) {
            // The API portal expects the token wrapped in braces
            let mut bearer = HeaderValue::from_str(&format!("Bearer {{{}}}", token)).map_err(|_| {
                ApiError::Config("access token is not a valid header value".to_string())
            })?;
            bearer.set_sensitive(true);
            headers.insert(AUTHORIZATION, bearer);
        }

        Ok(headers)
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("subscription_key", &"<redacted>")
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}
