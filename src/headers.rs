use axum::response::Response;
use http::{header, HeaderValue};

/// Builder for `Cache-Control` response directives.
#[derive(Debug, Default, Clone)]
pub struct CacheControl {
    no_cache: bool,
    no_store: bool,
    must_revalidate: bool,
    private: bool,
    max_age: Option<u32>,
}

impl CacheControl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn no_cache(mut self) -> Self {
        self.no_cache = true;
        self
    }

    pub fn no_store(mut self) -> Self {
        self.no_store = true;
        self
    }

    pub fn must_revalidate(mut self) -> Self {
        self.must_revalidate = true;
        self
    }

    pub fn private(mut self) -> Self {
        self.private = true;
        self
    }

    pub fn max_age(mut self, seconds: u32) -> Self {
        self.max_age = Some(seconds);
        self
    }

    fn to_header_value(&self) -> Option<HeaderValue> {
        let mut directives = Vec::new();
        if self.no_cache {
            directives.push("no-cache".to_string());
        }
        if self.no_store {
            directives.push("no-store".to_string());
        }
        if self.must_revalidate {
            directives.push("must-revalidate".to_string());
        }
        if self.private {
            directives.push("private".to_string());
        }
        if let Some(seconds) = self.max_age {
            directives.push(format!("max-age={seconds}"));
        }
        if directives.is_empty() {
            return None;
        }
        HeaderValue::from_str(&directives.join(", ")).ok()
    }

    /// Set the directives on a response. When caching is disabled a
    /// `Pragma: no-cache` header is added for HTTP/1.0 intermediaries.
    pub fn apply(&self, response: &mut Response) {
        if let Some(value) = self.to_header_value() {
            response.headers_mut().insert(header::CACHE_CONTROL, value);
        }
        if self.no_cache || self.no_store {
            response
                .headers_mut()
                .insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
        }
    }
}

/// Ready-made response cache policies.
pub mod presets {
    use super::CacheControl;

    /// Responses that must never be stored, such as token responses.
    pub fn no_store() -> CacheControl {
        CacheControl::new().no_cache().no_store().must_revalidate()
    }

    /// Short-lived responses private to the requesting client.
    pub fn private_cache(max_age_secs: u32) -> CacheControl {
        CacheControl::new().private().max_age(max_age_secs)
    }
}

/// `Cache-Control` directives sent by a client on a request.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ClientCacheControl {
    pub no_cache: bool,
    pub no_store: bool,
    pub max_age: Option<u32>,
}

impl ClientCacheControl {
    /// Parse a request header value. An absent or malformed header is
    /// treated as having no directives.
    pub fn from_header_value(value: Option<&HeaderValue>) -> Self {
        let Some(raw) = value.and_then(|v| v.to_str().ok()) else {
            return Self::default();
        };

        let mut parsed = Self::default();
        for directive in raw.split(',') {
            let directive = directive.trim().to_ascii_lowercase();
            match directive.as_str() {
                "no-cache" => parsed.no_cache = true,
                "no-store" => parsed.no_store = true,
                other => {
                    if let Some(seconds) = other.strip_prefix("max-age=") {
                        parsed.max_age = seconds.trim().parse().ok();
                    }
                }
            }
        }
        parsed
    }

    /// Whether a cached response may be served for this request.
    pub fn should_use_cache(&self) -> bool {
        !self.no_cache && !self.no_store && self.max_age != Some(0)
    }
}
