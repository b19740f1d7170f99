use crate::utils::error::Result;
use async_trait::async_trait;
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Authorization {
    Basic {
        username: String,
        password: Option<String>,
    },
    /// Sent as `Authorization: token <value>`.
    Token(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub url: Url,
    pub authorization: Option<Authorization>,
    pub accept: Option<String>,
}

impl HttpRequest {
    pub fn get(url: Url) -> Self {
        Self {
            url,
            authorization: None,
            accept: None,
        }
    }

    pub fn with_authorization(mut self, authorization: Option<Authorization>) -> Self {
        self.authorization = authorization;
        self
    }

    pub fn with_accept(mut self, accept: impl Into<String>) -> Self {
        self.accept = Some(accept.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub location: Option<String>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_redirect(&self) -> bool {
        (300..400).contains(&self.status)
    }

    pub fn is_auth_failure(&self) -> bool {
        self.status == 401 || self.status == 403
    }
}

/// Issues a single GET without following redirects.
///
/// Implementations return `Ok` for every HTTP status and reserve `Err` for
/// failures where no status was received (DNS, connect, timeout, TLS).
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn get(&self, request: HttpRequest) -> Result<HttpResponse>;
}
