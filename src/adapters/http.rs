use crate::config::FinderConfig;
use crate::domain::ports::{Authorization, HttpRequest, HttpResponse, HttpTransport};
use crate::utils::error::Result;
use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION, LOCATION};
use reqwest::{redirect, Client};
use std::time::Duration;

/// `HttpTransport` backed by reqwest. Redirects are surfaced, not followed.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(config: &FinderConfig) -> Result<Self> {
        let client = Client::builder()
            .redirect(redirect::Policy::none())
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(&self, request: HttpRequest) -> Result<HttpResponse> {
        let mut builder = self.client.get(request.url.clone());

        match &request.authorization {
            Some(Authorization::Basic { username, password }) => {
                builder = builder.basic_auth(username, password.as_deref());
            }
            Some(Authorization::Token(token)) => {
                builder = builder.header(AUTHORIZATION, format!("token {}", token));
            }
            None => {}
        }
        if let Some(accept) = &request.accept {
            builder = builder.header(ACCEPT, accept);
        }

        tracing::debug!("GET {}", request.url);
        let response = builder.send().await?;
        let status = response.status().as_u16();
        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.bytes().await?.to_vec();
        tracing::debug!("GET {} -> {}", request.url, status);

        Ok(HttpResponse {
            status,
            location,
            body,
        })
    }
}
