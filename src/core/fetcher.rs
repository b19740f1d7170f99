use crate::domain::model::Credential;
use crate::domain::ports::{Authorization, HttpRequest, HttpTransport};
use crate::utils::error::{FinderError, Result};
use std::sync::Arc;
use url::Url;

/// Fetches registry documents. `Ok(None)` means "not there"; `Err` means the
/// registry could not be asked.
pub struct DocumentFetcher<T: HttpTransport> {
    transport: Arc<T>,
    max_redirects: u32,
}

impl<T: HttpTransport> DocumentFetcher<T> {
    pub fn new(transport: Arc<T>, max_redirects: u32) -> Self {
        Self {
            transport,
            max_redirects,
        }
    }

    pub async fn fetch(&self, url: &Url, credential: Option<&Credential>) -> Result<Option<Vec<u8>>> {
        let authorization = credential.and_then(basic_auth);
        let auth_origin = url.origin();

        let mut current = url.clone();
        let mut hops = 0;
        loop {
            // Scheme, host and port must all match before credentials go out again.
            let same_origin = current.origin() == auth_origin;
            let applied = if same_origin { authorization.clone() } else { None };
            let with_auth = applied.is_some();

            let mut response = self
                .transport
                .get(HttpRequest::get(current.clone()).with_authorization(applied))
                .await?;

            if with_auth && response.is_auth_failure() {
                tracing::debug!(
                    "{} rejected credentials ({}), retrying without them",
                    current,
                    response.status
                );
                response = self.transport.get(HttpRequest::get(current.clone())).await?;
                if response.is_auth_failure() {
                    return Err(FinderError::AuthenticationFailed {
                        url: current.to_string(),
                        status: response.status,
                    });
                }
            }

            if response.is_success() {
                return Ok(Some(response.body));
            }

            if response.is_redirect() {
                let Some(location) = response.location.as_deref() else {
                    tracing::warn!("{} redirected without a Location header", current);
                    return Ok(None);
                };
                if hops >= self.max_redirects {
                    tracing::warn!("Too many redirects fetching {}", url);
                    return Ok(None);
                }
                current = match current.join(location) {
                    Ok(next) => next,
                    Err(e) => {
                        tracing::warn!("Bad redirect target '{}' from {}: {}", location, current, e);
                        return Ok(None);
                    }
                };
                hops += 1;
                tracing::debug!("Following redirect to {}", current);
                continue;
            }

            tracing::debug!("{} not available (HTTP {})", current, response.status);
            return Ok(None);
        }
    }
}

fn basic_auth(credential: &Credential) -> Option<Authorization> {
    match credential {
        Credential::Registry {
            username: Some(username),
            password,
            ..
        } => Some(Authorization::Basic {
            username: username.clone(),
            password: password.clone(),
        }),
        _ => None,
    }
}
