use crate::core::source::{Provider, Source};
use crate::domain::model::{Credential, CredentialSet};
use crate::domain::ports::{Authorization, HttpRequest, HttpResponse, HttpTransport};
use crate::utils::error::Result;
use serde::Deserialize;
use std::sync::Arc;
use url::Url;

const GITHUB_JSON: &str = "application/vnd.github+json";

#[derive(Debug, Deserialize)]
struct RepositoryInfo {
    default_branch: String,
}

#[derive(Debug, Deserialize)]
struct RefObject {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct GitRef {
    object: RefObject,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContentEntry {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl ContentEntry {
    pub fn is_dir(&self) -> bool {
        self.kind == "dir"
    }
}

enum Listing {
    Entries(Vec<ContentEntry>),
    RepoNotFound,
    Unavailable(String),
}

/// Narrows an inherited link to the artifact's directory inside a multi-artifact repository.
pub struct SourceDisambiguator<T: HttpTransport> {
    transport: Arc<T>,
    credentials: CredentialSet,
    api_url: Option<String>,
}

impl<T: HttpTransport> SourceDisambiguator<T> {
    pub fn new(transport: Arc<T>, credentials: CredentialSet, api_url: Option<String>) -> Self {
        Self {
            transport,
            credentials,
            api_url,
        }
    }

    /// Never fails: listing problems other than a missing repository keep `source`.
    pub async fn disambiguate(&self, source: Source, artifact: &str) -> Option<Source> {
        if source.provider != Provider::GitHub {
            tracing::debug!("No contents API for {}, keeping {}", source.hostname, source);
            return Some(source);
        }

        match self.list_root(&source).await {
            Listing::Entries(entries) => {
                let matched = entries.iter().find(|e| e.is_dir() && e.name == artifact);
                match matched {
                    Some(entry) => {
                        tracing::debug!("Found directory '{}' in {}", entry.name, source.repo);
                        Some(source.with_directory(entry.name.clone()))
                    }
                    None => {
                        tracing::debug!("{} has no directory for {}", source.repo, artifact);
                        None
                    }
                }
            }
            Listing::RepoNotFound => {
                tracing::debug!("Repository {} not found", source.repo);
                None
            }
            Listing::Unavailable(reason) => {
                tracing::warn!("Could not list {}: {}; keeping link", source.repo, reason);
                Some(source)
            }
        }
    }

    fn api_base(&self, source: &Source) -> String {
        self.api_url
            .clone()
            .unwrap_or_else(|| format!("https://api.{}", source.hostname))
            .trim_end_matches('/')
            .to_string()
    }

    fn authorization(&self, source: &Source) -> Option<Authorization> {
        match self.credentials.git_for_host(&source.hostname) {
            Some(Credential::GitHosting { password, .. }) => {
                Some(Authorization::Token(password.clone()))
            }
            _ => None,
        }
    }

    async fn get(&self, url: &str, source: &Source) -> Result<Option<HttpResponse>> {
        let Ok(url) = Url::parse(url) else {
            return Ok(None);
        };
        let request = HttpRequest::get(url)
            .with_authorization(self.authorization(source))
            .with_accept(GITHUB_JSON);
        self.transport.get(request).await.map(Some)
    }

    async fn list_root(&self, source: &Source) -> Listing {
        let base = format!("{}/repos/{}", self.api_base(source), source.repo);

        let repository: RepositoryInfo = match self.get_json(&base, source).await {
            Fetched::Ok(info) => info,
            Fetched::NotFound => return Listing::RepoNotFound,
            Fetched::Failed(reason) => return Listing::Unavailable(reason),
        };

        let refs_url = format!("{}/git/refs/heads/{}", base, repository.default_branch);
        let contents_url = match self.get_json::<GitRef>(&refs_url, source).await {
            Fetched::Ok(git_ref) => format!("{}/contents/?ref={}", base, git_ref.object.sha),
            Fetched::NotFound => {
                tracing::debug!("Branch {} not found, listing default ref", repository.default_branch);
                format!("{}/contents/", base)
            }
            Fetched::Failed(reason) => return Listing::Unavailable(reason),
        };

        match self.get_json(&contents_url, source).await {
            Fetched::Ok(entries) => Listing::Entries(entries),
            Fetched::NotFound => Listing::RepoNotFound,
            Fetched::Failed(reason) => Listing::Unavailable(reason),
        }
    }

    async fn get_json<D: serde::de::DeserializeOwned>(&self, url: &str, source: &Source) -> Fetched<D> {
        let response = match self.get(url, source).await {
            Ok(Some(response)) => response,
            Ok(None) => return Fetched::Failed(format!("invalid URL {}", url)),
            Err(e) => return Fetched::Failed(e.to_string()),
        };

        if response.status == 404 {
            return Fetched::NotFound;
        }
        if !response.is_success() {
            return Fetched::Failed(format!("HTTP {} from {}", response.status, url));
        }
        serde_json::from_slice(&response.body)
            .map(Fetched::Ok)
            .unwrap_or_else(|e| Fetched::Failed(format!("unexpected response from {}: {}", url, e)))
    }
}

enum Fetched<D> {
    Ok(D),
    NotFound,
    Failed(String),
}
