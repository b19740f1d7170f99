use regex::Regex;
use std::fmt;
use std::sync::LazyLock;
use url::Url;

static SOURCE_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?x)
        (?:^|[\s:/@>(\x22'])
        (?:www\.)?
        (?P<host>github\.com|gitlab\.com|bitbucket\.org)
        [/:]
        (?P<owner>[A-Za-z0-9_.\-]+)
        /
        (?P<name>[A-Za-z0-9_.\-]+)
        (?:/(?:tree|blob|src)/[^/\s]+/(?P<dir>[^\s?\#<\x22']+))?
        ",
    )
    .expect("valid source regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Provider {
    GitHub,
    GitLab,
    Bitbucket,
}

impl Provider {
    fn from_host(host: &str) -> Option<Self> {
        match host {
            "github.com" => Some(Provider::GitHub),
            "gitlab.com" => Some(Provider::GitLab),
            "bitbucket.org" => Some(Provider::Bitbucket),
            _ => None,
        }
    }
}

/// A repository on a known hosting platform, optionally narrowed to a directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Source {
    pub provider: Provider,
    pub hostname: String,
    /// `owner/name`
    pub repo: String,
    pub directory: Option<String>,
}

impl Source {
    /// Recognises the first hosting URL in `text`, in any of the shapes
    /// manifests use (`https://`, `git@host:`, `scm:git:`, `git://`).
    pub fn from_url(text: &str) -> Option<Source> {
        SOURCE_URL.captures(text.trim()).and_then(|caps| Self::from_captures(&caps))
    }

    /// Every hosting URL mentioned anywhere in `text`.
    pub fn scan(text: &str) -> Vec<Source> {
        SOURCE_URL
            .captures_iter(text)
            .filter_map(|caps| Self::from_captures(&caps))
            .collect()
    }

    fn from_captures(caps: &regex::Captures<'_>) -> Option<Source> {
        let hostname = caps.name("host")?.as_str().to_string();
        let provider = Provider::from_host(&hostname)?;
        let owner = caps.name("owner")?.as_str();
        let name = caps.name("name")?.as_str();
        let name = name.strip_suffix(".git").unwrap_or(name).trim_end_matches('.');
        if owner.is_empty() || name.is_empty() || name.contains("${") {
            return None;
        }

        let directory = caps
            .name("dir")
            .map(|d| d.as_str().trim_end_matches('/').to_string())
            .filter(|d| !d.is_empty());

        Some(Source {
            provider,
            hostname,
            repo: format!("{}/{}", owner, name),
            directory,
        })
    }

    pub fn name(&self) -> &str {
        self.repo.rsplit('/').next().unwrap_or(&self.repo)
    }

    pub fn matches_artifact(&self, artifact: &str) -> bool {
        self.name().eq_ignore_ascii_case(artifact)
    }

    pub fn with_directory(mut self, directory: impl Into<String>) -> Self {
        self.directory = Some(directory.into());
        self
    }

    pub fn url(&self) -> String {
        format!("https://{}/{}", self.hostname, self.repo)
    }

    pub fn url_with_directory(&self) -> String {
        match &self.directory {
            None => self.url(),
            Some(dir) => {
                let segment = match self.provider {
                    Provider::Bitbucket => "src",
                    Provider::GitHub | Provider::GitLab => "tree",
                };
                format!("{}/{}/HEAD/{}", self.url(), segment, dir)
            }
        }
    }

    /// The resolved URL handed back to callers.
    pub fn to_url(&self) -> Option<Url> {
        Url::parse(&self.url_with_directory()).ok()
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url_with_directory())
    }
}
