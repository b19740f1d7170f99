use crate::utils::error::{FinderError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use url::Url;

/// A `{group, artifact, version}` triple identifying one manifest in a registry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coordinate {
    pub group: String,
    pub artifact: String,
    pub version: String,
}

impl Coordinate {
    pub fn new(
        group: impl Into<String>,
        artifact: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            group: group.into(),
            artifact: artifact.into(),
            version: version.into(),
        }
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group, self.artifact, self.version)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequirementSource {
    #[serde(rename = "type")]
    pub kind: String,
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requirement {
    pub file: String,
    pub source: Option<RequirementSource>,
}

/// A dependency as declared by a project. `name` is `group:artifact`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub requirements: Vec<Requirement>,
}

impl Dependency {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            requirements: Vec::new(),
        }
    }

    pub fn with_registry(mut self, registry_url: impl Into<String>) -> Self {
        self.requirements.push(Requirement {
            file: "pom.xml".to_string(),
            source: Some(RequirementSource {
                kind: "maven_repo".to_string(),
                url: Some(registry_url.into()),
            }),
        });
        self
    }

    pub fn coordinate(&self) -> Result<Coordinate> {
        let invalid = |reason: &str| FinderError::InvalidDependency {
            name: self.name.clone(),
            reason: reason.to_string(),
        };

        let (group, artifact) = self
            .name
            .split_once(':')
            .ok_or_else(|| invalid("expected group:artifact"))?;
        if group.is_empty() || artifact.is_empty() || artifact.contains(':') {
            return Err(invalid("expected group:artifact"));
        }
        if self.version.trim().is_empty() {
            return Err(invalid("version is empty"));
        }

        Ok(Coordinate::new(group, artifact, self.version.trim()))
    }

    /// First registry URL declared by any requirement, if present.
    pub fn declared_registry(&self) -> Option<&str> {
        self.requirements
            .iter()
            .filter_map(|r| r.source.as_ref())
            .find_map(|s| s.url.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Credential {
    #[serde(rename = "maven_repository")]
    Registry {
        url: String,
        username: Option<String>,
        password: Option<String>,
    },
    #[serde(rename = "git_source")]
    GitHosting {
        host: String,
        username: Option<String>,
        password: String,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CredentialSet {
    items: Vec<Credential>,
}

impl CredentialSet {
    pub fn new(items: Vec<Credential>) -> Self {
        Self { items }
    }

    /// Registry credential whose URL equals `base_url` or is a path prefix of it.
    pub fn registry_for(&self, base_url: &Url) -> Option<&Credential> {
        let base = base_url.as_str().trim_end_matches('/');
        self.items.iter().find(|c| match c {
            Credential::Registry { url, .. } => {
                let url = url.trim_end_matches('/');
                base == url || base.starts_with(&format!("{}/", url))
            }
            Credential::GitHosting { .. } => false,
        })
    }

    pub fn git_for_host(&self, host: &str) -> Option<&Credential> {
        self.items.iter().find(|c| match c {
            Credential::GitHosting { host: h, .. } => h.eq_ignore_ascii_case(host),
            Credential::Registry { .. } => false,
        })
    }
}

/// Where a candidate source field was found in a manifest, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    ProjectUrl,
    ScmUrl,
    ScmConnection,
    ScmDeveloperConnection,
    IssueManagementUrl,
}

impl FieldKind {
    pub const PRIORITY: [FieldKind; 5] = [
        FieldKind::ProjectUrl,
        FieldKind::ScmUrl,
        FieldKind::ScmConnection,
        FieldKind::ScmDeveloperConnection,
        FieldKind::IssueManagementUrl,
    ];

    /// Dotted model path below `project`.
    pub fn model_path(self) -> &'static str {
        match self {
            FieldKind::ProjectUrl => "url",
            FieldKind::ScmUrl => "scm.url",
            FieldKind::ScmConnection => "scm.connection",
            FieldKind::ScmDeveloperConnection => "scm.developerConnection",
            FieldKind::IssueManagementUrl => "issueManagement.url",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateField {
    pub kind: FieldKind,
    pub raw: String,
}

/// Parsed manifest. Built once per fetch and never mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManifestDocument {
    pub properties: HashMap<String, String>,
    pub profile_properties: HashMap<String, String>,
    /// Scalar elements below `project`, keyed by dotted path (`scm.url`, `parent.version`).
    pub model: HashMap<String, String>,
    pub parent: Option<Coordinate>,
    pub candidates: Vec<CandidateField>,
    pub raw: String,
}
