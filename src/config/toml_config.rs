use crate::domain::model::{Credential, CredentialSet};
use crate::utils::error::{FinderError, Result};
use crate::utils::validation::{
    validate_non_empty_string, validate_positive_number, validate_range, validate_url, Validate,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::LazyLock;

pub const CENTRAL_REGISTRY_URL: &str = "https://repo.maven.apache.org/maven2";

static ENV_VAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("valid env var regex"));

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FinderConfig {
    pub default_registry_url: String,
    pub manifest_extension: String,
    pub max_redirects: u32,
    pub max_parent_depth: u32,
    pub request_timeout_seconds: u64,
    pub user_agent: String,
    /// Overrides `https://api.<host>` for the repository contents API.
    pub hosting_api_url: Option<String>,
    pub credentials: Vec<Credential>,
}

impl Default for FinderConfig {
    fn default() -> Self {
        Self {
            default_registry_url: CENTRAL_REGISTRY_URL.to_string(),
            manifest_extension: "pom".to_string(),
            max_redirects: 5,
            max_parent_depth: 8,
            request_timeout_seconds: 30,
            user_agent: concat!("maven-source-finder/", env!("CARGO_PKG_VERSION")).to_string(),
            hosting_api_url: None,
            credentials: Vec::new(),
        }
    }
}

impl FinderConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(FinderError::Io)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        let config: Self =
            toml::from_str(&processed_content).map_err(|e| FinderError::ConfigValidationError {
                field: "toml_parsing".to_string(),
                message: format!("TOML parsing error: {}", e),
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Substitutes `${VAR}` from the environment (e.g. `${GITHUB_TOKEN}`); unset variables are left as-is.
    fn substitute_env_vars(content: &str) -> String {
        ENV_VAR
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .into_owned()
    }

    pub fn credential_set(&self) -> CredentialSet {
        CredentialSet::new(self.credentials.clone())
    }
}

impl Validate for FinderConfig {
    fn validate(&self) -> Result<()> {
        validate_url("default_registry_url", &self.default_registry_url)?;
        validate_non_empty_string("manifest_extension", &self.manifest_extension)?;
        validate_range("max_redirects", self.max_redirects, 1, 20)?;
        validate_range("max_parent_depth", self.max_parent_depth, 1, 32)?;
        validate_positive_number("request_timeout_seconds", self.request_timeout_seconds, 1)?;
        validate_non_empty_string("user_agent", &self.user_agent)?;

        if let Some(api) = &self.hosting_api_url {
            validate_url("hosting_api_url", api)?;
        }

        for credential in &self.credentials {
            match credential {
                Credential::Registry { url, .. } => validate_url("credentials.url", url)?,
                Credential::GitHosting { host, password, .. } => {
                    validate_non_empty_string("credentials.host", host)?;
                    validate_non_empty_string("credentials.password", password)?;
                }
            }
        }

        Ok(())
    }
}
