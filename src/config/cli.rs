use crate::config::toml_config::FinderConfig;
use crate::domain::model::{Credential, Dependency};
use crate::utils::error::Result;
use crate::utils::validation::{validate_url, Validate};
use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(name = "source-finder")]
#[command(about = "Find the source repository of a Maven dependency")]
pub struct CliArgs {
    /// Dependency name in the form group:artifact
    pub dependency: String,

    #[arg(long = "version", short = 'V')]
    pub dependency_version: String,

    /// Registry the dependency was resolved from (defaults to the configured registry)
    #[arg(long)]
    pub registry: Option<String>,

    #[arg(long, help = "Path to a TOML configuration file")]
    pub config: Option<String>,

    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub github_token: Option<String>,

    #[arg(long, env = "REGISTRY_USERNAME")]
    pub registry_username: Option<String>,

    #[arg(long, env = "REGISTRY_PASSWORD", hide_env_values = true)]
    pub registry_password: Option<String>,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub json_logs: bool,
}

impl CliArgs {
    pub fn load_config(&self) -> Result<FinderConfig> {
        let mut config = match &self.config {
            Some(path) => FinderConfig::from_file(path)?,
            None => FinderConfig::default(),
        };

        if let Some(token) = &self.github_token {
            config.credentials.push(Credential::GitHosting {
                host: "github.com".to_string(),
                username: Some("x-access-token".to_string()),
                password: token.clone(),
            });
        }

        if let Some(username) = &self.registry_username {
            let url = self
                .registry
                .clone()
                .unwrap_or_else(|| config.default_registry_url.clone());
            config.credentials.push(Credential::Registry {
                url,
                username: Some(username.clone()),
                password: self.registry_password.clone(),
            });
        }

        config.validate()?;
        Ok(config)
    }

    pub fn dependency(&self) -> Dependency {
        let dependency = Dependency::new(self.dependency.clone(), self.dependency_version.clone());
        match &self.registry {
            Some(url) => dependency.with_registry(url.clone()),
            None => dependency,
        }
    }
}

impl Validate for CliArgs {
    fn validate(&self) -> Result<()> {
        self.dependency().coordinate()?;
        if let Some(registry) = &self.registry {
            validate_url("registry", registry)?;
        }
        Ok(())
    }
}
