pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliArgs;

pub use adapters::ReqwestTransport;
pub use config::FinderConfig;
pub use core::finder::MetadataFinder;
pub use core::source::{Provider, Source};
pub use domain::model::{Coordinate, Credential, CredentialSet, Dependency};
pub use domain::ports::{HttpRequest, HttpResponse, HttpTransport};
pub use utils::error::{FinderError, Result};
