pub mod coordinate;
pub mod disambiguator;
pub mod fetcher;
pub mod finder;
pub mod manifest;
pub mod properties;
pub mod source;

pub use crate::domain::model::{Coordinate, Credential, CredentialSet, Dependency, ManifestDocument};
pub use crate::domain::ports::HttpTransport;
pub use crate::utils::error::Result;
