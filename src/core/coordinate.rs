use crate::domain::model::{Coordinate, Dependency};
use crate::utils::error::{FinderError, Result};
use url::Url;

/// `{base}/{group as path}/{artifact}/{version}/{artifact}-{version}.{extension}`
pub fn document_url(base: &Url, coordinate: &Coordinate, extension: &str) -> Result<Url> {
    let raw = format!(
        "{}/{}/{}/{}/{}-{}.{}",
        base.as_str().trim_end_matches('/'),
        coordinate.group.replace('.', "/"),
        coordinate.artifact,
        coordinate.version,
        coordinate.artifact,
        coordinate.version,
        extension
    );
    Url::parse(&raw).map_err(|e| FinderError::InvalidUrl {
        url: raw,
        reason: e.to_string(),
    })
}

/// The registry declared by the dependency, or `default` when it declares
/// none or declares something that is not an http(s) URL.
pub fn registry_url(dependency: &Dependency, default: &str) -> Result<Url> {
    if let Some(declared) = dependency.declared_registry() {
        match Url::parse(declared) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => return Ok(url),
            _ => tracing::warn!(
                "Ignoring unusable registry '{}' declared by {}",
                declared,
                dependency.name
            ),
        }
    }

    Url::parse(default).map_err(|e| FinderError::InvalidUrl {
        url: default.to_string(),
        reason: e.to_string(),
    })
}
