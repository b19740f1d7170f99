use crate::config::FinderConfig;
use crate::core::coordinate::{document_url, registry_url};
use crate::core::disambiguator::SourceDisambiguator;
use crate::core::fetcher::DocumentFetcher;
use crate::core::manifest;
use crate::core::properties::{resolve, PropertyScope, Unresolved};
use crate::core::source::Source;
use crate::domain::model::{Coordinate, CredentialSet, Dependency, ManifestDocument};
use crate::domain::ports::HttpTransport;
use crate::utils::error::{FinderError, Result};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::OnceCell;
use url::Url;

/// Finds the source repository for one dependency.
///
/// The lookup runs at most once per finder: the first successful call to
/// [`MetadataFinder::source`] stores its answer (including "no source") and
/// every later call returns it without touching the network. Concurrent first
/// calls share a single run; a run that errors or is dropped stores nothing.
pub struct MetadataFinder<T: HttpTransport> {
    dependency: Dependency,
    credentials: CredentialSet,
    config: FinderConfig,
    transport: Arc<T>,
    resolved: OnceCell<Option<Source>>,
}

impl<T: HttpTransport> MetadataFinder<T> {
    pub fn new(
        dependency: Dependency,
        credentials: CredentialSet,
        config: FinderConfig,
        transport: Arc<T>,
    ) -> Self {
        Self {
            dependency,
            credentials,
            config,
            transport,
            resolved: OnceCell::new(),
        }
    }

    pub async fn source(&self) -> Result<Option<&Source>> {
        let source = self
            .resolved
            .get_or_try_init(|| async {
                let source = self.look_up_source().await?;
                match &source {
                    Some(found) => tracing::info!("{}: source {}", self.dependency.name, found),
                    None => tracing::info!("{}: no source found", self.dependency.name),
                }
                Ok::<_, FinderError>(source)
            })
            .await?;
        Ok(source.as_ref())
    }

    pub async fn source_url(&self) -> Result<Option<Url>> {
        Ok(self.source().await?.and_then(Source::to_url))
    }

    async fn look_up_source(&self) -> Result<Option<Source>> {
        let coordinate = self.dependency.coordinate()?;
        let registry = registry_url(&self.dependency, &self.config.default_registry_url)?;
        let artifact = coordinate.artifact.clone();
        let mut run = ResolutionRun::new(self, registry);

        let mut current = coordinate;
        let mut depth = 0;
        let mut visited = HashSet::new();

        loop {
            if !visited.insert(current.clone()) {
                tracing::warn!("Parent cycle at {} while resolving {}", current, self.dependency.name);
                return Ok(None);
            }

            let Some(document) = run.manifest(&current).await? else {
                tracing::debug!("No usable manifest for {}", current);
                return Ok(None);
            };

            if let Some(source) = run.source_in_manifest(&current, &document, &artifact).await? {
                if depth == 0 || source.matches_artifact(&artifact) {
                    return Ok(Some(source));
                }
                tracing::debug!(
                    "Inherited link {} does not name {}, checking repository contents",
                    source,
                    artifact
                );
                return Ok(self.disambiguator().disambiguate(source, &artifact).await);
            }

            match &document.parent {
                Some(parent) if depth < self.config.max_parent_depth => {
                    tracing::debug!("{} has no source link, trying parent {}", current, parent);
                    current = parent.clone();
                    depth += 1;
                }
                Some(parent) => {
                    tracing::warn!("Parent chain too deep at {}, stopping", parent);
                    return Ok(None);
                }
                None => return Ok(None),
            }
        }
    }

    fn disambiguator(&self) -> SourceDisambiguator<T> {
        SourceDisambiguator::new(
            self.transport.clone(),
            self.credentials.clone(),
            self.config.hosting_api_url.clone(),
        )
    }
}

/// State for a single pipeline run: every manifest is fetched at most once.
struct ResolutionRun<'f, T: HttpTransport> {
    finder: &'f MetadataFinder<T>,
    fetcher: DocumentFetcher<T>,
    registry: Url,
    manifests: HashMap<Coordinate, Option<Arc<ManifestDocument>>>,
}

impl<'f, T: HttpTransport> ResolutionRun<'f, T> {
    fn new(finder: &'f MetadataFinder<T>, registry: Url) -> Self {
        Self {
            fetcher: DocumentFetcher::new(finder.transport.clone(), finder.config.max_redirects),
            finder,
            registry,
            manifests: HashMap::new(),
        }
    }

    async fn manifest(&mut self, coordinate: &Coordinate) -> Result<Option<Arc<ManifestDocument>>> {
        if let Some(cached) = self.manifests.get(coordinate) {
            return Ok(cached.clone());
        }

        let url = document_url(&self.registry, coordinate, &self.finder.config.manifest_extension)?;
        let credential = self.finder.credentials.registry_for(&self.registry);
        let document = self
            .fetcher
            .fetch(&url, credential)
            .await?
            .and_then(|bytes| manifest::parse(&bytes))
            .map(Arc::new);

        self.manifests.insert(coordinate.clone(), document.clone());
        Ok(document)
    }

    /// First candidate field that resolves to a hosting URL, else any hosting
    /// URL in the document that names the artifact.
    async fn source_in_manifest(
        &mut self,
        coordinate: &Coordinate,
        document: &Arc<ManifestDocument>,
        artifact: &str,
    ) -> Result<Option<Source>> {
        let mut layers = vec![document.clone()];
        let mut visited = HashSet::from([coordinate.clone()]);

        for candidate in &document.candidates {
            let resolved = loop {
                let attempt = resolve(&candidate.raw, &PropertyScope::new(&layers));
                match attempt {
                    Ok(value) => break Some(value),
                    Err(Unresolved::Missing(name)) => {
                        if !self.push_ancestor(&mut layers, &mut visited).await? {
                            tracing::debug!("Property '{}' undefined for {:?}", name, candidate.kind);
                            break None;
                        }
                    }
                    Err(Unresolved::Cycle(name)) => {
                        tracing::debug!("Property '{}' is cyclic", name);
                        break None;
                    }
                    Err(Unresolved::Overflow(name)) => {
                        tracing::warn!("Property '{}' expands without bound in {}", name, coordinate);
                        break None;
                    }
                }
            };

            if let Some(source) = resolved.as_deref().and_then(Source::from_url) {
                tracing::debug!("{} declares {} via {:?}", coordinate, source, candidate.kind);
                return Ok(Some(source));
            }
        }

        Ok(Source::scan(&document.raw)
            .into_iter()
            .find(|source| source.matches_artifact(artifact)))
    }

    /// Adds the next ancestor of the outermost layer to the property scope.
    async fn push_ancestor(
        &mut self,
        layers: &mut Vec<Arc<ManifestDocument>>,
        visited: &mut HashSet<Coordinate>,
    ) -> Result<bool> {
        if layers.len() > self.finder.config.max_parent_depth as usize {
            return Ok(false);
        }
        let Some(parent) = layers.last().and_then(|layer| layer.parent.clone()) else {
            return Ok(false);
        };
        if !visited.insert(parent.clone()) {
            return Ok(false);
        }
        match self.manifest(&parent).await? {
            Some(document) => {
                layers.push(document);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
