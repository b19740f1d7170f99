use crate::domain::model::ManifestDocument;
use regex::Regex;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::LazyLock;

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^${}]+)\}").expect("valid placeholder regex"));

/// Substitution may assemble new placeholders (`${a${b}}`); re-expand a bounded number of times.
const MAX_PASSES: usize = 8;

/// Source links are short; anything longer is a runaway expansion.
const MAX_EXPANDED_LEN: usize = 8 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Unresolved {
    /// No definition for this name in any layer of the scope.
    Missing(String),
    /// The name refers back to itself, directly or transitively.
    Cycle(String),
    /// Expanding the name produced more than `MAX_EXPANDED_LEN` bytes.
    Overflow(String),
}

pub trait PropertySource {
    fn lookup(&self, name: &str) -> Option<&str>;
}

impl PropertySource for ManifestDocument {
    fn lookup(&self, name: &str) -> Option<&str> {
        let model_path = name
            .strip_prefix("project.")
            .or_else(|| name.strip_prefix("pom."));

        if let Some(path) = model_path {
            let inherited = match path {
                "groupId" => Some("parent.groupId"),
                "version" => Some("parent.version"),
                _ => None,
            };
            let value = self
                .model
                .get(path)
                .or_else(|| inherited.and_then(|p| self.model.get(p)));
            if let Some(value) = value {
                return Some(value.as_str());
            }
        }

        self.properties
            .get(name)
            .or_else(|| model_path.and_then(|p| self.properties.get(p)))
            .or_else(|| self.profile_properties.get(name))
            .map(String::as_str)
    }
}

impl PropertySource for HashMap<String, String> {
    fn lookup(&self, name: &str) -> Option<&str> {
        self.get(name).map(String::as_str)
    }
}

/// A manifest followed by its ancestors; the first layer defining a name wins.
pub struct PropertyScope<'a> {
    layers: &'a [Arc<ManifestDocument>],
}

impl<'a> PropertyScope<'a> {
    pub fn new(layers: &'a [Arc<ManifestDocument>]) -> Self {
        Self { layers }
    }
}

impl PropertySource for PropertyScope<'_> {
    fn lookup(&self, name: &str) -> Option<&str> {
        self.layers.iter().find_map(|layer| layer.lookup(name))
    }
}

pub fn has_placeholders(raw: &str) -> bool {
    PLACEHOLDER.is_match(raw)
}

/// Replaces every `${name}` in `raw`, recursively, until none remain.
pub fn resolve<S: PropertySource + ?Sized>(raw: &str, source: &S) -> Result<String, Unresolved> {
    let mut current = raw.to_string();
    for _ in 0..MAX_PASSES {
        if !has_placeholders(&current) {
            return Ok(current);
        }
        let mut expander = Expander {
            source,
            visiting: Vec::new(),
            resolved: HashMap::new(),
        };
        current = expander.expand(&current, None)?;
    }

    let name = PLACEHOLDER
        .captures(&current)
        .map(|caps| caps[1].to_string())
        .unwrap_or(current);
    Err(Unresolved::Cycle(name))
}

/// One expansion pass; each name is expanded at most once.
struct Expander<'s, S: PropertySource + ?Sized> {
    source: &'s S,
    visiting: Vec<String>,
    resolved: HashMap<String, String>,
}

impl<S: PropertySource + ?Sized> Expander<'_, S> {
    fn expand(&mut self, raw: &str, owner: Option<&str>) -> Result<String, Unresolved> {
        let mut out = String::with_capacity(raw.len());
        let mut last = 0;

        for caps in PLACEHOLDER.captures_iter(raw) {
            let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let name = name.as_str().trim();
            let expanded = self.expand_name(name)?;

            out.push_str(&raw[last..whole.start()]);
            out.push_str(&expanded);
            last = whole.end();
            if out.len() > MAX_EXPANDED_LEN {
                return Err(Unresolved::Overflow(owner.unwrap_or(name).to_string()));
            }
        }

        out.push_str(&raw[last..]);
        if out.len() > MAX_EXPANDED_LEN {
            return Err(Unresolved::Overflow(owner.unwrap_or_default().to_string()));
        }
        Ok(out)
    }

    fn expand_name(&mut self, name: &str) -> Result<String, Unresolved> {
        if let Some(done) = self.resolved.get(name) {
            return Ok(done.clone());
        }
        if self.visiting.iter().any(|v| v == name) {
            return Err(Unresolved::Cycle(name.to_string()));
        }
        let source = self.source;
        let value = source
            .lookup(name)
            .ok_or_else(|| Unresolved::Missing(name.to_string()))?;

        self.visiting.push(name.to_string());
        let expanded = self.expand(value, Some(name))?;
        self.visiting.pop();

        self.resolved.insert(name.to_string(), expanded.clone());
        Ok(expanded)
    }
}
