use crate::domain::model::{CandidateField, Coordinate, FieldKind, ManifestDocument};
use quick_xml::events::Event;
use quick_xml::Reader;
use thiserror::Error;

/// Top-level sections whose scalars never feed property lookups or source links.
const SKIPPED_SECTIONS: &[&str] = &[
    "properties",
    "profiles",
    "dependencies",
    "dependencyManagement",
    "build",
    "reporting",
    "modules",
    "repositories",
    "pluginRepositories",
    "distributionManagement",
    "developers",
    "contributors",
];

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("malformed markup: {0}")]
    Malformed(String),
    #[error("root element is '{0}', expected 'project'")]
    NotAProject(String),
    #[error("document ended inside <{0}>")]
    Truncated(String),
}

/// Parses a manifest, treating any failure as "no usable manifest".
pub fn parse(bytes: &[u8]) -> Option<ManifestDocument> {
    match parse_document(bytes) {
        Ok(document) => Some(document),
        Err(e) => {
            tracing::debug!("Discarding manifest: {}", e);
            None
        }
    }
}

struct Open {
    name: String,
    has_child: bool,
}

pub fn parse_document(bytes: &[u8]) -> Result<ManifestDocument, ManifestError> {
    // Registries serve legacy encodings too; markup and URLs survive lossy decoding.
    let text = String::from_utf8_lossy(bytes);
    let text = text.trim_start_matches('\u{feff}');

    let mut document = ManifestDocument {
        raw: text.to_string(),
        ..Default::default()
    };
    let mut reader = Reader::from_str(text);
    let mut stack: Vec<Open> = Vec::new();
    let mut value = String::new();
    let mut saw_root = false;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| ManifestError::Malformed(e.to_string()))?;
        match event {
            Event::Start(e) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                open(&mut stack, &mut saw_root, &name)?;
                stack.push(Open {
                    name,
                    has_child: false,
                });
                value.clear();
            }
            Event::Empty(e) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                open(&mut stack, &mut saw_root, &name)?;
                stack.push(Open {
                    name,
                    has_child: false,
                });
                record(&mut document, &stack, "");
                stack.pop();
            }
            Event::Text(e) => {
                let unescaped = e
                    .unescape()
                    .map(|s| s.into_owned())
                    .unwrap_or_else(|_| String::from_utf8_lossy(&e).into_owned());
                value.push_str(&unescaped);
            }
            Event::CData(e) => {
                value.push_str(&String::from_utf8_lossy(&e.into_inner()));
            }
            Event::End(_) => {
                if stack.last().is_some_and(|open| !open.has_child) {
                    record(&mut document, &stack, value.trim());
                }
                value.clear();
                stack.pop();
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(ManifestError::Truncated(open.name.clone()));
    }
    if !saw_root {
        return Err(ManifestError::NotAProject(String::new()));
    }

    document.parent = parent_coordinate(&document);
    document.candidates = FieldKind::PRIORITY
        .iter()
        .filter_map(|&kind| {
            document
                .model
                .get(kind.model_path())
                .filter(|raw| !raw.is_empty())
                .map(|raw| CandidateField {
                    kind,
                    raw: raw.clone(),
                })
        })
        .collect();

    Ok(document)
}

fn open(stack: &mut [Open], saw_root: &mut bool, name: &str) -> Result<(), ManifestError> {
    match stack.last_mut() {
        Some(parent) => parent.has_child = true,
        None => {
            if *saw_root || name != "project" {
                return Err(ManifestError::NotAProject(name.to_string()));
            }
            *saw_root = true;
        }
    }
    Ok(())
}

fn record(document: &mut ManifestDocument, stack: &[Open], value: &str) {
    let path: Vec<&str> = stack.iter().map(|open| open.name.as_str()).collect();

    match path.as_slice() {
        ["project", "properties", key] => {
            document
                .properties
                .entry(key.to_string())
                .or_insert_with(|| value.to_string());
        }
        ["project", "profiles", "profile", "properties", key] => {
            document
                .profile_properties
                .entry(key.to_string())
                .or_insert_with(|| value.to_string());
        }
        ["project", section, ..] if !SKIPPED_SECTIONS.contains(section) => {
            if !value.is_empty() {
                document
                    .model
                    .entry(path[1..].join("."))
                    .or_insert_with(|| value.to_string());
            }
        }
        _ => {}
    }
}

fn parent_coordinate(document: &ManifestDocument) -> Option<Coordinate> {
    let field = |name: &str| {
        document
            .model
            .get(&format!("parent.{}", name))
            .filter(|v| !v.is_empty())
            .cloned()
    };
    Some(Coordinate::new(
        field("groupId")?,
        field("artifactId")?,
        field("version")?,
    ))
}
