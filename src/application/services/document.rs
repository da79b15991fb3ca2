//! Document persistence service
//!
//! Reads and writes keyed documents as JSON or YAML through the filesystem trait.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::application::{ApplicationError, ApplicationResult, CodecResultExt, IoResultExt};
use crate::config::Options;
use crate::domain::{assign_keys, from_document, to_document, Document, NodeId, TreeArena};
use crate::infrastructure::traits::FileSystem;

/// Node payload as stored in documents.
pub type Payload = serde_json::Value;

/// Document with the tool's payload and option types.
pub type StoredDocument = Document<Payload, Options>;

/// Text encoding of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    Json,
    Yaml,
}

impl DocumentFormat {
    /// Format named by the file extension, if any.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "json" => Some(Self::Json),
            "yaml" | "yml" => Some(Self::Yaml),
            _ => None,
        }
    }

    /// Fails for YAML when the document nests deeper than serde_yaml reads back.
    pub fn encode(self, doc: &StoredDocument) -> Result<String, String> {
        match self {
            Self::Json => serde_json::to_string_pretty(doc).map_err(|e| e.to_string()),
            Self::Yaml => {
                let nesting = yaml_nesting(doc);
                if nesting > YAML_MAX_NESTING {
                    return Err(format!(
                        "nesting depth {} exceeds the YAML limit of {}, save as JSON instead",
                        nesting, YAML_MAX_NESTING
                    ));
                }
                serde_yaml::to_string(doc).map_err(|e| e.to_string())
            }
        }
    }

    /// JSON documents of any depth decode; the stack grows on demand.
    pub fn decode(self, text: &str) -> Result<StoredDocument, String> {
        match self {
            Self::Json => {
                let mut de = serde_json::Deserializer::from_str(text);
                de.disable_recursion_limit();
                let doc = StoredDocument::deserialize(serde_stacker::Deserializer::new(&mut de))
                    .map_err(|e| e.to_string())?;
                de.end().map_err(|e| e.to_string())?;
                Ok(doc)
            }
            Self::Yaml => serde_yaml::from_str(text).map_err(|e| e.to_string()),
        }
    }
}

/// Deepest nesting written as YAML, below serde_yaml's recursion limit of 128.
const YAML_MAX_NESTING: usize = 120;

/// Nesting of `doc` once encoded: the top-level map, then a map and a
/// sequence per tree level, or a payload below the data map.
fn yaml_nesting(doc: &StoredDocument) -> usize {
    let structure = 1 + 2 * doc.structure.depth();
    let payload = 2 + doc.data.values().map(value_depth).max().unwrap_or(0);
    structure.max(payload)
}

fn value_depth(value: &Payload) -> usize {
    match value {
        Payload::Array(items) => 1 + items.iter().map(value_depth).max().unwrap_or(0),
        Payload::Object(map) => 1 + map.values().map(value_depth).max().unwrap_or(0),
        _ => 0,
    }
}

/// A tree read from a document.
#[derive(Debug, Clone)]
pub struct LoadedDocument {
    pub tree: TreeArena<Payload>,
    pub root: NodeId,
    pub options: Options,
}

impl LoadedDocument {
    /// Document key of every node.
    pub fn keys(&self) -> BTreeMap<String, NodeId> {
        assign_keys(&self.tree, self.root)
            .into_iter()
            .map(|(idx, key)| (key, idx))
            .collect()
    }
}

/// Service loading and saving tree documents.
pub struct DocumentService {
    fs: Arc<dyn FileSystem>,
    fallback: DocumentFormat,
}

impl DocumentService {
    /// `fallback` is used for paths whose extension names no format.
    pub fn new(fs: Arc<dyn FileSystem>, fallback: DocumentFormat) -> Self {
        Self { fs, fallback }
    }

    pub fn format_for(&self, path: &Path) -> DocumentFormat {
        DocumentFormat::from_path(path).unwrap_or(self.fallback)
    }

    pub fn exists(&self, path: &Path) -> bool {
        self.fs.exists(path)
    }

    #[instrument(level = "debug", skip(self))]
    pub fn load(&self, path: &Path) -> ApplicationResult<LoadedDocument> {
        let text = self
            .fs
            .read_to_string(path)
            .with_path_context("read document", path)?;
        let doc = self
            .format_for(path)
            .decode(&text)
            .with_document_context(path)?;
        doc.options.validate()?;

        let (tree, root, options) = from_document(doc)?;
        debug!("Loaded {} nodes from {}", tree.len(), path.display());
        Ok(LoadedDocument {
            tree,
            root,
            options,
        })
    }

    #[instrument(level = "debug", skip(self, tree, options))]
    pub fn save(
        &self,
        path: &Path,
        tree: &TreeArena<Payload>,
        root: NodeId,
        options: &Options,
    ) -> ApplicationResult<()> {
        let doc = to_document(tree, root, options.clone())?;
        let text = self
            .format_for(path)
            .encode(&doc)
            .with_document_context(path)?;
        self.fs
            .ensure_parent(path)
            .with_path_context("create directory", path)?;
        self.fs
            .write(path, &text)
            .with_path_context("write document", path)?;
        debug!("Saved {} nodes to {}", doc.data.len(), path.display());
        Ok(())
    }

    /// Writes a document holding a single root node.
    pub fn create(&self, path: &Path, root_id: &str, options: &Options) -> ApplicationResult<()> {
        if self.fs.exists(path) {
            return Err(ApplicationError::InvalidEdit(format!(
                "{} already exists",
                path.display()
            )));
        }
        let mut tree = TreeArena::new();
        let root = tree.insert_node(root_id, Payload::Null, None)?;
        self.save(path, &tree, root, options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::traits::MemoryFileSystem;
    use std::path::PathBuf;

    fn service() -> DocumentService {
        DocumentService::new(Arc::new(MemoryFileSystem::new()), DocumentFormat::Json)
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(
            DocumentFormat::from_path(Path::new("tree.YML")),
            Some(DocumentFormat::Yaml)
        );
        assert_eq!(DocumentFormat::from_path(Path::new("tree")), None);
        assert_eq!(service().format_for(Path::new("tree.txt")), DocumentFormat::Json);
    }

    #[test]
    fn test_create_then_load() {
        let service = service();
        let path = PathBuf::from("/docs/tree.yaml");
        service.create(&path, "the root", &Options::default()).unwrap();
        assert!(service.create(&path, "again", &Options::default()).is_err());

        let loaded = service.load(&path).unwrap();
        assert_eq!(loaded.tree.len(), 1);
        assert_eq!(loaded.tree.node(loaded.root).unwrap().id, "the root");
        assert_eq!(loaded.options, Options::default());
    }

    #[test]
    fn test_deep_payload_is_not_written_as_yaml() {
        let service = service();
        let path = PathBuf::from("/docs/deep.yaml");
        let mut payload = Payload::Null;
        for _ in 0..YAML_MAX_NESTING {
            payload = Payload::Array(vec![payload]);
        }
        let mut tree = TreeArena::new();
        let root = tree.insert_node("root", payload, None).unwrap();

        let result = service.save(&path, &tree, root, &Options::default());

        assert!(matches!(result, Err(ApplicationError::Document { .. })));
        assert!(!service.exists(&path));
        assert!(service
            .save(Path::new("/docs/deep.json"), &tree, root, &Options::default())
            .is_ok());
    }

    #[test]
    fn test_load_rejects_out_of_range_options() {
        let fs = Arc::new(MemoryFileSystem::new());
        let path = PathBuf::from("bad.json");
        fs.write(
            &path,
            r#"{"data": {"r": null}, "structure": {"r": []}, "options": {"graph": {"radius": -1}}}"#,
        )
        .unwrap();
        let service = DocumentService::new(fs, DocumentFormat::Json);
        assert!(matches!(
            service.load(&path),
            Err(ApplicationError::Validation { .. })
        ));
    }
}
