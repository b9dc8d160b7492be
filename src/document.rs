//! Document state management

use std::collections::HashMap;

use tower_lsp::lsp_types::Url;

/// Represents the state of a text document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// The document text content
    pub text: String,
    /// The document version
    pub version: i32,
}

impl Document {
    /// Create a new document with the given text and version
    pub fn new(text: String, version: i32) -> Self {
        Self { text, version }
    }
}

/// Open documents keyed by URI.
///
/// Updates carrying an older version than the stored one are ignored, so
/// the newest snapshot always wins regardless of arrival order.
#[derive(Debug, Default)]
pub struct DocumentStore {
    documents: HashMap<Url, Document>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a snapshot; returns `false` if it is older than the current one
    pub fn upsert(&mut self, uri: Url, document: Document) -> bool {
        match self.documents.get(&uri) {
            Some(current) if current.version > document.version => false,
            _ => {
                self.documents.insert(uri, document);
                true
            }
        }
    }

    pub fn get(&self, uri: &Url) -> Option<&Document> {
        self.documents.get(uri)
    }

    pub fn remove(&mut self, uri: &Url) -> Option<Document> {
        self.documents.remove(uri)
    }

    /// Whether `version` is still the latest snapshot of `uri`
    pub fn is_current(&self, uri: &Url, version: i32) -> bool {
        self.documents.get(uri).is_some_and(|d| d.version == version)
    }

    /// Clone every open document, for revalidation after a settings change
    pub fn snapshot(&self) -> Vec<(Url, Document)> {
        self.documents
            .iter()
            .map(|(uri, doc)| (uri.clone(), doc.clone()))
            .collect()
    }
}
