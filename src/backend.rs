//! LSP Backend implementation

use std::sync::Arc;

use tokio::sync::RwLock;
use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::*;
use tower_lsp::{Client, LanguageServer};

use crate::config::Settings;
use crate::diagnostics::DiagnosticBuilder;
use crate::document::{Document, DocumentStore};
use crate::schema::JsonSchemaEngine;

/// The LSP backend that handles all language server requests
pub struct Backend {
    /// The LSP client for sending notifications
    client: Client,
    /// Open documents keyed by URI
    documents: Arc<RwLock<DocumentStore>>,
    /// Current settings, including the resolved schema
    settings: Arc<RwLock<Settings>>,
    engine: JsonSchemaEngine,
}

impl Backend {
    /// Create a new backend instance
    pub fn new(client: Client) -> Self {
        Self {
            client,
            documents: Arc::new(RwLock::new(DocumentStore::new())),
            settings: Arc::new(RwLock::new(Settings::default())),
            engine: JsonSchemaEngine,
        }
    }

    /// Apply new settings, reporting malformed ones to the user
    async fn apply_settings(&self, value: Option<serde_json::Value>) -> bool {
        match Settings::from_value(value) {
            Ok(settings) => {
                tracing::info!(
                    has_schema = settings.schema.is_some(),
                    suffixes = ?settings.template_suffixes,
                    "Settings updated"
                );
                *self.settings.write().await = settings;
                true
            }
            Err(err) => {
                tracing::warn!("Ignoring settings: {}", err);
                self.client
                    .show_message(MessageType::WARNING, err.to_string())
                    .await;
                false
            }
        }
    }

    /// Store a snapshot and validate it
    async fn update_document(&self, uri: Url, text: String, version: i32) {
        let accepted = self
            .documents
            .write()
            .await
            .upsert(uri.clone(), Document::new(text.clone(), version));

        if accepted {
            self.validate_document(&uri, &text, version).await;
        } else {
            tracing::debug!("Ignoring stale version {} of {}", version, uri);
        }
    }

    /// Validate a document and publish diagnostics
    async fn validate_document(&self, uri: &Url, text: &str, version: i32) {
        let settings = self.settings.read().await.clone();

        let result = {
            let builder = DiagnosticBuilder::new(&self.engine, &settings);
            match &settings.schema {
                Some(schema) => builder.build(uri.as_str(), text, schema),
                None => Ok(builder.check_syntax(uri.as_str(), text)),
            }
        };

        let diagnostics = match result {
            Ok(diagnostics) => diagnostics,
            Err(err) => {
                tracing::error!("Validation of {} aborted: {}", uri, err);
                self.client
                    .show_message(MessageType::ERROR, err.to_string())
                    .await;
                return;
            }
        };

        // A newer snapshot may have arrived while this one was validated.
        if !self.documents.read().await.is_current(uri, version) {
            tracing::debug!("Dropping diagnostics for superseded version {} of {}", version, uri);
            return;
        }

        tracing::debug!("Publishing {} diagnostics for {}", diagnostics.len(), uri);
        self.client
            .publish_diagnostics(
                uri.clone(),
                diagnostics.iter().map(Diagnostic::from).collect(),
                Some(version),
            )
            .await;
    }

    /// Revalidate every open document, e.g. after the schema changed
    async fn validate_all(&self) {
        let snapshot = self.documents.read().await.snapshot();
        for (uri, document) in snapshot {
            self.validate_document(&uri, &document.text, document.version)
                .await;
        }
    }
}

#[tower_lsp::async_trait]
impl LanguageServer for Backend {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        self.apply_settings(params.initialization_options).await;

        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncCapability::Options(
                    TextDocumentSyncOptions {
                        open_close: Some(true),
                        change: Some(TextDocumentSyncKind::FULL),
                        save: Some(TextDocumentSyncSaveOptions::Supported(true)),
                        ..Default::default()
                    },
                )),
                ..Default::default()
            },
            server_info: Some(ServerInfo {
                name: "json-mustache-lsp".to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        tracing::info!("Server initialized");
    }

    async fn shutdown(&self) -> Result<()> {
        tracing::info!("Server shutting down");
        Ok(())
    }

    async fn did_change_configuration(&self, params: DidChangeConfigurationParams) {
        if self.apply_settings(Some(params.settings)).await {
            self.validate_all().await;
        }
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let document = params.text_document;
        tracing::debug!("Document opened: {}", document.uri);

        self.update_document(document.uri, document.text, document.version)
            .await;
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        let uri = params.text_document.uri;
        let version = params.text_document.version;

        // Get the full text from the changes (we use FULL sync)
        if let Some(change) = params.content_changes.into_iter().last() {
            tracing::debug!("Document changed: {}", uri);
            self.update_document(uri, change.text, version).await;
        }
    }

    async fn did_save(&self, params: DidSaveTextDocumentParams) {
        let uri = params.text_document.uri;
        tracing::debug!("Document saved: {}", uri);

        let document = self.documents.read().await.get(&uri).cloned();
        if let Some(document) = document {
            self.validate_document(&uri, &document.text, document.version)
                .await;
        }
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        let uri = params.text_document.uri;
        tracing::debug!("Document closed: {}", uri);

        self.documents.write().await.remove(&uri);

        // Clear diagnostics for this document
        self.client.publish_diagnostics(uri, vec![], None).await;
    }
}
