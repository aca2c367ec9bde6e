//! The dossier: a resource under construction plus its metadata and embedded files.

use crate::attachment::{AttachmentOptions, AttachmentStrategy};
use crate::{DossierError, DossierResult};
use hl7_peri22x_documents::{DocumentFactory, EmbeddedDocument, XmlDocument};
use peri22x::Resource;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Aggregate built from one patient group of an observation message.
///
/// Metadata is last-write-wins per key. Embedded files stay pending until
/// [`Dossier::register_attachments`] assigns them attachment records and storage keys.
#[derive(Clone, Debug)]
pub struct Dossier {
    resource: Resource,
    metadata: BTreeMap<String, String>,
    embedded_files: Vec<EmbeddedDocument>,
    storage_key: Option<String>,
    attachments_registered: bool,
    document_factory: Arc<dyn DocumentFactory + Send + Sync>,
}

impl Dossier {
    pub fn new(
        resource_type: &str,
        document_factory: Arc<dyn DocumentFactory + Send + Sync>,
    ) -> Self {
        Self {
            resource: Resource::new(resource_type),
            metadata: BTreeMap::new(),
            embedded_files: Vec::new(),
            storage_key: None,
            attachments_registered: false,
            document_factory,
        }
    }

    pub fn resource(&self) -> &Resource {
        &self.resource
    }

    pub fn resource_mut(&mut self) -> &mut Resource {
        &mut self.resource
    }

    pub fn add_metadata(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.metadata.insert(key.into(), value.into());
    }

    pub fn has_metadata(&self, key: &str) -> bool {
        self.metadata.contains_key(key)
    }

    pub fn metadata_value(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(String::as_str)
    }

    /// All metadata, ordered by key.
    pub fn metadata(&self) -> &BTreeMap<String, String> {
        &self.metadata
    }

    /// Appends a pending embedded file, detecting its type with the dossier's document factory.
    pub fn add_file_data(&mut self, data: Vec<u8>, basename: &str) {
        let document = self.document_factory.create_embedded(data, basename);
        self.embedded_files.push(document);
    }

    pub fn embedded_files(&self) -> &[EmbeddedDocument] {
        &self.embedded_files
    }

    pub fn storage_key(&self) -> Option<&str> {
        self.storage_key.as_deref()
    }

    pub fn set_storage_key(&mut self, storage_key: impl Into<String>) {
        self.storage_key = Some(storage_key.into());
    }

    /// Runs the pending embedded files through `strategy`, adding their attachment records to
    /// the resource. Once that has succeeded, further calls are no-ops.
    ///
    /// # Errors
    ///
    /// Returns [`DossierError::InvalidConfiguration`] if no storage key has been set, or any
    /// error from the strategy.
    pub fn register_attachments(&mut self, strategy: &dyn AttachmentStrategy) -> DossierResult<()> {
        if self.attachments_registered {
            tracing::debug!("attachments already registered");
            return Ok(());
        }

        let storage_key = self.storage_key.clone().ok_or_else(|| {
            DossierError::InvalidConfiguration(
                "a storage key must be set before registering attachments".into(),
            )
        })?;

        strategy.process(
            &mut self.resource,
            &mut self.embedded_files,
            &AttachmentOptions::with_storage_key(storage_key),
        )?;
        self.attachments_registered = true;
        Ok(())
    }

    /// Renders the resource as an XML document.
    ///
    /// # Errors
    ///
    /// Returns [`DossierError::Xml`] if rendering fails.
    pub fn to_xml_document(&self) -> DossierResult<XmlDocument> {
        let xml = self.resource.to_xml()?;
        Ok(self.document_factory.create_xml(xml))
    }
}
