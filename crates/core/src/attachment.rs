//! Attachment naming strategies.
//!
//! Before a dossier is stored, each embedded document needs an attachment record on the
//! resource and a storage key of its own. A strategy decides the ids, filenames and keys.

use crate::{DossierError, DossierResult};
use hl7_peri22x_documents::{Document, EmbeddedDocument};
use peri22x::{Attachment, Resource};
use std::collections::HashMap;

/// Options passed to an [`AttachmentStrategy`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AttachmentOptions {
    /// Storage key of the resource the documents belong to.
    pub storage_key: Option<String>,
}

impl AttachmentOptions {
    pub fn with_storage_key(storage_key: impl Into<String>) -> Self {
        Self {
            storage_key: Some(storage_key.into()),
        }
    }
}

/// Registers embedded documents as attachments of a resource.
pub trait AttachmentStrategy {
    /// # Errors
    ///
    /// Returns [`DossierError`] if the options are insufficient for this strategy.
    fn process(
        &self,
        resource: &mut Resource,
        documents: &mut [EmbeddedDocument],
        options: &AttachmentOptions,
    ) -> DossierResult<()>;
}

/// Sequential attachment ids with hub storage keys.
///
/// - attachment ids count from 1 in document order
/// - documents sharing a basename are suffixed `-1`, `-2`, … in encounter order
/// - each document's storage key is `<id>@<resource storage key>`
/// - the attachment filename is `<basename>.<extension>`
#[derive(Clone, Copy, Debug, Default)]
pub struct HubAttachmentStrategy;

impl HubAttachmentStrategy {
    fn disambiguate_basenames(documents: &mut [EmbeddedDocument]) {
        let mut counts: HashMap<String, usize> = HashMap::new();
        for document in documents.iter() {
            *counts.entry(document.basename().to_string()).or_default() += 1;
        }

        let mut seen: HashMap<String, usize> = HashMap::new();
        for document in documents.iter_mut() {
            let basename = document.basename().to_string();
            if counts.get(&basename).copied().unwrap_or_default() < 2 {
                continue;
            }
            let sequence = seen.entry(basename.clone()).or_default();
            *sequence += 1;
            document.set_basename(format!("{basename}-{sequence}"));
        }
    }
}

impl AttachmentStrategy for HubAttachmentStrategy {
    fn process(
        &self,
        resource: &mut Resource,
        documents: &mut [EmbeddedDocument],
        options: &AttachmentOptions,
    ) -> DossierResult<()> {
        if documents.is_empty() {
            return Ok(());
        }
        let storage_key = options.storage_key.as_deref().ok_or_else(|| {
            DossierError::InvalidArgument("attachment processing requires a storage_key".into())
        })?;

        Self::disambiguate_basenames(documents);

        for (index, document) in documents.iter_mut().enumerate() {
            let sequence = u32::try_from(index + 1).map_err(|_| {
                DossierError::InvalidArgument("too many embedded documents".into())
            })?;
            document.set_storage_key(format!("{sequence}@{storage_key}"));
            resource.add_attachment(Attachment::new(
                sequence,
                document.mime_type(),
                document.filename(),
            ));
        }

        tracing::debug!(
            count = documents.len(),
            storage_key,
            "registered attachments"
        );
        Ok(())
    }
}
