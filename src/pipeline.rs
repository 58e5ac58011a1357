//! Pipeline – ties together composition, rendering, protection and upload
//! into a single call per document.
//!
//! Upload failures are soft: the caller gets `None` instead of a URL and is
//! expected to save its parent record without an attachment.

use crate::config::{AppConfig, ComposerConfig, InstituteProfile, SecurityConfig};
use crate::error::Result;
use crate::fonts::FontManager;
use crate::layout_config::LayoutConfig;
use crate::render::render_pdf;
use crate::security::{protect, Encryptor, LopdfEncryptor};
use crate::snapshot::SnapshotArtifact;
use crate::storage::{self, artifact_path, ObjectStore, PDF_CONTENT_TYPE};
use crate::templates::{
    compose_offer_letter, compose_offer_letter_with, ComposedDocument, OfferLetterRequest,
};

/// Storage category for offer letters.
pub const OFFER_LETTER_CATEGORY: &str = "offer-letters";

/// Final PDF bytes and where they will be stored.
#[derive(Debug, Clone)]
pub struct RenderedArtifact {
    pub path: String,
    pub bytes: Vec<u8>,
}

/// Lay out an offer letter without rendering it.
pub fn compose(
    request: &OfferLetterRequest,
    config: &ComposerConfig,
    profile: &InstituteProfile,
) -> Result<LayoutConfig> {
    compose_offer_letter(request, config, profile).map(|composed| composed.layout)
}

/// Compose and render an offer letter, then apply best-effort protection.
pub fn generate_offer_letter_pdf(
    request: &OfferLetterRequest,
    config: &ComposerConfig,
    profile: &InstituteProfile,
    security: &SecurityConfig,
    encryptor: &dyn Encryptor,
) -> Result<(RenderedArtifact, ComposedDocument)> {
    let composed = compose_offer_letter(request, config, profile)?;
    render_composed(request, composed, security, encryptor)
}

fn render_composed(
    request: &OfferLetterRequest,
    composed: ComposedDocument,
    security: &SecurityConfig,
    encryptor: &dyn Encryptor,
) -> Result<(RenderedArtifact, ComposedDocument)> {
    if composed.report.truncated() {
        log::warn!(
            "offer letter {} dropped {} line(s) of terms",
            request.record_id,
            composed.report.lines_dropped
        );
    }
    let pdf = render_pdf(&composed.layout)?;
    let bytes = protect(pdf, security, encryptor);
    let artifact = RenderedArtifact {
        path: artifact_path(OFFER_LETTER_CATEGORY, &request.record_id, &request.name),
        bytes,
    };
    Ok((artifact, composed))
}

/// Upload `artifact`, overwriting any object at its path, and return the
/// public URL. Any failure is logged and reported as `None`.
pub fn publish(artifact: RenderedArtifact, store: &dyn ObjectStore) -> Option<String> {
    match store.put(&artifact.path, &artifact.bytes, PDF_CONTENT_TYPE) {
        Ok(()) => {
            let url = store.public_url(&artifact.path);
            log::info!(
                "stored {} ({} bytes) at {url}",
                artifact.path,
                artifact.bytes.len()
            );
            Some(url)
        }
        Err(e) => {
            log::warn!("upload of {} failed, continuing without document: {e}", artifact.path);
            None
        }
    }
}

/// Server-side document generation for one institute.
pub struct DocumentService {
    profile: InstituteProfile,
    composer: ComposerConfig,
    security: SecurityConfig,
    encryptor: Box<dyn Encryptor>,
    store: Box<dyn ObjectStore>,
    fonts: FontManager,
}

impl DocumentService {
    /// Build from config with the `lopdf` encryptor.
    pub fn new(config: AppConfig) -> Result<Self> {
        config.composer.validate()?;
        let store = storage::from_config(&config.storage)?;
        Ok(Self {
            profile: config.profile,
            composer: config.composer,
            security: config.security,
            encryptor: Box::new(LopdfEncryptor),
            store,
            fonts: FontManager::default(),
        })
    }

    pub fn with_parts(
        profile: InstituteProfile,
        composer: ComposerConfig,
        security: SecurityConfig,
        encryptor: Box<dyn Encryptor>,
        store: Box<dyn ObjectStore>,
    ) -> Self {
        Self {
            profile,
            composer,
            security,
            encryptor,
            store,
            fonts: FontManager::default(),
        }
    }

    /// Measure offer-letter text with `fonts` instead of the heuristic.
    pub fn with_fonts(mut self, fonts: FontManager) -> Self {
        self.fonts = fonts;
        self
    }

    pub fn store(&self) -> &dyn ObjectStore {
        self.store.as_ref()
    }

    /// Render without uploading.
    pub fn render_offer_letter(&self, request: &OfferLetterRequest) -> Result<RenderedArtifact> {
        let composed =
            compose_offer_letter_with(request, &self.composer, &self.profile, self.fonts.clone())?;
        render_composed(request, composed, &self.security, self.encryptor.as_ref())
            .map(|(artifact, _)| artifact)
    }

    /// Generate, protect and upload an offer letter. `None` means the
    /// record should be saved without a document attached.
    pub fn offer_letter(&self, request: &OfferLetterRequest) -> Option<String> {
        match self.render_offer_letter(request) {
            Ok(artifact) => publish(artifact, self.store.as_ref()),
            Err(e) => {
                log::warn!("offer letter {} not generated: {e}", request.record_id);
                None
            }
        }
    }

    /// Store a captured snapshot document under its category.
    pub fn store_snapshot(&self, artifact: &SnapshotArtifact) -> Option<String> {
        publish(
            RenderedArtifact {
                path: artifact.storage_path(),
                bytes: artifact.bytes.clone(),
            },
            self.store.as_ref(),
        )
    }
}
