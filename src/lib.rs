//! # campus-docs – document generation for an institute
//!
//! Two document paths share one layout and rendering core:
//!
//! 1. **Paginated composer** – a structured request is laid out onto A4
//!    pages with a repeating header and footer ([`composer`], [`templates`]),
//!    paginated against a footer boundary ([`pagination`]), rendered to PDF
//!    bytes via printpdf ([`render`]), protected ([`security`]) and uploaded
//!    ([`storage`]). [`pipeline`] wires these stages together.
//! 2. **Snapshot composer** – a fixed-size visual component ([`cards`]) is
//!    rasterized to a bitmap and embedded full-bleed on a single page
//!    ([`snapshot`]).
//!
//! The intermediate layout ([`layout_config::LayoutConfig`]) is plain data
//! and serializes to JSON for inspection.

pub mod cards;
pub mod composer;
pub mod config;
pub mod error;
pub mod fonts;
pub mod layout_config;
pub mod money;
pub mod pagination;
pub mod pipeline;
pub mod render;
pub mod security;
pub mod snapshot;
pub mod storage;
pub mod templates;

pub use config::{AppConfig, ComposerConfig, InstituteProfile, PageOrientation, SecurityConfig, StorageConfig};
pub use error::{Error, Result};
pub use pipeline::{generate_offer_letter_pdf, publish, DocumentService, RenderedArtifact};
pub use snapshot::{CaptureOutcome, DocumentKind, SnapshotArtifact, SnapshotComposer, SnapshotView};
pub use templates::{compose_offer_letter, OfferLetterRequest};
