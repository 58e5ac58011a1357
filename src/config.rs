//! Configuration: page geometry, institute branding, security and storage.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::money::CurrencyFormat;
use crate::pagination::OverflowPolicy;

/// Environment variable that overrides the owner password.
pub const OWNER_PASSWORD_ENV: &str = "CAMPUS_DOCS_OWNER_PASSWORD";

/// Page orientation for composed documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageOrientation {
    /// Portrait mode: height > width (default).
    #[default]
    Portrait,
    /// Landscape mode: width > height.
    Landscape,
}

/// Geometry and typography of the paginated composer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ComposerConfig {
    /// Document title embedded in the PDF metadata.
    pub title: String,
    /// Page width in points (default: A4 = 595.28).
    pub page_width: f32,
    /// Page height in points (default: A4 = 841.89).
    pub page_height: f32,
    pub orientation: PageOrientation,
    /// Page margin in points on every side.
    pub margin: f32,
    /// Height of the header band below the top margin.
    pub header_height: f32,
    /// Space above the bottom margin reserved for the footer band.
    pub footer_reserve: f32,
    /// Height of one key/value or table row.
    pub row_height: f32,
    /// Baseline-to-baseline distance for wrapped body text.
    pub line_height: f32,
    pub body_font_size: f32,
    /// Character budget per wrapped body line.
    pub wrap_chars: usize,
    /// Hard cap on pages per document.
    pub max_pages: usize,
    pub overflow: OverflowPolicy,
    pub currency: CurrencyFormat,
}

impl Default for ComposerConfig {
    fn default() -> Self {
        Self {
            title: "campus-docs output".to_string(),
            page_width: 595.28,
            page_height: 841.89,
            orientation: PageOrientation::Portrait,
            margin: 40.0,
            header_height: 80.0,
            footer_reserve: 50.0,
            row_height: 20.0,
            line_height: 14.0,
            body_font_size: 10.0,
            wrap_chars: 95,
            max_pages: 8,
            overflow: OverflowPolicy::Continue,
            currency: CurrencyFormat::default(),
        }
    }
}

impl ComposerConfig {
    /// Effective page width after applying orientation.
    pub fn effective_width(&self) -> f32 {
        match self.orientation {
            PageOrientation::Portrait => self.page_width,
            PageOrientation::Landscape => self.page_height,
        }
    }

    /// Effective page height after applying orientation.
    pub fn effective_height(&self) -> f32 {
        match self.orientation {
            PageOrientation::Portrait => self.page_height,
            PageOrientation::Landscape => self.page_width,
        }
    }

    pub fn content_width(&self) -> f32 {
        self.effective_width() - 2.0 * self.margin
    }

    /// y at which body content starts on every page.
    pub fn body_top(&self) -> f32 {
        self.effective_height() - self.margin - self.header_height
    }

    /// Body content must stay at or above this y.
    pub fn footer_boundary(&self) -> f32 {
        self.margin + self.footer_reserve
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_pages == 0 {
            return Err(Error::Config("max_pages must be at least 1".into()));
        }
        if self.wrap_chars == 0 {
            return Err(Error::Config("wrap_chars must be at least 1".into()));
        }
        if self.row_height <= 0.0 || self.line_height <= 0.0 {
            return Err(Error::Config("row and line heights must be positive".into()));
        }
        if self.footer_boundary() >= self.body_top() {
            return Err(Error::Config(format!(
                "footer boundary {} leaves no body space below {}",
                self.footer_boundary(),
                self.body_top()
            )));
        }
        Ok(())
    }
}

/// Branding printed in headers, footers and signature blocks.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InstituteProfile {
    pub name: String,
    pub tagline: String,
    pub contact_line: String,
    pub address: String,
    /// Optional `data:image/png;base64,...` logo drawn in the header.
    pub logo: Option<String>,
    pub signatory_name: String,
    pub signatory_title: String,
}

impl Default for InstituteProfile {
    fn default() -> Self {
        Self {
            name: "Campus Institute".to_string(),
            tagline: "Excellence in Education".to_string(),
            contact_line: "info@campus.example | +91 00000 00000".to_string(),
            address: "Main Road, City".to_string(),
            logo: None,
            signatory_name: "Director".to_string(),
            signatory_title: "Authorised Signatory".to_string(),
        }
    }
}

/// Passwords applied by the encryption wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    pub enabled: bool,
    /// Required to lift the edit/copy restrictions.
    pub owner_password: String,
    /// Empty so the file opens without a prompt.
    pub user_password: String,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            owner_password: "campus-docs-owner".to_string(),
            user_password: String::new(),
        }
    }
}

impl SecurityConfig {
    /// Apply [`OWNER_PASSWORD_ENV`] when it is set and non-empty.
    pub fn with_env_override(mut self) -> Self {
        if let Ok(pw) = std::env::var(OWNER_PASSWORD_ENV) {
            if !pw.is_empty() {
                self.owner_password = pw;
            }
        }
        self
    }
}

/// Where generated artifacts are stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum StorageConfig {
    Memory {
        public_base_url: String,
    },
    Local {
        root: PathBuf,
        public_base_url: String,
    },
    Http {
        base_url: String,
        bucket: String,
        api_key: String,
    },
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig::Local {
            root: PathBuf::from("documents"),
            public_base_url: "file://documents".to_string(),
        }
    }
}

/// Everything the binary needs, loadable from one JSON file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub profile: InstituteProfile,
    pub composer: ComposerConfig,
    pub security: SecurityConfig,
    pub storage: StorageConfig,
}

impl AppConfig {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let mut config: AppConfig = serde_json::from_str(&raw)?;
        config.composer.validate()?;
        config.security = config.security.with_env_override();
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a4_geometry() {
        let cfg = ComposerConfig::default();
        assert!((cfg.content_width() - 515.28).abs() < 0.01);
        assert!((cfg.body_top() - 721.89).abs() < 0.01);
        assert_eq!(cfg.footer_boundary(), 90.0);
        cfg.validate().unwrap();
    }

    #[test]
    fn landscape_swaps_dimensions() {
        let cfg = ComposerConfig {
            orientation: PageOrientation::Landscape,
            ..ComposerConfig::default()
        };
        assert_eq!(cfg.effective_width(), 841.89);
        assert_eq!(cfg.effective_height(), 595.28);
    }

    #[test]
    fn rejects_footer_above_body() {
        let cfg = ComposerConfig {
            footer_reserve: 900.0,
            ..ComposerConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn partial_json_uses_defaults() {
        let cfg: AppConfig = serde_json::from_str(
            r#"{ "profile": { "name": "Sunrise Academy" },
                 "storage": { "backend": "memory", "public_base_url": "mem://" } }"#,
        )
        .unwrap();
        assert_eq!(cfg.profile.name, "Sunrise Academy");
        assert_eq!(cfg.profile.tagline, "Excellence in Education");
        assert_eq!(cfg.composer.max_pages, 8);
        assert!(matches!(cfg.storage, StorageConfig::Memory { .. }));
    }

    #[test]
    fn partial_currency_uses_defaults() {
        let cfg: AppConfig = serde_json::from_str(
            r#"{ "composer": { "currency": { "locale": "en-us" } } }"#,
        )
        .unwrap();
        assert_eq!(cfg.composer.currency.locale, crate::money::Locale::EnUs);
        assert_eq!(cfg.composer.currency.prefix, "Rs. ");
        assert_eq!(cfg.composer.max_pages, 8);
    }
}
