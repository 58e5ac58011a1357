//! Best-effort PDF protection.
//!
//! Generated documents are encrypted with an owner password (editing and
//! copying disallowed) and an empty user password (opens without a prompt).
//! Protection must never block delivery: if the encryptor fails, the
//! unencrypted bytes are returned instead.

use lopdf::encryption::{EncryptionState, EncryptionVersion, Permissions};
use lopdf::{Document, Object, StringFormat};
use sha2::{Digest, Sha256};

use crate::config::SecurityConfig;
use crate::error::{Error, Result};

/// Encrypts serialized PDF bytes.
pub trait Encryptor: Send + Sync {
    fn encrypt(&self, pdf: &[u8], owner_password: &str, user_password: &str) -> Result<Vec<u8>>;
}

/// Standard security handler (RC4, 128-bit) via `lopdf`. Only printing is
/// permitted to holders of the user password.
#[derive(Debug, Clone, Default)]
pub struct LopdfEncryptor;

impl Encryptor for LopdfEncryptor {
    fn encrypt(&self, pdf: &[u8], owner_password: &str, user_password: &str) -> Result<Vec<u8>> {
        let mut doc = Document::load_mem(pdf)?;

        // The key derivation needs a file identifier.
        if doc.trailer.get(b"ID").is_err() {
            let id = file_id(pdf);
            doc.trailer.set(
                "ID",
                Object::Array(vec![
                    Object::String(id.clone(), StringFormat::Hexadecimal),
                    Object::String(id, StringFormat::Hexadecimal),
                ]),
            );
        }

        let version = EncryptionVersion::V2 {
            document: &doc,
            owner_password,
            user_password,
            key_length: 128,
            permissions: Permissions::PRINTABLE,
        };
        let state = EncryptionState::try_from(version)
            .map_err(|e| Error::Encryption(e.to_string()))?;
        doc.encrypt(&state)
            .map_err(|e| Error::Encryption(e.to_string()))?;

        let mut out = Vec::new();
        doc.save_to(&mut out)?;
        Ok(out)
    }
}

/// 16-byte identifier derived from the document bytes.
fn file_id(pdf: &[u8]) -> Vec<u8> {
    Sha256::digest(pdf)[..16].to_vec()
}

/// Encrypt `pdf` when enabled, falling back to the original bytes on any
/// failure. Never returns an empty buffer for non-empty input.
pub fn protect(pdf: Vec<u8>, security: &SecurityConfig, encryptor: &dyn Encryptor) -> Vec<u8> {
    if !security.enabled {
        return pdf;
    }
    match encryptor.encrypt(&pdf, &security.owner_password, &security.user_password) {
        Ok(encrypted) if !encrypted.is_empty() => encrypted,
        Ok(_) => {
            log::warn!("encryption produced no output; storing unencrypted PDF");
            pdf
        }
        Err(e) => {
            log::warn!("encryption failed, storing unencrypted PDF: {e}");
            pdf
        }
    }
}

/// Encryptor that always fails; used to exercise the fallback path.
#[derive(Debug, Clone, Default)]
pub struct UnavailableEncryptor;

impl Encryptor for UnavailableEncryptor {
    fn encrypt(&self, _pdf: &[u8], _owner: &str, _user: &str) -> Result<Vec<u8>> {
        Err(Error::Encryption("no encryption backend available".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EmptyEncryptor;

    impl Encryptor for EmptyEncryptor {
        fn encrypt(&self, _pdf: &[u8], _owner: &str, _user: &str) -> Result<Vec<u8>> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn failure_falls_back_to_plain_bytes() {
        let input = b"%PDF-1.7 plain".to_vec();
        let out = protect(input.clone(), &SecurityConfig::default(), &UnavailableEncryptor);
        assert_eq!(out, input);
    }

    #[test]
    fn empty_output_falls_back_to_plain_bytes() {
        let input = b"%PDF-1.7 plain".to_vec();
        let out = protect(input.clone(), &SecurityConfig::default(), &EmptyEncryptor);
        assert_eq!(out, input);
    }

    #[test]
    fn garbage_input_does_not_panic() {
        let input = b"not a pdf at all".to_vec();
        let out = protect(input.clone(), &SecurityConfig::default(), &LopdfEncryptor);
        assert_eq!(out, input);
    }

    #[test]
    fn disabled_security_skips_encryptor() {
        let cfg = SecurityConfig {
            enabled: false,
            ..SecurityConfig::default()
        };
        let input = b"%PDF-1.7 plain".to_vec();
        assert_eq!(protect(input.clone(), &cfg, &UnavailableEncryptor), input);
    }

    #[test]
    fn file_id_is_truncated_sha256() {
        // SHA-256("abc") = ba7816bf 8f01cfea 414140de 5dae2223 ...
        assert_eq!(
            file_id(b"abc"),
            vec![
                0xba, 0x78, 0x16, 0xbf, 0x8f, 0x01, 0xcf, 0xea, 0x41, 0x41, 0x40, 0xde, 0x5d,
                0xae, 0x22, 0x23
            ]
        );
        assert_eq!(file_id(b"abc"), file_id(b"abc"));
        assert_ne!(file_id(b"abc"), file_id(b"abd"));
    }
}
