// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Password protection: copies every page into a new document and encrypts
// it with the standard security handler (AES-128, revision 4).

use quire_core::error::{QuireError, Result};
use quire_core::{Operation, OutputDocument, ProtectConfig};
use tracing::{info, instrument};

use super::reader::{PdfReader, package};
use super::security::Protection;
use super::serializer::SaveOptions;

pub const MIN_PASSWORD_LEN: usize = 6;
pub const MAX_PASSWORD_LEN: usize = 32;

/// Check length (6 to 32 characters) and that every character is printable
/// ASCII.
pub fn validate_password(password: &str) -> Result<()> {
    let length = password.chars().count();
    if !(MIN_PASSWORD_LEN..=MAX_PASSWORD_LEN).contains(&length) {
        return Err(QuireError::WeakPassword { length });
    }
    if !password.chars().all(|ch| matches!(ch, ' '..='~')) {
        return Err(QuireError::InvalidPasswordCharacters);
    }
    Ok(())
}

impl PdfReader {
    /// Encrypted copy of the document, openable with the user password.
    #[instrument(skip_all, fields(pages = self.page_count()))]
    pub fn protect(&self, config: &ProtectConfig) -> Result<OutputDocument> {
        validate_password(&config.user_password)?;
        let owner_password = match &config.owner_password {
            Some(owner) => {
                validate_password(owner)?;
                owner.clone()
            }
            None => generated_owner_password(),
        };
        info!(permissions = ?config.permissions, "Protecting PDF");

        let pages: Vec<u32> = (1..=self.page_count()).collect();
        let builder = self.copy_pages(&pages, Operation::Protect)?;

        let security = Protection {
            user_password: &config.user_password,
            owner_password: &owner_password,
            permissions: config.permissions,
        };
        let metadata = self.stamped_metadata(true, Operation::Protect);
        let options = SaveOptions {
            compress_streams: true,
            security: Some(&security),
            ..Default::default()
        };
        let output = package(
            builder.into_document(),
            "Protected",
            &metadata,
            &options,
            Operation::Protect,
        )?;
        info!(bytes = output.bytes.len(), "PDF encrypted");
        Ok(output)
    }
}

/// A random owner password; nobody needs to know it, the permissions are
/// what it guards.
fn generated_owner_password() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::metadata::read_metadata;
    use crate::test_support::{contains, page_text, sample_pdf};
    use quire_core::{EngineConfig, Permissions};

    fn reader() -> PdfReader {
        PdfReader::from_bytes(&sample_pdf(3), &EngineConfig::default()).unwrap()
    }

    fn protect(user: &str) -> Result<OutputDocument> {
        reader().protect(&ProtectConfig {
            user_password: user.into(),
            ..Default::default()
        })
    }

    #[test]
    fn password_length_bounds() {
        assert!(matches!(validate_password("short"), Err(QuireError::WeakPassword { length: 5 })));
        assert!(validate_password("sixsix").is_ok());
        assert!(validate_password(&"x".repeat(32)).is_ok());
        assert!(matches!(
            validate_password(&"x".repeat(33)),
            Err(QuireError::WeakPassword { length: 33 })
        ));
    }

    #[test]
    fn password_characters() {
        assert!(validate_password("with space ~").is_ok());
        assert!(matches!(validate_password("pässwörd"), Err(QuireError::InvalidPasswordCharacters)));
        assert!(matches!(validate_password("tab\there"), Err(QuireError::InvalidPasswordCharacters)));
    }

    #[test]
    fn weak_password_fails_before_any_work() {
        let err = protect("abc").unwrap_err();
        assert!(matches!(err, QuireError::WeakPassword { length: 3 }));
        assert!(err.is_validation());
    }

    #[test]
    fn owner_password_is_validated_too() {
        let err = reader()
            .protect(&ProtectConfig {
                user_password: "secret1".into(),
                owner_password: Some("ö".repeat(8)),
                permissions: Permissions::default(),
            })
            .unwrap_err();
        assert!(matches!(err, QuireError::InvalidPasswordCharacters));
    }

    #[test]
    fn output_carries_aes_encryption_dictionary() {
        let output = protect("secret1").unwrap();
        assert_eq!(output.page_count, 3);
        let bytes = &output.bytes;
        assert!(contains(bytes, b"/Encrypt"));
        assert!(contains(bytes, b"/AESV2"));
        assert!(contains(bytes, b"/StdCF"));
        assert!(contains(bytes, b"/ID"));
        assert!(contains(bytes, b"\nxref\n"));
        // The title is encrypted, so it must not appear in clear text.
        assert!(!contains(bytes, b"(Sample)"));
    }

    /// Re-run the encryption path on an in-memory document to inspect it.
    #[test]
    fn user_password_opens_protected_copy() {
        let reader = reader();
        let pages: Vec<u32> = (1..=3).collect();
        let mut doc = reader.copy_pages(&pages, Operation::Protect).unwrap().into_document();
        crate::pdf::metadata::write_metadata(&mut doc, &reader.stamped_metadata(true, Operation::Protect));

        let security = Protection {
            user_password: "secret1",
            owner_password: "owner-secret",
            permissions: Permissions {
                print: false,
                ..Default::default()
            },
        };
        let options = SaveOptions {
            compress_streams: true,
            security: Some(&security),
            ..Default::default()
        };
        crate::pdf::serializer::serialize(&mut doc, &options, Operation::Protect).unwrap();

        let encrypt = doc.get_encrypted().unwrap();
        let p = encrypt.get(b"P").unwrap().as_i64().unwrap();
        assert_eq!(p & 0b100, 0, "print bit must be clear");
        assert_ne!(p & 0b1_0000, 0, "copy bit must be set");

        assert!(doc.clone().decrypt("wrong-pass").is_err());
        doc.decrypt("secret1").unwrap();
        assert_eq!(read_metadata(&doc).title.as_deref(), Some("Sample"));
        assert_eq!(doc.get_pages().len(), 3);
        assert!(page_text(&doc, 2).contains("(Page 2)"));
    }
}
