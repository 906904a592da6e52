// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Standard security handler settings: AES-128 (/V 4 /R 4, /StdCF with
// /AESV2) through lopdf's encryption support.
//
// The key derivation needs the trailer /ID, so a file identifier is assigned
// before the encryption state is built.

use std::collections::BTreeMap;
use std::sync::Arc;

use lopdf::encryption::crypt_filters::{Aes128CryptFilter, CryptFilter};
use lopdf::{Document, EncryptionState, EncryptionVersion, Object, StringFormat};
use quire_core::Permissions;
use tracing::{debug, instrument};

const CRYPT_FILTER: &[u8] = b"StdCF";

/// Passwords and permissions for one protected output.
pub struct Protection<'a> {
    pub user_password: &'a str,
    pub owner_password: &'a str,
    pub permissions: Permissions,
}

impl Protection<'_> {
    /// Encrypt every string and stream of `doc` in place and register the
    /// /Encrypt dictionary. Streams must already carry their final filters.
    #[instrument(skip_all, fields(objects = doc.objects.len()))]
    pub fn apply(&self, doc: &mut Document) -> lopdf::Result<()> {
        if doc.trailer.get(b"ID").is_err() {
            let id = Object::String(file_id().to_vec(), StringFormat::Hexadecimal);
            doc.trailer.set("ID", Object::Array(vec![id.clone(), id]));
        }

        let crypt_filter: Arc<dyn CryptFilter> = Arc::new(Aes128CryptFilter);
        let state = EncryptionState::try_from(EncryptionVersion::V4 {
            document: &*doc,
            encrypt_metadata: true,
            crypt_filters: BTreeMap::from([(CRYPT_FILTER.to_vec(), crypt_filter)]),
            stream_filter: CRYPT_FILTER.to_vec(),
            string_filter: CRYPT_FILTER.to_vec(),
            owner_password: self.owner_password,
            user_password: self.user_password,
            permissions: permission_flags(&self.permissions),
        })?;
        doc.encrypt(&state)?;
        debug!(p = self.permissions.to_p_value(), "document encrypted");
        Ok(())
    }
}

/// lopdf's permission flags for the `/P` value of `permissions`.
pub fn permission_flags(permissions: &Permissions) -> lopdf::Permissions {
    lopdf::Permissions::from_bits_truncate(u64::from(permissions.to_p_value() as u32))
}

/// Random 16-byte file identifier.
fn file_id() -> [u8; 16] {
    *uuid::Uuid::new_v4().as_bytes()
}
