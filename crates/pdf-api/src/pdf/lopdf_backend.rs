//! [`Decryptor`] backed by `lopdf`.
//!
//! `lopdf` only decrypts objects while loading when the user password is
//! empty. Anything else comes back with just the `/Encrypt` dictionary, so
//! the remaining objects are re-read from the xref table still encrypted.
//! [`Document::decrypt`] then authenticates the password, rewrites every
//! object in the clear, unpacks object streams and drops `/Encrypt` from
//! the trailer. Saving the result yields an unprotected document.

use std::collections::{BTreeMap, HashSet};

use lopdf::encryption::DecryptionError;
use lopdf::xref::XrefEntry;
use lopdf::{Document, Object, ObjectId, Reader};
use tracing::debug;

use super::{BackendError, Decryptor, Protection};

/// Stateless `lopdf` decryptor. Every call parses its own copy of the document.
#[derive(Debug, Clone, Copy, Default)]
pub struct LopdfDecryptor;

impl LopdfDecryptor {
    pub fn new() -> Self {
        Self
    }
}

impl Decryptor for LopdfDecryptor {
    fn protection(&self, document: &[u8]) -> Result<Protection, BackendError> {
        let doc = load(document)?;
        if !doc.is_encrypted() {
            return Ok(Protection::Open);
        }
        match doc.authenticate_user_password("") {
            Ok(()) => {
                debug!("document is encrypted with an empty user password");
                Ok(Protection::Open)
            }
            Err(e) => match classify(e) {
                BackendError::WrongPassword => Ok(Protection::PasswordRequired),
                other => Err(other),
            },
        }
    }

    fn decrypt(&self, document: &[u8], password: &str) -> Result<Vec<u8>, BackendError> {
        let mut doc = load(document)?;
        if doc.is_encrypted() {
            doc = reload_encrypted(document, doc)?;
            doc.decrypt(password).map_err(classify)?;
            drop_container_streams(&mut doc);
        }

        let mut out = Vec::with_capacity(document.len());
        doc.save_to(&mut out)
            .map_err(|e| BackendError::Library(format!("failed to serialise document: {e}")))?;
        debug!(bytes = out.len(), "document re-serialised without encryption");
        Ok(out)
    }
}

fn load(document: &[u8]) -> Result<Document, BackendError> {
    Document::load_mem(document).map_err(|e| BackendError::Malformed(e.to_string()))
}

/// Replace the objects of a freshly loaded encrypted document with every
/// uncompressed xref entry parsed as-is, still encrypted.
///
/// An unreadable entry fails the whole document: decrypting the rest would
/// silently produce a file with objects missing.
fn reload_encrypted(buffer: &[u8], mut doc: Document) -> Result<Document, BackendError> {
    doc.encryption_state = None;
    let ids: Vec<ObjectId> = doc
        .reference_table
        .entries
        .iter()
        .filter_map(|(&number, entry)| match *entry {
            XrefEntry::Normal { generation, .. } => Some((number, generation)),
            _ => None,
        })
        .collect();

    let mut reader = Reader {
        buffer,
        document: doc,
        encryption_state: None,
        raw_objects: BTreeMap::new(),
    };

    let mut objects = BTreeMap::new();
    for id in ids {
        let object = reader.get_object(id, &mut HashSet::new()).map_err(|e| {
            BackendError::Malformed(format!("object {} {}: {e}", id.0, id.1))
        })?;
        objects.insert(id, object);
    }
    debug!(objects = objects.len(), "encrypted objects read");

    reader.document.objects = objects;
    Ok(reader.document)
}

/// Object and xref streams are unpacked by decryption and rebuilt on save.
fn drop_container_streams(doc: &mut Document) {
    doc.objects.retain(|_, object| match object {
        Object::Stream(stream) => {
            !(stream.dict.has_type(b"ObjStm") || stream.dict.has_type(b"XRef"))
        }
        _ => true,
    });
}

fn classify(err: lopdf::Error) -> BackendError {
    match err {
        // A password that cannot be normalised can never match.
        lopdf::Error::Decryption(DecryptionError::IncorrectPassword)
        | lopdf::Error::Decryption(DecryptionError::StringPrep(_)) => BackendError::WrongPassword,
        lopdf::Error::Decryption(e) => BackendError::Malformed(format!("encryption dictionary: {e}")),
        other => BackendError::Library(other.to_string()),
    }
}
