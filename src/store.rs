//! Document store: uploaded PDFs on disk.
//!
//! Documents live at `<root>/<doc_id>.pdf` and the file bytes are the
//! durable truth. Ids are exactly 16 lowercase hex characters — a
//! content-hash prefix plus a random suffix — and are validated at every
//! entry point, which doubles as the path-traversal guard.

use std::fs;
use std::path::{Path, PathBuf};

use lazy_static::lazy_static;
use regex::Regex;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::error::{Error, Result};

lazy_static! {
    static ref DOC_ID: Regex = Regex::new(r"^[0-9a-f]{16}$").unwrap();
}

/// Validate a document id's shape.
pub fn validate_doc_id(doc_id: &str) -> Result<()> {
    if DOC_ID.is_match(doc_id) {
        Ok(())
    } else {
        Err(Error::InvalidId(doc_id.to_string()))
    }
}

/// Directory of stored documents.
#[derive(Debug, Clone)]
pub struct DocumentStore {
    root: PathBuf,
    max_upload_size: usize,
}

impl DocumentStore {
    /// Open (and create if needed) a store rooted at `root`.
    pub fn new(root: impl Into<PathBuf>, max_upload_size: usize) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self {
            root,
            max_upload_size,
        })
    }

    /// Path a document id maps to. Validates the id shape only.
    pub fn path(&self, doc_id: &str) -> Result<PathBuf> {
        validate_doc_id(doc_id)?;
        Ok(self.root.join(format!("{doc_id}.pdf")))
    }

    /// Path of an existing document.
    pub fn existing_path(&self, doc_id: &str) -> Result<PathBuf> {
        let path = self.path(doc_id)?;
        if !path.exists() {
            return Err(Error::NotFound(format!("Document {doc_id} not found")));
        }
        Ok(path)
    }

    /// Persist uploaded bytes and mint the document id.
    ///
    /// The id is the first 12 hex chars of the content hash plus 4
    /// random hex chars, so re-uploading the same PDF never overwrites
    /// an edited copy.
    pub fn save_upload(&self, content: &[u8]) -> Result<String> {
        if content.len() > self.max_upload_size {
            return Err(Error::Oversize {
                size: content.len(),
                limit: self.max_upload_size,
            });
        }
        let digest = Sha256::digest(content);
        let hash_hex = format!("{digest:x}");
        let suffix = Uuid::new_v4().simple().to_string();
        let doc_id = format!("{}{}", &hash_hex[..12], &suffix[..4]);

        fs::write(self.root.join(format!("{doc_id}.pdf")), content)?;
        log::debug!("stored upload {doc_id} ({} bytes)", content.len());
        Ok(doc_id)
    }

    /// Read a stored document's bytes.
    pub fn read(&self, doc_id: &str) -> Result<Vec<u8>> {
        Ok(fs::read(self.existing_path(doc_id)?)?)
    }

    /// Overwrite a stored document's bytes.
    pub fn write(&self, doc_id: &str, bytes: &[u8]) -> Result<()> {
        Ok(fs::write(self.path(doc_id)?, bytes)?)
    }

    /// Store root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }
}
