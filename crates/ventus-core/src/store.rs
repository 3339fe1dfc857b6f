//! Session store
//!
//! Holds the working state of one session: the enriched transactions of the
//! last imported batch, the user's corrections, and the anchor ZIP. The
//! store hydrates from a JSON file when opened and flushes atomically after
//! every change. A change is staged on a copy of the state and only becomes
//! visible once it is on disk, so a failed write leaves the store as it was.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::enrich::{apply_corrections, reset_corrections, CorrectionSet};
use crate::error::{Error, Result};
use crate::filter::{apply_filters, project, TransactionFilter};
use crate::import::{NormalizedBatch, SkippedRow};
use crate::models::{Correction, EnrichedTransaction, Pillar, Transaction};

const SESSION_VERSION: u32 = 1;

/// Serialized session contents
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct SessionData {
    #[serde(default)]
    version: u32,
    #[serde(default)]
    imported_at: Option<DateTime<Utc>>,
    #[serde(default)]
    anchor_zip: Option<String>,
    /// Engine layer, never carries correction overlays
    #[serde(default)]
    transactions: Vec<EnrichedTransaction>,
    #[serde(default)]
    skipped: Vec<SkippedRow>,
    #[serde(default)]
    corrections: CorrectionSet,
}

/// File-backed session state
pub struct SessionStore {
    path: PathBuf,
    data: SessionData,
}

impl SessionStore {
    /// Open a session file, starting empty if it is missing or unreadable
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let data = match fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str::<SessionData>(&content) {
                Ok(data) => {
                    debug!(
                        path = %path.display(),
                        transactions = data.transactions.len(),
                        corrections = data.corrections.len(),
                        "Hydrated session"
                    );
                    data
                }
                Err(e) => {
                    warn!(path = %path.display(), "Ignoring corrupt session file: {}", e);
                    SessionData::default()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => SessionData::default(),
            Err(e) => {
                warn!(path = %path.display(), "Could not read session file: {}", e);
                SessionData::default()
            }
        };
        Self { path, data }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_empty(&self) -> bool {
        self.data.transactions.is_empty()
    }

    pub fn imported_at(&self) -> Option<DateTime<Utc>> {
        self.data.imported_at
    }

    pub fn anchor_zip(&self) -> Option<&str> {
        self.data.anchor_zip.as_deref()
    }

    pub fn set_anchor_zip(&mut self, zip: Option<String>) -> Result<()> {
        let mut next = self.data.clone();
        next.anchor_zip = zip;
        self.commit(next)
    }

    /// Engine-layer transactions, without corrections
    pub fn base(&self) -> &[EnrichedTransaction] {
        &self.data.transactions
    }

    /// Canonical transactions of the current batch
    pub fn transactions(&self) -> Vec<Transaction> {
        self.data
            .transactions
            .iter()
            .map(|t| t.transaction.clone())
            .collect()
    }

    /// Rows rejected when the current batch was normalized
    pub fn skipped(&self) -> &[SkippedRow] {
        &self.data.skipped
    }

    pub fn corrections(&self) -> &CorrectionSet {
        &self.data.corrections
    }

    /// Replace the session with a freshly normalized batch
    ///
    /// Transactions start unenriched and earlier corrections are dropped.
    pub fn load_batch(&mut self, batch: NormalizedBatch) -> Result<()> {
        info!(
            "Loaded {} transactions ({} rows skipped)",
            batch.transactions.len(),
            batch.skipped.len()
        );
        let next = SessionData {
            version: SESSION_VERSION,
            imported_at: Some(Utc::now()),
            anchor_zip: self.data.anchor_zip.clone(),
            transactions: batch
                .transactions
                .into_iter()
                .map(EnrichedTransaction::unenriched)
                .collect(),
            skipped: batch.skipped,
            corrections: CorrectionSet::default(),
        };
        self.commit(next)
    }

    /// Replace the engine layer with merged enrichment results
    ///
    /// The merged collection must cover the same transactions; corrections
    /// are kept.
    pub fn set_enriched(&mut self, enriched: Vec<EnrichedTransaction>) -> Result<()> {
        if enriched.len() != self.data.transactions.len()
            || enriched
                .iter()
                .zip(&self.data.transactions)
                .any(|(new, old)| new.id() != old.id())
        {
            return Err(Error::InvalidData(
                "Enriched transactions do not match the current batch".into(),
            ));
        }
        let mut next = self.data.clone();
        next.transactions = reset_corrections(&enriched);
        self.commit(next)
    }

    /// Record a correction for a transaction in the session
    ///
    /// Fails with `NotFound`, leaving the session untouched, when the id is
    /// not part of the current batch.
    pub fn correct(
        &mut self,
        transaction_id: &str,
        pillar: Pillar,
        subcategory: &str,
        reason: Option<String>,
    ) -> Result<Correction> {
        let tx = self
            .data
            .transactions
            .iter()
            .find(|t| t.id() == transaction_id)
            .ok_or_else(|| Error::NotFound(format!("transaction {}", transaction_id)))?;
        let correction = Correction::new(tx, pillar, subcategory, reason);
        let mut next = self.data.clone();
        next.corrections.record(correction.clone(), &self.data.transactions)?;
        self.commit(next)?;
        Ok(correction)
    }

    /// Remove the correction for a transaction, if there is one
    pub fn uncorrect(&mut self, transaction_id: &str) -> Result<Option<Correction>> {
        let mut next = self.data.clone();
        let removed = next.corrections.remove(transaction_id);
        if removed.is_some() {
            self.commit(next)?;
        }
        Ok(removed)
    }

    /// Remove every correction, keeping the imported transactions
    pub fn clear_corrections(&mut self) -> Result<usize> {
        let removed = self.data.corrections.len();
        let mut next = self.data.clone();
        next.corrections.clear();
        self.commit(next)?;
        Ok(removed)
    }

    /// Transactions with corrections applied
    pub fn corrected(&self) -> Vec<EnrichedTransaction> {
        apply_corrections(&self.data.transactions, &self.data.corrections)
    }

    /// Transactions narrowed by a filter, in the filter's display layer
    pub fn view(&self, filter: &TransactionFilter) -> Vec<EnrichedTransaction> {
        project(&apply_filters(&self.corrected(), filter), filter.display_mode)
    }

    /// Drop all session state, keeping the anchor ZIP
    pub fn reset(&mut self) -> Result<()> {
        let next = SessionData {
            anchor_zip: self.data.anchor_zip.clone(),
            ..SessionData::default()
        };
        self.commit(next)
    }

    /// Write the current state to disk
    pub fn flush(&mut self) -> Result<()> {
        self.commit(self.data.clone())
    }

    /// Persist `next`, then make it the current state
    fn commit(&mut self, mut next: SessionData) -> Result<()> {
        next.version = SESSION_VERSION;
        write_atomic(&self.path, &next)?;
        self.data = next;
        Ok(())
    }
}

/// Write session data atomically (temp file + rename)
fn write_atomic(path: &Path, data: &SessionData) -> Result<()> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&dir)?;

    let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
    serde_json::to_writer_pretty(&mut tmp, data)?;
    tmp.write_all(b"\n")?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| Error::Io(e.error))?;

    debug!(path = %path.display(), "Flushed session");
    Ok(())
}
