use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

use nosh_core::models::Journal;
use nosh_core::{NutritionPolicy, NutritionService};

/// JSON file holding the whole journal: catalog, meals and profile.
pub struct JournalStore {
    path: PathBuf,
}

impl JournalStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the journal; a missing file is an empty journal.
    pub fn load(&self) -> Result<Journal> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "no journal yet, starting empty");
            return Ok(Journal::default());
        }
        read_journal(&self.path)
    }

    /// Write the journal through a temporary file so a crash never leaves a
    /// half-written journal behind.
    pub fn save(&self, journal: &Journal) -> Result<()> {
        let json = serde_json::to_string_pretty(journal)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)
            .with_context(|| format!("Failed to write journal: {}", tmp.display()))?;
        std::fs::rename(&tmp, &self.path)
            .with_context(|| format!("Failed to replace journal: {}", self.path.display()))?;
        debug!(
            path = %self.path.display(),
            foods = journal.foods.len(),
            meals = journal.meals.len(),
            "saved journal"
        );
        Ok(())
    }

    pub fn open(&self, policy: NutritionPolicy) -> Result<NutritionService> {
        let journal = self.load()?;
        NutritionService::from_journal(journal, policy)
            .with_context(|| format!("Corrupt journal: {}", self.path.display()))
    }

    pub fn persist(&self, svc: &NutritionService) -> Result<()> {
        self.save(&svc.export())
    }
}

pub(crate) fn read_journal(path: &Path) -> Result<Journal> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read journal: {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse journal: {}", path.display()))
}
