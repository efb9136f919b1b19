//! The list of playable items shown on the player screen.
//!
//! The catalog holds a fixed set of bundled samples followed by files the user
//! picked from storage. Bundled entries are created up front and can never be
//! removed; picked entries are appended in insertion order and may be removed
//! again. Picking the same file twice yields two independent rows, each with
//! its own [`EntryId`].

use crate::error::CatalogError;
use std::fmt;
use std::path::{Path, PathBuf};

/// Stable identity of a catalog row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryId(u64);

impl EntryId {
    pub(crate) fn from_raw(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Samples that ship with the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BundledSample {
    Chime,
    Arpeggio,
}

impl BundledSample {
    /// Every bundled sample, in display order.
    pub const ALL: [BundledSample; 2] = [BundledSample::Chime, BundledSample::Arpeggio];

    pub fn display_name(self) -> &'static str {
        match self {
            BundledSample::Chime => "Sample 1",
            BundledSample::Arpeggio => "Sample 2",
        }
    }
}

/// Where a catalog entry's audio comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioSource {
    Bundled(BundledSample),
    External(PathBuf),
}

impl AudioSource {
    pub fn is_external(&self) -> bool {
        matches!(self, AudioSource::External(_))
    }

    pub fn path(&self) -> Option<&Path> {
        match self {
            AudioSource::External(path) => Some(path),
            AudioSource::Bundled(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub id: EntryId,
    pub source: AudioSource,
    pub display_name: String,
}

impl CatalogEntry {
    pub fn is_removable(&self) -> bool {
        self.source.is_external()
    }
}

pub struct Catalog {
    entries: Vec<CatalogEntry>,
    next_id: u64,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::with_bundled()
    }
}

impl Catalog {
    fn empty() -> Self {
        Self {
            entries: Vec::new(),
            next_id: 0,
        }
    }

    /// Creates the startup catalog: every bundled sample, in fixed order.
    pub fn with_bundled() -> Self {
        let mut catalog = Self::empty();
        for sample in BundledSample::ALL {
            let id = catalog.allocate_id();
            catalog.entries.push(CatalogEntry {
                id,
                source: AudioSource::Bundled(sample),
                display_name: sample.display_name().to_string(),
            });
        }
        catalog
    }

    fn allocate_id(&mut self) -> EntryId {
        let id = EntryId::from_raw(self.next_id);
        self.next_id += 1;
        id
    }

    /// Bundled entries first, then picked files in insertion order.
    pub fn list_entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: EntryId) -> Option<&CatalogEntry> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    pub fn position_of(&self, id: EntryId) -> Option<usize> {
        self.entries.iter().position(|entry| entry.id == id)
    }

    /// Appends a picked file. Duplicates are kept as separate rows.
    pub fn add_external(&mut self, path: PathBuf, display_name: impl Into<String>) -> EntryId {
        let id = self.allocate_id();
        let display_name = display_name.into();
        log::info!("Catalog: added {display_name:?} ({}) as entry {id}", path.display());
        self.entries.push(CatalogEntry {
            id,
            source: AudioSource::External(path),
            display_name,
        });
        id
    }

    /// Removes a picked file and returns it.
    pub fn remove(&mut self, id: EntryId) -> Result<CatalogEntry, CatalogError> {
        let index = self
            .position_of(id)
            .ok_or(CatalogError::UnknownEntry(id))?;

        if !self.entries[index].is_removable() {
            return Err(CatalogError::NotRemovable(
                self.entries[index].display_name.clone(),
            ));
        }

        let removed = self.entries.remove(index);
        log::info!("Catalog: removed {:?} (entry {id})", removed.display_name);
        Ok(removed)
    }
}
