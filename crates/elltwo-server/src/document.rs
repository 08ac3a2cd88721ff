//! A markdown file held as linked cells.
//!
//! On disk a document is plain markdown with cells separated by blank lines.
//! In memory each cell keeps the client's ids and links so `create`/`delete`
//! splices can be replayed exactly as the client performed them.

use std::collections::{BTreeMap, HashSet};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use elltwo_core::protocol::{CreateCell, DeleteCell, SaveCell};
use elltwo_core::{CellId, CellRecord};
use tracing::debug;

use crate::error::DocumentError;

/// Body cells of a new or empty document.
pub const BLANK_DOCUMENT: [&str; 2] = ["#! Title", "Body text."];

#[derive(Debug, Clone, PartialEq, Eq)]
struct Entry {
    prev: Option<CellId>,
    next: Option<CellId>,
    body: String,
}

#[derive(Debug, Clone)]
pub struct StoredDocument {
    path: PathBuf,
    cells: BTreeMap<CellId, Entry>,
}

impl StoredDocument {
    /// Read `path`. A missing file opens as the blank document.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, DocumentError> {
        let path = path.into();
        let text = read_text(&path).await?;
        Ok(Self::parse(path, &text))
    }

    /// Split markdown into cells on blank lines, numbering them from 0.
    pub fn parse(path: impl Into<PathBuf>, text: &str) -> Self {
        let mut bodies: Vec<&str> = text
            .split("\n\n")
            .map(str::trim)
            .filter(|piece| !piece.is_empty())
            .collect();
        if bodies.is_empty() {
            bodies = BLANK_DOCUMENT.to_vec();
        }

        let last = bodies.len() as i64 - 1;
        let cells = bodies
            .into_iter()
            .enumerate()
            .map(|(i, body)| {
                let i = i as i64;
                let entry = Entry {
                    prev: (i > 0).then(|| CellId(i - 1)),
                    next: (i < last).then(|| CellId(i + 1)),
                    body: body.to_string(),
                };
                (CellId(i), entry)
            })
            .collect();

        Self {
            path: path.into(),
            cells,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn body(&self, id: CellId) -> Option<&str> {
        self.cells.get(&id).map(|entry| entry.body.as_str())
    }

    /// Discard in-memory changes and read the file again.
    pub async fn reload(&mut self) -> Result<(), DocumentError> {
        let text = read_text(&self.path).await?;
        self.cells = Self::parse(&self.path, &text).cells;
        Ok(())
    }

    /// Splice a new empty cell between `prev` and `next`.
    pub fn create(&mut self, create: &CreateCell) -> Result<(), DocumentError> {
        if self.cells.contains_key(&create.newid) {
            return Err(DocumentError::Duplicate(create.newid));
        }
        self.check_links(create.prev, create.next)?;

        if let Some(prev) = create.prev.and_then(|id| self.cells.get_mut(&id)) {
            prev.next = Some(create.newid);
        }
        if let Some(next) = create.next.and_then(|id| self.cells.get_mut(&id)) {
            next.prev = Some(create.newid);
        }
        self.cells.insert(
            create.newid,
            Entry {
                prev: create.prev,
                next: create.next,
                body: String::new(),
            },
        );
        debug!(cid = %create.newid, "created cell");
        Ok(())
    }

    /// Remove a cell, joining the neighbors the client reports.
    pub fn delete(&mut self, delete: &DeleteCell) -> Result<(), DocumentError> {
        if !self.cells.contains_key(&delete.cid) {
            return Err(DocumentError::UnknownCell(delete.cid));
        }
        self.check_links(delete.prev, delete.next)?;

        self.cells.remove(&delete.cid);
        if let Some(prev) = delete.prev.and_then(|id| self.cells.get_mut(&id)) {
            prev.next = delete.next;
        }
        if let Some(next) = delete.next.and_then(|id| self.cells.get_mut(&id)) {
            next.prev = delete.prev;
        }
        debug!(cid = %delete.cid, "deleted cell");
        Ok(())
    }

    pub fn save(&mut self, save: &SaveCell) -> Result<(), DocumentError> {
        let entry = self
            .cells
            .get_mut(&save.cid)
            .ok_or(DocumentError::UnknownCell(save.cid))?;
        entry.body.clone_from(&save.body);
        Ok(())
    }

    /// Cells in link order, as sent in a load.
    pub fn records(&self) -> Vec<CellRecord> {
        self.walk()
            .map(|(id, entry)| CellRecord {
                cid: id,
                body: entry.body.clone(),
                prev: entry.prev,
                next: entry.next,
            })
            .collect()
    }

    /// Cell bodies in link order joined by blank lines.
    pub fn to_markdown(&self) -> String {
        self.walk()
            .map(|(_, entry)| entry.body.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Write the markdown to a sibling temp file and rename it into place.
    pub async fn write(&self) -> Result<(), DocumentError> {
        let write_err = |path: &Path| {
            let path = path.to_path_buf();
            move |source: std::io::Error| DocumentError::Write { path, source }
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(write_err(parent))?;
        }

        let temp = temp_sibling(&self.path);
        tokio::fs::write(&temp, self.to_markdown())
            .await
            .map_err(write_err(&temp))?;
        tokio::fs::rename(&temp, &self.path)
            .await
            .map_err(write_err(&self.path))?;
        debug!(path = %self.path.display(), cells = self.cells.len(), "wrote document");
        Ok(())
    }

    fn check_links(&self, prev: Option<CellId>, next: Option<CellId>) -> Result<(), DocumentError> {
        for id in prev.into_iter().chain(next) {
            if !self.cells.contains_key(&id) {
                return Err(DocumentError::UnknownCell(id));
            }
        }
        Ok(())
    }

    /// Follow `next` from the head. Stops at a repeated id.
    fn walk(&self) -> impl Iterator<Item = (CellId, &Entry)> {
        let mut seen = HashSet::new();
        let mut cursor = self
            .cells
            .iter()
            .find(|(_, entry)| entry.prev.is_none())
            .map(|(id, _)| *id);

        std::iter::from_fn(move || {
            let id = cursor.filter(|id| seen.insert(*id))?;
            let entry = self.cells.get(&id)?;
            cursor = entry.next;
            Some((id, entry))
        })
    }
}

async fn read_text(path: &Path) -> Result<String, DocumentError> {
    match tokio::fs::read_to_string(path).await {
        Ok(text) => Ok(text),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(String::new()),
        Err(source) => Err(DocumentError::Read {
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn temp_sibling(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{name}.tmp"))
}
