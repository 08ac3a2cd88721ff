//! Cell identity and the cell record held by the store.

use std::fmt;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::edit::EditBuffer;

/// Wire value standing in for "no neighbor" at either end of the list.
pub const SENTINEL: i64 = -1;

/// Identifier of a cell, unique within a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CellId(pub i64);

impl CellId {
    pub fn get(self) -> i64 {
        self.0
    }

    /// The id following this one, or `None` past `i64::MAX`.
    pub fn succ(self) -> Option<Self> {
        self.0.checked_add(1).map(Self)
    }
}

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for CellId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl Serialize for CellId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(self.0)
    }
}

/// Accepts integers and numeric strings. Browser clients read ids back out of
/// element attributes and send them as strings.
struct CellIdVisitor;

impl Visitor<'_> for CellIdVisitor {
    type Value = i64;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an integer cell id or a numeric string")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<i64, E> {
        Ok(v)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<i64, E> {
        i64::try_from(v).map_err(|_| E::custom(format!("cell id {v} out of range")))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<i64, E> {
        v.trim()
            .parse()
            .map_err(|_| E::custom(format!("invalid cell id {v:?}")))
    }
}

impl<'de> Deserialize<'de> for CellId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(CellIdVisitor).map(CellId)
    }
}

/// Serde adapter mapping `Option<CellId>` to the wire sentinel.
///
/// `None` is written as `-1`, and `-1` (or `"-1"`) reads back as `None`.
pub mod link {
    use super::*;

    pub fn serialize<S: Serializer>(link: &Option<CellId>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(link.map(CellId::get).unwrap_or(SENTINEL))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<CellId>, D::Error> {
        let raw = deserializer.deserialize_any(CellIdVisitor)?;
        Ok(from_raw(raw))
    }

    /// Convert a raw wire value to a link.
    pub fn from_raw(raw: i64) -> Option<CellId> {
        (raw != SENTINEL).then_some(CellId(raw))
    }
}

/// One paragraph-like unit of document content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    pub id: CellId,
    pub prev: Option<CellId>,
    pub next: Option<CellId>,
    /// Last committed source text. Authoritative while frozen.
    pub text: String,
    /// Live raw-text form. Present only while the cell is editing.
    pub edit: Option<EditBuffer>,
    /// The edit buffer changed since the last commit to `text`.
    pub modified: bool,
}

impl Cell {
    pub fn new(id: CellId, text: impl Into<String>) -> Self {
        Self {
            id,
            prev: None,
            next: None,
            text: text.into(),
            edit: None,
            modified: false,
        }
    }

    pub fn linked(id: CellId, prev: Option<CellId>, next: Option<CellId>, text: impl Into<String>) -> Self {
        Self {
            prev,
            next,
            ..Self::new(id, text)
        }
    }

    pub fn is_editing(&self) -> bool {
        self.edit.is_some()
    }
}
