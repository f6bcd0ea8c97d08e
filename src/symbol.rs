//! Symbolic labels.
//!
//! Entry and exit points both name addresses. An address may be named by both, so
//! every label is kept in the order it was added instead of overwriting.

use std::collections::BTreeMap;

/// Where a label came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LabelKind {
    /// An externally visible symbol defined by the image.
    Entry,
    /// A call into a dynamically linked symbol.
    Exit,
}

/// A named address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub address: u64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    pub name: String,
    pub kind: LabelKind,
}

/// Address to label mapping.
#[derive(Debug, Clone, Default)]
pub struct LabelTable {
    labels: BTreeMap<u64, Vec<Label>>,
}

impl LabelTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, address: u64, name: impl Into<String>, kind: LabelKind) {
        let name = name.into();
        let existing = self.labels.entry(address).or_default();
        if let Some(previous) = existing.last() {
            tracing::debug!(
                "Label collision at {:#x}: {} ({:?}) after {} ({:?})",
                address,
                name,
                kind,
                previous.name,
                previous.kind
            );
        }
        existing.push(Label { name, kind });
    }

    /// The most recently added name at `address`.
    pub fn get(&self, address: u64) -> Option<&str> {
        self.labels
            .get(&address)
            .and_then(|labels| labels.last())
            .map(|label| label.name.as_str())
    }

    /// Every label at `address`, oldest first.
    pub fn all(&self, address: u64) -> &[Label] {
        self.labels.get(&address).map_or(&[], Vec::as_slice)
    }

    /// Addresses carrying more than one label.
    pub fn collisions(&self) -> impl Iterator<Item = (u64, &[Label])> + '_ {
        self.labels
            .iter()
            .filter(|(_, labels)| labels.len() > 1)
            .map(|(address, labels)| (*address, labels.as_slice()))
    }

    /// Number of labelled addresses.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_added_wins_but_nothing_is_lost() {
        let mut table = LabelTable::new();
        table.insert(0x1005, "puts", LabelKind::Exit);
        table.insert(0x1005, "main", LabelKind::Entry);
        table.insert(0x2000, "exit", LabelKind::Exit);

        assert_eq!(table.get(0x1005), Some("main"));
        assert_eq!(table.all(0x1005).len(), 2);
        assert_eq!(table.all(0x1005)[0].kind, LabelKind::Exit);
        assert_eq!(table.get(0x3000), None);
        assert!(table.all(0x3000).is_empty());

        let collisions: Vec<u64> = table.collisions().map(|(address, _)| address).collect();
        assert_eq!(collisions, vec![0x1005]);
        assert_eq!(table.len(), 2);
    }
}
