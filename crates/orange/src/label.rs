//! Lookup of ids by label.

use std::collections::BTreeMap;

pub use orange_ir::Label;

use crate::id::OpaqueId;

/// Map between labels and a dense range of ids.
///
/// Several ids can share a name; the extension usually tells them apart.
/// Duplicate exact labels are allowed but reported when the map is built.
#[derive(Debug, Clone)]
pub struct LabelIdMultiMap<Tag> {
    labels: Vec<Label>,
    // Sorted by label, then by id
    index: Vec<(Label, OpaqueId<Tag>)>,
    duplicates: Vec<OpaqueId<Tag>>,
}

impl<Tag> LabelIdMultiMap<Tag> {
    /// Build from labels ordered by id.
    ///
    /// `kind` names the labeled entity in the duplicate warning.
    pub fn new(kind: &str, labels: Vec<Label>) -> Self {
        let mut index: Vec<_> = labels
            .iter()
            .enumerate()
            .map(|(i, l)| (l.clone(), OpaqueId::from_usize(i)))
            .collect();
        index.sort();

        let duplicates: Vec<_> = index
            .windows(2)
            .filter(|w| w[0].0 == w[1].0)
            .map(|w| w[1].1)
            .collect();
        if !duplicates.is_empty() {
            let names: Vec<String> = duplicates
                .iter()
                .map(|id| labels[id.get()].to_string())
                .collect();
            tracing::warn!(
                kind,
                count = duplicates.len(),
                "duplicate labels: {}",
                names.join(", ")
            );
        }

        Self {
            labels,
            index,
            duplicates,
        }
    }

    /// Number of labeled ids.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Whether there are no labels.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Label of an id.
    pub fn get(&self, id: OpaqueId<Tag>) -> &Label {
        &self.labels[id.get()]
    }

    /// All ids whose label has this name, in ascending order.
    pub fn find_all(&self, name: &str) -> Vec<OpaqueId<Tag>> {
        let start = self.index.partition_point(|(l, _)| l.name.as_str() < name);
        self.index[start..]
            .iter()
            .take_while(|(l, _)| l.name == name)
            .map(|(_, id)| *id)
            .collect()
    }

    /// The lowest id with exactly this label, or null.
    pub fn find_exact(&self, label: &Label) -> OpaqueId<Tag> {
        let start = self.index.partition_point(|(l, _)| l < label);
        match self.index.get(start) {
            Some((l, id)) if l == label => *id,
            _ => OpaqueId::null(),
        }
    }

    /// Ids whose labels duplicate an earlier id's label.
    pub fn duplicates(&self) -> &[OpaqueId<Tag>] {
        &self.duplicates
    }

    /// Labels in id order.
    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    /// Count ids per distinct name.
    pub fn name_counts(&self) -> BTreeMap<&str, usize> {
        let mut counts = BTreeMap::new();
        for l in &self.labels {
            *counts.entry(l.name.as_str()).or_insert(0) += 1;
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::VolumeId;

    fn make_map() -> LabelIdMultiMap<crate::id::VolumeTag> {
        LabelIdMultiMap::new(
            "volume",
            vec![
                Label::new("outside", "world"),
                Label::new("box", "world"),
                Label::new("box", "inner"),
                Label::new("ball", ""),
                Label::new("box", "world"),
            ],
        )
    }

    #[test]
    fn test_find() {
        let m = make_map();
        assert_eq!(m.len(), 5);
        assert_eq!(
            m.find_all("box"),
            vec![VolumeId::new(2), VolumeId::new(1), VolumeId::new(4)]
        );
        assert!(m.find_all("missing").is_empty());
        assert_eq!(m.find_exact(&Label::new("box", "inner")), VolumeId::new(2));
        assert_eq!(m.find_exact(&Label::new("box", "world")), VolumeId::new(1));
        assert!(!m.find_exact(&Label::from("box")).is_valid());
        assert_eq!(m.get(VolumeId::new(3)).to_string(), "ball");
    }

    #[test]
    fn test_duplicates() {
        let m = make_map();
        assert_eq!(m.duplicates(), &[VolumeId::new(4)]);
        assert_eq!(m.name_counts()["box"], 3);
    }
}
