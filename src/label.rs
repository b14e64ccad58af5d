//! Label table (§4.D): the bijection between host-chosen 64-bit [`Label`]s and
//! index-assigned dense 32-bit [`InnerId`]s.

use std::collections::HashMap;

use crate::Error;

/// Host-chosen external identifier. Unique per index.
pub type Label = u64;

/// Index-assigned dense internal identifier. Never reused within an index.
pub type InnerId = u32;

/// Forward map `Label -> InnerId` plus inverse `InnerId -> Label`.
///
/// Insertion order of the inverse vector matches `InnerId` assignment order,
/// so `inverse[i]` is always the label of the `i`-th vector ever inserted.
#[derive(Debug, Default, Clone)]
pub struct LabelTable {
    forward: HashMap<Label, InnerId>,
    inverse: Vec<Label>,
}

impl LabelTable {
    /// Create an empty label table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of labels currently registered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inverse.len()
    }

    /// True if no labels are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inverse.is_empty()
    }

    /// Allocate the next dense `InnerId` and bind it to `label`.
    ///
    /// Fails with [`Error::DuplicateLabel`] if `label` is already present;
    /// the table is left unchanged in that case.
    pub fn insert(&mut self, label: Label) -> Result<InnerId, Error> {
        if self.forward.contains_key(&label) {
            return Err(Error::DuplicateLabel(label));
        }
        let inner_id = self.inverse.len() as InnerId;
        self.inverse.push(label);
        self.forward.insert(label, inner_id);
        Ok(inner_id)
    }

    /// Resolve an `InnerId` to its label. `O(1)`.
    #[must_use]
    pub fn get_label(&self, inner_id: InnerId) -> Option<Label> {
        self.inverse.get(inner_id as usize).copied()
    }

    /// Resolve a label to its `InnerId`. `O(1)`.
    #[must_use]
    pub fn get_inner(&self, label: Label) -> Option<InnerId> {
        self.forward.get(&label).copied()
    }

    /// True if `label` is already registered.
    #[must_use]
    pub fn contains(&self, label: Label) -> bool {
        self.forward.contains_key(&label)
    }

    /// Iterate all `(InnerId, Label)` pairs in assignment order.
    pub fn iter(&self) -> impl Iterator<Item = (InnerId, Label)> + '_ {
        self.inverse
            .iter()
            .enumerate()
            .map(|(i, &label)| (i as InnerId, label))
    }

    /// Rebuild a label table from a serialized inverse vector (used by deserialize).
    #[must_use]
    pub fn from_inverse(inverse: Vec<Label>) -> Self {
        let mut forward = HashMap::with_capacity(inverse.len());
        for (i, &label) in inverse.iter().enumerate() {
            forward.insert(label, i as InnerId);
        }
        Self { forward, inverse }
    }

    /// Borrow the inverse vector, e.g. for serialization.
    #[must_use]
    pub fn inverse_slice(&self) -> &[Label] {
        &self.inverse
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bijection_holds() {
        let mut t = LabelTable::new();
        let i0 = t.insert(100).unwrap();
        let i1 = t.insert(200).unwrap();
        assert_eq!(t.get_label(i0), Some(100));
        assert_eq!(t.get_label(i1), Some(200));
        assert_eq!(t.get_inner(100), Some(i0));
        assert_eq!(t.get_inner(200), Some(i1));
    }

    #[test]
    fn duplicate_label_rejected() {
        let mut t = LabelTable::new();
        t.insert(7).unwrap();
        let err = t.insert(7).unwrap_err();
        assert!(matches!(err, Error::DuplicateLabel(7)));
        assert_eq!(t.len(), 1);
    }

    #[test]
    fn inner_ids_are_dense_and_ordered() {
        let mut t = LabelTable::new();
        for label in [10u64, 20, 30] {
            t.insert(label).unwrap();
        }
        assert_eq!(t.inverse_slice(), &[10, 20, 30]);
    }

    #[test]
    fn from_inverse_rebuilds_forward_map() {
        let t = LabelTable::from_inverse(vec![5, 9, 1]);
        assert_eq!(t.get_inner(9), Some(1));
        assert_eq!(t.get_label(2), Some(1));
    }
}
