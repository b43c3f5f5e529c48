//! Action set.
use serde::{Deserialize, Serialize};

/// An ordered, immutable list of action identifiers.
///
/// The position of an action in the set is the action index used everywhere else:
/// the `i`-th element of the action values returned by
/// [`QFunction::evaluate`](crate::QFunction::evaluate) is the value of the `i`-th action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionSet(Vec<String>);

impl ActionSet {
    /// Constructs an action set from the given names.
    ///
    /// Panics if the names are empty or contain duplicates.
    pub fn new<S: Into<String>>(names: impl IntoIterator<Item = S>) -> Self {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        assert!(!names.is_empty(), "An action set needs at least one action");
        for (i, name) in names.iter().enumerate() {
            assert!(
                !names[..i].contains(name),
                "Duplicated action name in action set: {}",
                name
            );
        }
        Self(names)
    }

    /// The number of actions.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always `false`, an action set cannot be empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the name of the action at index `ix`.
    pub fn name(&self, ix: usize) -> Option<&str> {
        self.0.get(ix).map(String::as_str)
    }

    /// Returns the index of the action with the given name.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.0.iter().position(|n| n == name)
    }

    /// Iterates over the action names in index order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}
