//! Per-activation mapping from menu entries to bound invocations

use std::collections::BTreeMap;

use super::{ActionGroup, ActionId, Invocation};

/// Bindings built fresh for one activation.
///
/// Entries are keyed by group so an image inside a link keeps the link's
/// "copy link" and the image's "copy link" apart. Dropping the binding drops
/// every reference to the activation's target.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionBinding {
    entries: BTreeMap<(ActionGroup, ActionId), Invocation>,
    /// Order in which groups were bound; later groups win flat lookups
    order: Vec<ActionGroup>,
}

impl ActionBinding {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(&mut self, group: ActionGroup, invocation: Invocation) {
        if !self.order.contains(&group) {
            self.order.push(group);
        }
        self.entries.insert((group, invocation.id()), invocation);
    }

    /// Invocation bound to an entry of a specific group
    pub fn get(&self, group: ActionGroup, id: ActionId) -> Option<&Invocation> {
        self.entries.get(&(group, id))
    }

    /// Invocation for an action regardless of group; the most recently bound group wins
    pub fn lookup(&self, id: ActionId) -> Option<&Invocation> {
        self.order
            .iter()
            .rev()
            .find_map(|group| self.entries.get(&(*group, id)))
    }

    pub fn groups(&self) -> &[ActionGroup] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&(ActionGroup, ActionId), &Invocation)> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_scoped_lookup() {
        let mut binding = ActionBinding::new();
        binding.bind(
            ActionGroup::Link,
            Invocation::CopyLink {
                url: "https://example.com/post".into(),
            },
        );
        binding.bind(
            ActionGroup::Image,
            Invocation::CopyLink {
                url: "https://example.com/x.png".into(),
            },
        );

        assert_eq!(
            binding.get(ActionGroup::Link, ActionId::CopyLink),
            Some(&Invocation::CopyLink {
                url: "https://example.com/post".into()
            })
        );
        // Flat lookup follows bind order
        assert_eq!(
            binding.lookup(ActionId::CopyLink),
            Some(&Invocation::CopyLink {
                url: "https://example.com/x.png".into()
            })
        );
        assert_eq!(binding.groups(), &[ActionGroup::Link, ActionGroup::Image]);
    }

    #[test]
    fn test_rebinding_overwrites() {
        let mut binding = ActionBinding::new();
        binding.bind(ActionGroup::Text, Invocation::CopySelection { text: "a".into() });
        binding.bind(ActionGroup::Text, Invocation::CopySelection { text: "b".into() });
        assert_eq!(binding.len(), 1);
        assert_eq!(
            binding.lookup(ActionId::CopySelection),
            Some(&Invocation::CopySelection { text: "b".into() })
        );
        assert!(binding.lookup(ActionId::Paste).is_none());
    }
}
