//! Scope tree mirroring nested plugin initialization.
//!
//! Scopes live in an arena owned by [`ScopeTree`]. Every tree carries a
//! random tag stamped into the [`ScopeId`]s it issues, so an id handed to
//! another tree is rejected rather than aliasing one of its scopes. Each
//! scope records the model identities contributed directly through it, in
//! contribution order.

use super::{ModelIdentity, ScopeError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

/// Identifier of a scope within its [`ScopeTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ScopeId {
    tree: Uuid,
    index: usize,
}

impl ScopeId {
    /// Returns the arena index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.index
    }

    /// Returns the tag of the tree that issued the id.
    #[must_use]
    pub const fn tree(self) -> Uuid {
        self.tree
    }
}

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "scope#{}", self.index)
    }
}

#[derive(Debug)]
struct ScopeNode {
    label: String,
    parent: Option<ScopeId>,
    children: Vec<ScopeId>,
    owned_model_ids: Vec<ModelIdentity>,
}

impl ScopeNode {
    const fn new(label: String, parent: Option<ScopeId>) -> Self {
        Self {
            label,
            parent,
            children: Vec::new(),
            owned_model_ids: Vec::new(),
        }
    }
}

/// Parent-pointer tree of contribution scopes with one root.
///
/// Not `Clone`: two trees sharing a tag would accept each other's ids.
#[derive(Debug)]
pub struct ScopeTree {
    tag: Uuid,
    nodes: Vec<ScopeNode>,
    owners: HashMap<ModelIdentity, ScopeId>,
}

impl ScopeTree {
    /// Creates a tree containing only the root scope.
    #[must_use]
    pub fn new(root_label: impl Into<String>) -> Self {
        Self {
            tag: Uuid::new_v4(),
            nodes: vec![ScopeNode::new(root_label.into(), None)],
            owners: HashMap::new(),
        }
    }

    /// Returns the root scope.
    #[must_use]
    pub const fn root(&self) -> ScopeId {
        self.issue(0)
    }

    /// Returns `true` when the scope was issued by this tree.
    #[must_use]
    pub fn contains(&self, scope: ScopeId) -> bool {
        scope.tree == self.tag && scope.index < self.nodes.len()
    }

    const fn issue(&self, index: usize) -> ScopeId {
        ScopeId {
            tree: self.tag,
            index,
        }
    }

    /// Returns the number of scopes, root included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always `false`: a tree has at least its root.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        false
    }

    /// Creates a scope under `parent` with no owned models.
    ///
    /// # Errors
    ///
    /// Returns [`ScopeError::UnknownScope`] when `parent` is not in this tree.
    pub fn create_child_scope(
        &mut self,
        parent: ScopeId,
        label: impl Into<String>,
    ) -> Result<ScopeId, ScopeError> {
        let child = self.issue(self.nodes.len());
        self.node_mut(parent)?.children.push(child);
        self.nodes.push(ScopeNode::new(label.into(), Some(parent)));
        Ok(child)
    }

    /// Returns the label given when the scope was created.
    ///
    /// # Errors
    ///
    /// Returns [`ScopeError::UnknownScope`] for a foreign scope.
    pub fn label(&self, scope: ScopeId) -> Result<&str, ScopeError> {
        Ok(&self.node(scope)?.label)
    }

    /// Returns the scope's parent, `None` for the root.
    ///
    /// # Errors
    ///
    /// Returns [`ScopeError::UnknownScope`] for a foreign scope.
    pub fn parent(&self, scope: ScopeId) -> Result<Option<ScopeId>, ScopeError> {
        Ok(self.node(scope)?.parent)
    }

    /// Returns the scope's children in creation order.
    ///
    /// # Errors
    ///
    /// Returns [`ScopeError::UnknownScope`] for a foreign scope.
    pub fn children(&self, scope: ScopeId) -> Result<&[ScopeId], ScopeError> {
        Ok(&self.node(scope)?.children)
    }

    /// Returns the scope that contributed `identity`, if any.
    #[must_use]
    pub fn owner_of(&self, identity: &ModelIdentity) -> Option<ScopeId> {
        self.owners.get(identity).copied()
    }

    /// Returns the model identities owned by `scope`.
    ///
    /// Without `transitive` this is exactly what the scope contributed, in
    /// order. With `transitive` the walk is pre-order: the scope's own
    /// entries, then each child subtree in creation order.
    ///
    /// # Errors
    ///
    /// Returns [`ScopeError::UnknownScope`] for a foreign scope.
    pub fn owned_models(
        &self,
        scope: ScopeId,
        transitive: bool,
    ) -> Result<Vec<ModelIdentity>, ScopeError> {
        let start = self.node(scope)?;
        if !transitive {
            return Ok(start.owned_model_ids.clone());
        }

        let mut owned = Vec::new();
        let mut pending = vec![scope];
        while let Some(next) = pending.pop() {
            let node = self.node(next)?;
            owned.extend(node.owned_model_ids.iter().cloned());
            pending.extend(node.children.iter().rev().copied());
        }
        Ok(owned)
    }

    /// Appends identities to the scope's ownership list.
    ///
    /// Callers must have checked that none of the identities is owned yet.
    pub(super) fn record_ownership(
        &mut self,
        scope: ScopeId,
        identities: impl IntoIterator<Item = ModelIdentity>,
    ) -> Result<(), ScopeError> {
        let node = self.node_mut(scope)?;
        let added: Vec<ModelIdentity> = identities.into_iter().collect();
        node.owned_model_ids.extend(added.iter().cloned());
        self.owners.extend(added.into_iter().map(|identity| (identity, scope)));
        Ok(())
    }

    fn node(&self, scope: ScopeId) -> Result<&ScopeNode, ScopeError> {
        if scope.tree != self.tag {
            return Err(ScopeError::UnknownScope(scope));
        }
        self.nodes
            .get(scope.index)
            .ok_or(ScopeError::UnknownScope(scope))
    }

    fn node_mut(&mut self, scope: ScopeId) -> Result<&mut ScopeNode, ScopeError> {
        if scope.tree != self.tag {
            return Err(ScopeError::UnknownScope(scope));
        }
        self.nodes
            .get_mut(scope.index)
            .ok_or(ScopeError::UnknownScope(scope))
    }
}
