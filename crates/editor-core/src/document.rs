use std::collections::{BTreeSet, HashMap, VecDeque};

use crate::node::{Node, NodeKey, char_len};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TreeError {
    #[error("node {0} does not exist")]
    MissingNode(NodeKey),
    #[error("node {0} cannot hold children")]
    NotContainer(NodeKey),
    #[error("node {0} does not carry text")]
    NotTextBearing(NodeKey),
    #[error("moving {child} under {parent} would create a cycle")]
    CycleDetected { parent: NodeKey, child: NodeKey },
    #[error("the root node cannot be moved or removed")]
    RootImmovable,
    #[error("node {0} is not attached to a parent")]
    Detached(NodeKey),
}

#[derive(Debug, Clone, PartialEq)]
struct Slot {
    node: Node,
    parent: Option<NodeKey>,
    children: Vec<NodeKey>,
}

/// Arena-backed document tree. Node values are immutable; edits replace slot contents.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    slots: HashMap<NodeKey, Slot>,
    root: NodeKey,
    next_key: u32,
    dirty: BTreeSet<NodeKey>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        let root = NodeKey(0);
        let mut slots = HashMap::new();
        slots.insert(
            root,
            Slot {
                node: Node::Root,
                parent: None,
                children: Vec::new(),
            },
        );
        Self {
            slots,
            root,
            next_key: 1,
            dirty: BTreeSet::new(),
        }
    }

    pub fn root(&self) -> NodeKey {
        self.root
    }

    pub fn contains(&self, key: NodeKey) -> bool {
        self.slots.contains_key(&key)
    }

    pub fn create(&mut self, node: Node) -> NodeKey {
        let key = NodeKey(self.next_key);
        self.next_key += 1;
        self.slots.insert(
            key,
            Slot {
                node,
                parent: None,
                children: Vec::new(),
            },
        );
        self.dirty.insert(key);
        key
    }

    pub fn get(&self, key: NodeKey) -> Option<&Node> {
        self.slots.get(&key).map(|slot| &slot.node)
    }

    pub fn node(&self, key: NodeKey) -> Result<&Node, TreeError> {
        self.get(key).ok_or(TreeError::MissingNode(key))
    }

    pub fn parent(&self, key: NodeKey) -> Option<NodeKey> {
        self.slots.get(&key).and_then(|slot| slot.parent)
    }

    pub fn children(&self, key: NodeKey) -> &[NodeKey] {
        self.slots
            .get(&key)
            .map(|slot| slot.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn index_in_parent(&self, key: NodeKey) -> Option<usize> {
        let parent = self.parent(key)?;
        self.children(parent).iter().position(|k| *k == key)
    }

    pub fn previous_sibling(&self, key: NodeKey) -> Option<NodeKey> {
        let parent = self.parent(key)?;
        let ix = self.index_in_parent(key)?;
        ix.checked_sub(1)
            .and_then(|prev| self.children(parent).get(prev).copied())
    }

    pub fn next_sibling(&self, key: NodeKey) -> Option<NodeKey> {
        let parent = self.parent(key)?;
        let ix = self.index_in_parent(key)?;
        self.children(parent).get(ix + 1).copied()
    }

    /// Siblings left of `key`, in document order.
    pub fn previous_siblings(&self, key: NodeKey) -> Vec<NodeKey> {
        match (self.parent(key), self.index_in_parent(key)) {
            (Some(parent), Some(ix)) => self.children(parent)[..ix].to_vec(),
            _ => Vec::new(),
        }
    }

    pub fn next_siblings(&self, key: NodeKey) -> Vec<NodeKey> {
        match (self.parent(key), self.index_in_parent(key)) {
            (Some(parent), Some(ix)) => self.children(parent)[ix + 1..].to_vec(),
            _ => Vec::new(),
        }
    }

    pub fn is_attached(&self, key: NodeKey) -> bool {
        let mut current = key;
        loop {
            if current == self.root {
                return true;
            }
            match self.parent(current) {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    pub fn text_content(&self, key: NodeKey) -> String {
        let mut out = String::new();
        self.push_text_content(key, &mut out);
        out
    }

    fn push_text_content(&self, key: NodeKey, out: &mut String) {
        match self.get(key) {
            Some(node) if node.is_text_bearing() => {
                out.push_str(node.text_str().unwrap_or_default());
            }
            Some(node) if node.is_container() => {
                for child in self.children(key) {
                    self.push_text_content(*child, out);
                }
            }
            _ => {}
        }
    }

    pub fn text_len(&self, key: NodeKey) -> usize {
        char_len(&self.text_content(key))
    }

    /// Child indices from the root down to `key`; `None` for detached nodes.
    pub fn path(&self, key: NodeKey) -> Option<Vec<usize>> {
        let mut path = Vec::new();
        let mut current = key;
        while current != self.root {
            path.push(self.index_in_parent(current)?);
            current = self.parent(current)?;
        }
        path.reverse();
        Some(path)
    }

    pub fn is_before(&self, a: NodeKey, b: NodeKey) -> bool {
        match (self.path(a), self.path(b)) {
            (Some(a), Some(b)) => a < b,
            _ => false,
        }
    }

    pub fn is_ancestor_of(&self, ancestor: NodeKey, key: NodeKey) -> bool {
        let mut current = self.parent(key);
        while let Some(k) = current {
            if k == ancestor {
                return true;
            }
            current = self.parent(k);
        }
        false
    }

    /// Walks up from `key` (inclusive) and returns the first node matching `pred`.
    pub fn find_matching_parent(
        &self,
        key: NodeKey,
        pred: impl Fn(&Node) -> bool,
    ) -> Option<NodeKey> {
        let mut current = Some(key);
        while let Some(k) = current {
            if self.get(k).is_some_and(&pred) {
                return Some(k);
            }
            current = self.parent(k);
        }
        None
    }

    pub fn nearest_block(&self, key: NodeKey) -> Option<NodeKey> {
        self.find_matching_parent(key, Node::is_block)
    }

    /// Pre-order descendants of `key`, excluding `key` itself.
    pub fn descendants(&self, key: NodeKey) -> Vec<NodeKey> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeKey> = self.children(key).iter().rev().copied().collect();
        while let Some(k) = stack.pop() {
            out.push(k);
            stack.extend(self.children(k).iter().rev().copied());
        }
        out
    }

    pub fn last_text_descendant(&self, key: NodeKey) -> Option<NodeKey> {
        std::iter::once(key)
            .chain(self.descendants(key))
            .filter(|k| self.get(*k).is_some_and(Node::is_text_bearing))
            .last()
    }

    /// First attached text-bearing node, in document order, whose text is exactly `text`.
    pub fn find_text(&self, text: &str) -> Option<NodeKey> {
        self.descendants(self.root)
            .into_iter()
            .find(|k| self.get(*k).and_then(Node::text_str) == Some(text))
    }

    pub fn mark_dirty(&mut self, key: NodeKey) {
        if self.slots.contains_key(&key) {
            self.dirty.insert(key);
        }
    }

    pub(crate) fn take_dirty(&mut self) -> BTreeSet<NodeKey> {
        std::mem::take(&mut self.dirty)
    }

    pub fn set_node(&mut self, key: NodeKey, node: Node) -> Result<(), TreeError> {
        let slot = self.slots.get_mut(&key).ok_or(TreeError::MissingNode(key))?;
        if !node.is_container() && !slot.children.is_empty() {
            return Err(TreeError::NotContainer(key));
        }
        if key == self.root && node != Node::Root {
            return Err(TreeError::RootImmovable);
        }
        slot.node = node;
        self.dirty.insert(key);
        Ok(())
    }

    fn detach(&mut self, key: NodeKey) -> Result<(), TreeError> {
        if key == self.root {
            return Err(TreeError::RootImmovable);
        }
        let slot = self.slots.get_mut(&key).ok_or(TreeError::MissingNode(key))?;
        let Some(parent) = slot.parent.take() else {
            return Ok(());
        };
        if let Some(parent_slot) = self.slots.get_mut(&parent) {
            parent_slot.children.retain(|k| *k != key);
        }
        self.dirty.insert(parent);
        self.dirty.insert(key);
        Ok(())
    }

    fn check_can_adopt(&self, parent: NodeKey, child: NodeKey) -> Result<(), TreeError> {
        if !self.node(parent)?.is_container() {
            return Err(TreeError::NotContainer(parent));
        }
        self.node(child)?;
        if child == self.root {
            return Err(TreeError::RootImmovable);
        }
        if child == parent || self.is_ancestor_of(child, parent) {
            return Err(TreeError::CycleDetected { parent, child });
        }
        Ok(())
    }

    fn insert_at(
        &mut self,
        parent: NodeKey,
        index: usize,
        child: NodeKey,
    ) -> Result<(), TreeError> {
        self.check_can_adopt(parent, child)?;
        self.detach(child)?;
        let parent_slot = self
            .slots
            .get_mut(&parent)
            .ok_or(TreeError::MissingNode(parent))?;
        let index = index.min(parent_slot.children.len());
        parent_slot.children.insert(index, child);
        if let Some(child_slot) = self.slots.get_mut(&child) {
            child_slot.parent = Some(parent);
        }
        self.dirty.insert(parent);
        self.dirty.insert(child);
        Ok(())
    }

    /// Moves `children` to the end of `parent`, detaching each from its current parent first.
    pub fn append(&mut self, parent: NodeKey, children: &[NodeKey]) -> Result<(), TreeError> {
        for &child in children {
            let end = self.children(parent).len();
            self.insert_at(parent, end, child)?;
        }
        Ok(())
    }

    pub fn insert_before(&mut self, anchor: NodeKey, key: NodeKey) -> Result<(), TreeError> {
        let parent = self.parent(anchor).ok_or(TreeError::Detached(anchor))?;
        self.detach(key)?;
        let ix = self
            .index_in_parent(anchor)
            .ok_or(TreeError::Detached(anchor))?;
        self.insert_at(parent, ix, key)
    }

    pub fn insert_after(&mut self, anchor: NodeKey, key: NodeKey) -> Result<(), TreeError> {
        let parent = self.parent(anchor).ok_or(TreeError::Detached(anchor))?;
        self.detach(key)?;
        let ix = self
            .index_in_parent(anchor)
            .ok_or(TreeError::Detached(anchor))?;
        self.insert_at(parent, ix + 1, key)
    }

    pub fn remove(&mut self, key: NodeKey) -> Result<(), TreeError> {
        self.node(key)?;
        self.detach(key)
    }

    pub fn clear(&mut self, key: NodeKey) -> Result<(), TreeError> {
        self.node(key)?;
        for child in self.children(key).to_vec() {
            self.detach(child)?;
        }
        Ok(())
    }

    /// Puts `new` where `old` sits and detaches `old`. Children of `old` stay with `old`.
    pub fn replace(&mut self, old: NodeKey, new: NodeKey) -> Result<(), TreeError> {
        if old == new {
            return Ok(());
        }
        self.insert_before(old, new)?;
        self.detach(old)
    }

    /// Drops every slot that is no longer reachable from the root.
    pub(crate) fn collect_garbage(&mut self) -> usize {
        let mut reachable: BTreeSet<NodeKey> = BTreeSet::new();
        let mut queue = VecDeque::from([self.root]);
        while let Some(key) = queue.pop_front() {
            if reachable.insert(key) {
                queue.extend(self.children(key).iter().copied());
            }
        }
        let before = self.slots.len();
        self.slots.retain(|key, _| reachable.contains(key));
        self.dirty.retain(|key| reachable.contains(key));
        before - self.slots.len()
    }
}
