//! Layered collection
//!
//! A tree whose interior nodes hold further nodes and whose leaves are
//! `TrackerList`s of items. Iteration flattens the tree depth-first, leaves
//! only, which is the draw order. Appending an item always lands in the last
//! leaf reachable by descending into last children, so callers can treat the
//! whole structure as one append target while the layering stays intact.
//!
//! The borrow checker rules out mutating the tree while an iterator over it
//! is alive, so there is no restart-after-mutation case to handle.

use super::tracker::{Identity, Tracked, TrackerList};

/// A child of a `LayeredList`: either more layers or a leaf of items
#[derive(Debug)]
pub enum Node<T: Tracked> {
    Layered(LayeredList<T>),
    Leaf(TrackerList<T>),
}

impl<T: Tracked> Node<T> {
    pub fn leaf() -> Self {
        Node::Leaf(TrackerList::new())
    }

    /// Append to this node, descending into last children until a leaf takes it.
    ///
    /// Gives the item back if no leaf is reachable.
    pub fn push(&mut self, item: T) -> Result<(), T> {
        match self {
            Node::Leaf(list) => {
                list.push(item);
                Ok(())
            }
            Node::Layered(layers) => layers.push(item),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Node::Leaf(list) => list.len(),
            Node::Layered(layers) => layers.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn count(&self, item: &T) -> usize {
        match self {
            Node::Leaf(list) => list.count(item),
            Node::Layered(layers) => layers.count(item),
        }
    }

    pub fn iter(&self) -> Iter<'_, T> {
        match self {
            Node::Leaf(list) => Iter {
                stack: Vec::new(),
                leaf: Some(list.iter()),
            },
            Node::Layered(layers) => layers.iter(),
        }
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, T> {
        match self {
            Node::Leaf(list) => IterMut {
                stack: Vec::new(),
                leaf: Some(list.iter_mut()),
            },
            Node::Layered(layers) => layers.iter_mut(),
        }
    }

    fn extract_if<F: FnMut(&T) -> bool>(&mut self, pred: &mut F) -> Vec<T> {
        match self {
            Node::Leaf(list) => list.extract_if(|x| pred(x)),
            Node::Layered(layers) => layers.extract_if_inner(pred),
        }
    }

    fn take_all(&mut self) -> Vec<T> {
        match self {
            Node::Leaf(list) => list.take_all(),
            Node::Layered(layers) => layers.take_all(),
        }
    }
}

impl<T: Tracked> From<TrackerList<T>> for Node<T> {
    fn from(list: TrackerList<T>) -> Self {
        Node::Leaf(list)
    }
}

impl<T: Tracked> From<LayeredList<T>> for Node<T> {
    fn from(layers: LayeredList<T>) -> Self {
        Node::Layered(layers)
    }
}

/// A tree of item lists presenting one flattened sequence
#[derive(Debug)]
pub struct LayeredList<T: Tracked> {
    children: Vec<Node<T>>,
}

impl<T: Tracked> Default for LayeredList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Tracked> LayeredList<T> {
    pub fn new() -> Self {
        Self {
            children: Vec::new(),
        }
    }

    /// A flat list of `n` empty leaves
    pub fn with_leaves(n: usize) -> Self {
        Self {
            children: (0..n).map(|_| Node::leaf()).collect(),
        }
    }

    /// Add a node as a new last child
    pub fn push_node(&mut self, node: impl Into<Node<T>>) {
        self.children.push(node.into());
    }

    /// Append an item to the last leaf.
    ///
    /// Gives the item back if the last child chain ends without a leaf.
    pub fn push(&mut self, item: T) -> Result<(), T> {
        match self.children.last_mut() {
            Some(node) => node.push(item),
            None => Err(item),
        }
    }

    /// Number of immediate children
    pub fn layer_count(&self) -> usize {
        self.children.len()
    }

    pub fn layer(&self, index: usize) -> Option<&Node<T>> {
        self.children.get(index)
    }

    pub fn layer_mut(&mut self, index: usize) -> Option<&mut Node<T>> {
        self.children.get_mut(index)
    }

    /// Total number of items across all leaves
    pub fn len(&self) -> usize {
        self.children.iter().map(Node::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sum of identity counts across all children
    pub fn count(&self, item: &T) -> usize {
        self.children.iter().map(|c| c.count(item)).sum()
    }

    pub fn contains(&self, item: &T) -> bool {
        self.count(item) > 0
    }

    pub fn find(&self, id: Identity) -> Option<&T> {
        self.iter().find(|x| x.identity() == id)
    }

    pub fn find_mut(&mut self, id: Identity) -> Option<&mut T> {
        self.iter_mut().find(|x| x.identity() == id)
    }

    /// Depth-first iteration over every leaf item
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            stack: vec![self.children.iter()],
            leaf: None,
        }
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, T> {
        IterMut {
            stack: vec![self.children.iter_mut()],
            leaf: None,
        }
    }

    /// Remove and return every item matching `pred`, from every leaf
    pub fn extract_if<F: FnMut(&T) -> bool>(&mut self, mut pred: F) -> Vec<T> {
        self.extract_if_inner(&mut pred)
    }

    fn extract_if_inner<F: FnMut(&T) -> bool>(&mut self, pred: &mut F) -> Vec<T> {
        let mut removed = Vec::new();
        for child in &mut self.children {
            removed.extend(child.extract_if(pred));
        }
        removed
    }

    /// Take every item out in iteration order, keeping the layer structure
    pub fn take_all(&mut self) -> Vec<T> {
        let mut out = Vec::new();
        for child in &mut self.children {
            out.extend(child.take_all());
        }
        out
    }
}

/// Depth-first, leaves-only iterator with an explicit stack of child iterators
pub struct Iter<'a, T: Tracked> {
    stack: Vec<std::slice::Iter<'a, Node<T>>>,
    leaf: Option<std::slice::Iter<'a, T>>,
}

impl<'a, T: Tracked> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        loop {
            if let Some(leaf) = &mut self.leaf {
                if let Some(item) = leaf.next() {
                    return Some(item);
                }
                self.leaf = None;
            }
            let top = self.stack.last_mut()?;
            match top.next() {
                Some(Node::Leaf(list)) => self.leaf = Some(list.iter()),
                Some(Node::Layered(layers)) => self.stack.push(layers.children.iter()),
                None => {
                    self.stack.pop();
                }
            }
        }
    }
}

pub struct IterMut<'a, T: Tracked> {
    stack: Vec<std::slice::IterMut<'a, Node<T>>>,
    leaf: Option<std::slice::IterMut<'a, T>>,
}

impl<'a, T: Tracked> Iterator for IterMut<'a, T> {
    type Item = &'a mut T;

    fn next(&mut self) -> Option<&'a mut T> {
        loop {
            if let Some(leaf) = &mut self.leaf {
                if let Some(item) = leaf.next() {
                    return Some(item);
                }
                self.leaf = None;
            }
            let top = self.stack.last_mut()?;
            match top.next() {
                Some(Node::Leaf(list)) => self.leaf = Some(list.iter_mut()),
                Some(Node::Layered(layers)) => self.stack.push(layers.children.iter_mut()),
                None => {
                    self.stack.pop();
                }
            }
        }
    }
}

impl<'a, T: Tracked> IntoIterator for &'a LayeredList<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, T: Tracked> IntoIterator for &'a mut LayeredList<T> {
    type Item = &'a mut T;
    type IntoIter = IterMut<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}
