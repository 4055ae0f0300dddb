//! Ordered node index: a B-tree of fixed branching order.
//!
//! A tree of order `O` keeps at most `O - 1` entries and `O` children per node. Every
//! non-root node holds at least `ceil(O / 2) - 1` entries and all leaves sit at the same
//! depth, so lookups, inserts and removals touch `O(log_O n)` nodes.

use diablo_types::{GraphConfig, GraphError, DEFAULT_ORDER};
use std::borrow::Borrow;
use std::mem;
use std::ops::{Bound, RangeBounds};

#[derive(Debug, Clone)]
struct Node<K, V> {
    /// Strictly increasing by key.
    entries: Vec<(K, V)>,
    /// Empty for leaves, `entries.len() + 1` otherwise.
    children: Vec<Node<K, V>>,
}

impl<K, V> Default for Node<K, V> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            children: Vec::new(),
        }
    }
}

enum InsertResult<K, V> {
    Replaced(V),
    Fit,
    /// The node overflowed: the median moves up and `Node` becomes its right sibling.
    Split((K, V), Node<K, V>),
}

impl<K: Ord, V> Node<K, V> {
    fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    fn find<Q>(&self, key: &Q) -> Result<usize, usize>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.entries.binary_search_by(|(k, _)| k.borrow().cmp(key))
    }

    fn insert(&mut self, key: K, value: V, order: usize) -> InsertResult<K, V> {
        match self.find(&key) {
            Ok(i) => return InsertResult::Replaced(mem::replace(&mut self.entries[i].1, value)),
            Err(i) if self.is_leaf() => self.entries.insert(i, (key, value)),
            Err(i) => match self.children[i].insert(key, value, order) {
                InsertResult::Split(median, right) => {
                    self.entries.insert(i, median);
                    self.children.insert(i + 1, right);
                }
                other => return other,
            },
        }
        if self.entries.len() >= order {
            let (median, right) = self.split();
            InsertResult::Split(median, right)
        } else {
            InsertResult::Fit
        }
    }

    fn split(&mut self) -> ((K, V), Node<K, V>) {
        let mid = self.entries.len() / 2;
        let mut right_entries = self.entries.split_off(mid);
        let median = right_entries.remove(0);
        let right_children = if self.is_leaf() {
            Vec::new()
        } else {
            self.children.split_off(mid + 1)
        };
        (
            median,
            Node {
                entries: right_entries,
                children: right_children,
            },
        )
    }

    fn remove<Q>(&mut self, key: &Q, min: usize) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let (child, value) = match self.find(key) {
            Ok(i) if self.is_leaf() => return Some(self.entries.remove(i).1),
            Ok(i) => {
                // Internal hit: swap in the in-order predecessor from the left subtree.
                let predecessor = self.children[i].pop_last(min)?;
                let (_, value) = mem::replace(&mut self.entries[i], predecessor);
                (i, value)
            }
            Err(_) if self.is_leaf() => return None,
            Err(i) => (i, self.children[i].remove(key, min)?),
        };
        self.rebalance(child, min);
        Some(value)
    }

    fn pop_last(&mut self, min: usize) -> Option<(K, V)> {
        if self.is_leaf() {
            return self.entries.pop();
        }
        let last = self.children.len() - 1;
        let entry = self.children[last].pop_last(min)?;
        self.rebalance(last, min);
        Some(entry)
    }

    /// Restore minimum occupancy of `children[i]` by borrowing from a sibling or merging.
    fn rebalance(&mut self, i: usize, min: usize) {
        if self.children[i].entries.len() >= min {
            return;
        }
        if i > 0 && self.children[i - 1].entries.len() > min {
            self.rotate_right(i);
        } else if i + 1 < self.children.len() && self.children[i + 1].entries.len() > min {
            self.rotate_left(i);
        } else if i > 0 {
            self.merge(i - 1);
        } else {
            self.merge(i);
        }
    }

    /// Move the left sibling's last entry up and the separator down into `children[i]`.
    fn rotate_right(&mut self, i: usize) {
        let (left, right) = self.children.split_at_mut(i);
        let (lender, child) = (&mut left[i - 1], &mut right[0]);
        let Some(entry) = lender.entries.pop() else {
            return;
        };
        let separator = mem::replace(&mut self.entries[i - 1], entry);
        child.entries.insert(0, separator);
        if let Some(grandchild) = lender.children.pop() {
            child.children.insert(0, grandchild);
        }
    }

    /// Move the right sibling's first entry up and the separator down into `children[i]`.
    fn rotate_left(&mut self, i: usize) {
        let (left, right) = self.children.split_at_mut(i + 1);
        let (child, lender) = (&mut left[i], &mut right[0]);
        if lender.entries.is_empty() {
            return;
        }
        let entry = lender.entries.remove(0);
        let separator = mem::replace(&mut self.entries[i], entry);
        child.entries.push(separator);
        if !lender.is_leaf() {
            child.children.push(lender.children.remove(0));
        }
    }

    /// Fold `children[i + 1]` and the separator `entries[i]` into `children[i]`.
    fn merge(&mut self, i: usize) {
        let right = self.children.remove(i + 1);
        let separator = self.entries.remove(i);
        let left = &mut self.children[i];
        left.entries.push(separator);
        left.entries.extend(right.entries);
        left.children.extend(right.children);
    }
}

/// B-tree map with a branching order fixed at construction.
#[derive(Debug, Clone)]
pub struct BTree<K, V> {
    root: Node<K, V>,
    order: usize,
    len: usize,
}

impl<K: Ord, V> BTree<K, V> {
    /// Create an empty tree. Fails with [`GraphError::InvalidOrder`] when `order < 3`.
    pub fn new(order: usize) -> Result<Self, GraphError> {
        GraphConfig::with_order(order).validate()?;
        Ok(Self {
            root: Node::default(),
            order,
            len: 0,
        })
    }

    pub fn order(&self) -> usize {
        self.order
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of levels; an empty tree has depth 1.
    pub fn depth(&self) -> usize {
        let mut depth = 1;
        let mut node = &self.root;
        while let Some(first) = node.children.first() {
            depth += 1;
            node = first;
        }
        depth
    }

    fn min_entries(&self) -> usize {
        self.order.div_ceil(2) - 1
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut node = &self.root;
        loop {
            match node.find(key) {
                Ok(i) => return Some(&node.entries[i].1),
                Err(_) if node.is_leaf() => return None,
                Err(i) => node = &node.children[i],
            }
        }
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.get(key).is_some()
    }

    /// Insert or replace. Returns the previous value when the key was already present.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        match self.root.insert(key, value, self.order) {
            InsertResult::Replaced(old) => Some(old),
            InsertResult::Fit => {
                self.len += 1;
                None
            }
            InsertResult::Split(median, right) => {
                let left = mem::take(&mut self.root);
                self.root = Node {
                    entries: vec![median],
                    children: vec![left, right],
                };
                self.len += 1;
                None
            }
        }
    }

    /// Remove a key, returning its value. The tree loses a level when the root empties.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let min = self.min_entries();
        let value = self.root.remove(key, min)?;
        self.len -= 1;
        if self.root.entries.is_empty() && !self.root.is_leaf() {
            let child = self.root.children.remove(0);
            self.root = child;
        }
        Some(value)
    }

    /// Entries in ascending key order.
    pub fn iter(&self) -> Iter<'_, K, V> {
        let mut iter = Iter { stack: Vec::new() };
        iter.seek::<K>(&self.root, Bound::Unbounded);
        iter
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.iter().map(|(k, _)| k)
    }

    /// Entries whose keys fall in `range`, in ascending order.
    pub fn range<'a, Q, R>(&'a self, range: R) -> impl Iterator<Item = (&'a K, &'a V)> + 'a
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized + 'a,
        R: RangeBounds<Q> + 'a,
    {
        let mut iter = Iter { stack: Vec::new() };
        iter.seek(&self.root, range.start_bound());
        iter.take_while(move |(k, _)| {
            let key: &Q = (*k).borrow();
            match range.end_bound() {
                Bound::Included(end) => key <= end,
                Bound::Excluded(end) => key < end,
                Bound::Unbounded => true,
            }
        })
    }
}

impl<K: Ord, V> Default for BTree<K, V> {
    /// Empty tree of [`DEFAULT_ORDER`].
    fn default() -> Self {
        Self {
            root: Node::default(),
            order: DEFAULT_ORDER,
            len: 0,
        }
    }
}

/// In-order iterator over a [`BTree`].
pub struct Iter<'a, K, V> {
    /// Path from the root; each frame holds the index of the next entry to yield.
    stack: Vec<(&'a Node<K, V>, usize)>,
}

impl<'a, K: Ord, V> Iter<'a, K, V> {
    /// Push the path to the first entry not below `lower`.
    fn seek<Q>(&mut self, mut node: &'a Node<K, V>, lower: Bound<&Q>)
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        loop {
            let (idx, exact) = match lower {
                Bound::Unbounded => (0, false),
                Bound::Included(key) => match node.find(key) {
                    Ok(i) => (i, true),
                    Err(i) => (i, false),
                },
                Bound::Excluded(key) => match node.find(key) {
                    Ok(i) => (i + 1, false),
                    Err(i) => (i, false),
                },
            };
            self.stack.push((node, idx));
            if exact || node.is_leaf() {
                return;
            }
            node = &node.children[idx];
        }
    }
}

impl<'a, K: Ord, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let top = self.stack.last_mut()?;
            let node: &'a Node<K, V> = top.0;
            let idx = top.1;
            if idx < node.entries.len() {
                top.1 += 1;
                if !node.is_leaf() {
                    self.seek::<K>(&node.children[idx + 1], Bound::Unbounded);
                }
                let (k, v) = &node.entries[idx];
                return Some((k, v));
            }
            self.stack.pop();
        }
    }
}

#[cfg(test)]
impl<K: Ord + std::fmt::Debug, V> BTree<K, V> {
    /// Check ordering, occupancy, leaf depth and length; returns the first violation.
    pub(crate) fn check_invariants(&self) -> Result<(), String> {
        let mut leaf_depth = None;
        let bounds = (None, None);
        let count = self.root.check(
            self.order,
            self.min_entries(),
            true,
            0,
            &mut leaf_depth,
            bounds,
        )?;
        if count != self.len {
            return Err(format!("len {} but {} entries reachable", self.len, count));
        }
        Ok(())
    }
}

#[cfg(test)]
impl<K: Ord + std::fmt::Debug, V> Node<K, V> {
    fn check(
        &self,
        order: usize,
        min: usize,
        is_root: bool,
        depth: usize,
        leaf_depth: &mut Option<usize>,
        (lower, upper): (Option<&K>, Option<&K>),
    ) -> Result<usize, String> {
        let n = self.entries.len();
        if n > order - 1 {
            return Err(format!("node at depth {depth} holds {n} entries"));
        }
        if !is_root && n < min {
            return Err(format!("node at depth {depth} underflows with {n} entries"));
        }
        if self.entries.windows(2).any(|w| w[0].0 >= w[1].0) {
            return Err(format!("unsorted node at depth {depth}"));
        }
        if let (Some(lo), Some((first, _))) = (lower, self.entries.first()) {
            if first <= lo {
                return Err(format!("{first:?} not above separator {lo:?}"));
            }
        }
        if let (Some(hi), Some((last, _))) = (upper, self.entries.last()) {
            if last >= hi {
                return Err(format!("{last:?} not below separator {hi:?}"));
            }
        }
        if self.is_leaf() {
            match *leaf_depth {
                None => *leaf_depth = Some(depth),
                Some(d) if d != depth => {
                    return Err(format!("leaf at depth {depth}, expected {d}"));
                }
                Some(_) => {}
            }
            return Ok(n);
        }
        if self.children.len() != n + 1 {
            return Err(format!(
                "node with {n} entries has {} children",
                self.children.len()
            ));
        }
        let mut total = n;
        for (i, child) in self.children.iter().enumerate() {
            let lo = if i == 0 { lower } else { Some(&self.entries[i - 1].0) };
            let hi = if i == n { upper } else { Some(&self.entries[i].0) };
            total += child.check(order, min, false, depth + 1, leaf_depth, (lo, hi))?;
        }
        Ok(total)
    }
}
