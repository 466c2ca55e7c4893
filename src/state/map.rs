//! Ordered key/value container with traversal-safe removal.
//!
//! `OrderedMap` is a red-black tree stored in an arena of slots addressed by
//! index. Keys are ordered by their `Ord` implementation: owned strings compare
//! lexically, while identity keys such as [`ConnId`](super::ConnId) compare by
//! their numeric value.
//!
//! ## Traversal contract
//!
//! [`OrderedMap::each`] walks the live entries in ascending key order and hands
//! the callback a [`Cursor`] with mutable access to the map:
//!
//! - `remove` is allowed. The entry disappears immediately (lookups miss and
//!   `len` drops) but the node stays linked until the walk ends, so the walk
//!   never observes a restructured tree.
//! - `insert` is a contract violation and panics.
//! - Calling `each` again from inside the callback panics.

use std::borrow::Borrow;
use std::fmt;

use tracing::trace;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Color {
    Red,
    Black,
}

#[derive(Clone, Debug)]
struct Node<K, V> {
    key: K,
    /// `None` while a removal is pending.
    value: Option<V>,
    color: Color,
    parent: Option<usize>,
    left: Option<usize>,
    right: Option<usize>,
}

/// Ordered map backed by a red-black tree.
#[derive(Clone)]
pub struct OrderedMap<K, V> {
    slots: Vec<Option<Node<K, V>>>,
    free: Vec<usize>,
    root: Option<usize>,
    len: usize,
    walking: bool,
    pending: Vec<usize>,
}

impl<K, V> Default for OrderedMap<K, V> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            root: None,
            len: 0,
            walking: false,
            pending: Vec::new(),
        }
    }
}

impl<K: Ord, V> OrderedMap<K, V> {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// True while [`OrderedMap::each`] is running.
    #[inline]
    pub fn is_traversing(&self) -> bool {
        self.walking
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let idx = self.find(key)?;
        self.node(idx).value.as_ref()
    }

    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let idx = self.find(key)?;
        self.node_mut(idx).value.as_mut()
    }

    /// Stored key and value for `key`.
    ///
    /// Useful when the stored key carries information the lookup key does
    /// not, such as the original spelling of a casemapped name.
    pub fn get_key_value<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let node = self.node(self.find(key)?);
        node.value.as_ref().map(|v| (&node.key, v))
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.get(key).is_some()
    }

    /// Insert or overwrite, returning the previous value.
    ///
    /// # Panics
    ///
    /// Panics when called during [`OrderedMap::each`] on the same map.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        assert!(
            !self.walking,
            "OrderedMap::insert called while a traversal is in progress"
        );

        let mut parent = None;
        let mut went_left = false;
        let mut cur = self.root;
        while let Some(idx) = cur {
            parent = Some(idx);
            match key.cmp(&self.node(idx).key) {
                std::cmp::Ordering::Less => {
                    went_left = true;
                    cur = self.node(idx).left;
                }
                std::cmp::Ordering::Greater => {
                    went_left = false;
                    cur = self.node(idx).right;
                }
                std::cmp::Ordering::Equal => {
                    return self.node_mut(idx).value.replace(value);
                }
            }
        }

        let idx = self.alloc(Node {
            key,
            value: Some(value),
            color: Color::Red,
            parent,
            left: None,
            right: None,
        });
        match parent {
            None => self.root = Some(idx),
            Some(p) => self.set_child(p, went_left, Some(idx)),
        }
        self.len += 1;
        self.insert_fixup(idx);
        None
    }

    /// Remove `key`, returning its value.
    ///
    /// During a traversal the entry is removed logically right away and the
    /// node is unlinked once the traversal finishes.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let idx = self.find(key)?;
        self.remove_at(idx)
    }

    /// Remove and return the entry for `key`, including the stored key.
    ///
    /// Not available during a traversal, since the key stays in the tree
    /// until the walk ends.
    pub fn remove_entry<Q>(&mut self, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        assert!(
            !self.walking,
            "OrderedMap::remove_entry called while a traversal is in progress"
        );
        let idx = self.find(key)?;
        let node = self.unlink(idx);
        self.len -= 1;
        node.value.map(|v| (node.key, v))
    }

    /// Walk every live entry in ascending key order.
    ///
    /// See the module documentation for what the callback may do with the
    /// cursor.
    ///
    /// # Panics
    ///
    /// Panics if called re-entrantly on the same map.
    pub fn each<F>(&mut self, mut f: F)
    where
        F: FnMut(&mut Cursor<'_, K, V>),
    {
        assert!(!self.walking, "OrderedMap::each re-entered during traversal");
        self.walking = true;

        let mut next = self.root.map(|r| self.minimum(r));
        while let Some(idx) = next {
            next = self.successor(idx);
            if self.node(idx).value.is_some() {
                let mut cursor = Cursor { map: &mut *self, idx };
                f(&mut cursor);
            }
        }

        self.walking = false;
        self.apply_pending();
    }

    /// Keep only the entries for which `keep` returns true.
    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&K, &mut V) -> bool,
    {
        self.each(|cursor| {
            let idx = cursor.idx;
            let node = cursor.map.node_mut(idx);
            let live = match node.value.as_mut() {
                Some(value) => keep(&node.key, value),
                None => true,
            };
            if !live {
                cursor.remove();
            }
        });
    }

    /// Remove every entry.
    ///
    /// # Panics
    ///
    /// Panics during a traversal.
    pub fn clear(&mut self) {
        assert!(
            !self.walking,
            "OrderedMap::clear called while a traversal is in progress"
        );
        *self = Self::default();
    }

    /// Borrowing iterator in ascending key order.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            map: self,
            next: self.root.map(|r| self.minimum(r)),
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl Iterator<Item = &V> + '_ {
        self.iter().map(|(_, v)| v)
    }

    /// Smallest live key and its value.
    pub fn first(&self) -> Option<(&K, &V)> {
        self.iter().next()
    }

    fn remove_at(&mut self, idx: usize) -> Option<V> {
        if self.walking {
            let value = self.node_mut(idx).value.take()?;
            self.len -= 1;
            self.pending.push(idx);
            return Some(value);
        }
        let node = self.unlink(idx);
        self.len -= 1;
        node.value
    }

    fn apply_pending(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        let pending = std::mem::take(&mut self.pending);
        trace!(count = pending.len(), "applying deferred removals");
        for idx in pending {
            self.unlink(idx);
        }
    }

    fn find<Q>(&self, key: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut cur = self.root;
        while let Some(idx) = cur {
            let node = self.node(idx);
            cur = match key.cmp(node.key.borrow()) {
                std::cmp::Ordering::Less => node.left,
                std::cmp::Ordering::Greater => node.right,
                std::cmp::Ordering::Equal => return Some(idx),
            };
        }
        None
    }
}

// Tree plumbing. Links are slot indices; `None` plays the role of the black
// nil leaf.
impl<K, V> OrderedMap<K, V> {
    fn node(&self, idx: usize) -> &Node<K, V> {
        match &self.slots[idx] {
            Some(node) => node,
            None => unreachable!("link to freed slot {idx}"),
        }
    }

    fn node_mut(&mut self, idx: usize) -> &mut Node<K, V> {
        match &mut self.slots[idx] {
            Some(node) => node,
            None => unreachable!("link to freed slot {idx}"),
        }
    }

    fn alloc(&mut self, node: Node<K, V>) -> usize {
        match self.free.pop() {
            Some(idx) => {
                self.slots[idx] = Some(node);
                idx
            }
            None => {
                self.slots.push(Some(node));
                self.slots.len() - 1
            }
        }
    }

    fn release(&mut self, idx: usize) -> Node<K, V> {
        match self.slots[idx].take() {
            Some(node) => {
                self.free.push(idx);
                node
            }
            None => unreachable!("double free of slot {idx}"),
        }
    }

    fn is_red(&self, idx: Option<usize>) -> bool {
        idx.is_some_and(|i| self.node(i).color == Color::Red)
    }

    fn set_color(&mut self, idx: usize, color: Color) {
        self.node_mut(idx).color = color;
    }

    fn child(&self, idx: usize, left: bool) -> Option<usize> {
        let node = self.node(idx);
        if left { node.left } else { node.right }
    }

    fn set_child(&mut self, idx: usize, left: bool, child: Option<usize>) {
        let node = self.node_mut(idx);
        if left {
            node.left = child;
        } else {
            node.right = child;
        }
    }

    fn minimum(&self, mut idx: usize) -> usize {
        while let Some(l) = self.node(idx).left {
            idx = l;
        }
        idx
    }

    fn successor(&self, idx: usize) -> Option<usize> {
        if let Some(r) = self.node(idx).right {
            return Some(self.minimum(r));
        }
        let mut cur = idx;
        let mut parent = self.node(cur).parent;
        while let Some(p) = parent {
            if self.node(p).right != Some(cur) {
                break;
            }
            cur = p;
            parent = self.node(p).parent;
        }
        parent
    }

    /// Point `parent`'s link to `old` at `new` instead (or the root if
    /// `parent` is `None`).
    fn replace_child(&mut self, parent: Option<usize>, old: usize, new: Option<usize>) {
        match parent {
            None => self.root = new,
            Some(p) => {
                let left = self.node(p).left == Some(old);
                self.set_child(p, left, new);
            }
        }
    }

    /// `rotate(x, true)` is a left rotation, `rotate(x, false)` a right one.
    fn rotate(&mut self, x: usize, left: bool) {
        let Some(y) = self.child(x, !left) else {
            unreachable!("rotation without a child to promote");
        };
        let inner = self.child(y, left);
        self.set_child(x, !left, inner);
        if let Some(b) = inner {
            self.node_mut(b).parent = Some(x);
        }
        let xp = self.node(x).parent;
        self.node_mut(y).parent = xp;
        self.replace_child(xp, x, Some(y));
        self.set_child(y, left, Some(x));
        self.node_mut(x).parent = Some(y);
    }

    fn insert_fixup(&mut self, mut z: usize) {
        while let Some(p) = self.node(z).parent {
            if !self.is_red(Some(p)) {
                break;
            }
            // A red node is never the root, so the grandparent exists.
            let Some(g) = self.node(p).parent else {
                unreachable!("red node without parent");
            };
            let p_is_left = self.node(g).left == Some(p);
            let uncle = self.child(g, !p_is_left);

            if self.is_red(uncle) {
                self.set_color(p, Color::Black);
                if let Some(u) = uncle {
                    self.set_color(u, Color::Black);
                }
                self.set_color(g, Color::Red);
                z = g;
                continue;
            }

            let mut p = p;
            if self.child(p, !p_is_left) == Some(z) {
                self.rotate(p, p_is_left);
                z = p;
                p = match self.node(z).parent {
                    Some(np) => np,
                    None => unreachable!("rotated node lost its parent"),
                };
            }
            self.set_color(p, Color::Black);
            self.set_color(g, Color::Red);
            self.rotate(g, !p_is_left);
        }

        if let Some(r) = self.root {
            self.set_color(r, Color::Black);
        }
    }

    fn transplant(&mut self, u: usize, v: Option<usize>) {
        let up = self.node(u).parent;
        self.replace_child(up, u, v);
        if let Some(v) = v {
            self.node_mut(v).parent = up;
        }
    }

    /// Unlink slot `z` from the tree and free it.
    ///
    /// Other nodes are relinked rather than having their contents moved, so
    /// indices held in the pending list stay valid.
    fn unlink(&mut self, z: usize) -> Node<K, V> {
        let (zl, zr) = (self.node(z).left, self.node(z).right);
        let mut removed_color = self.node(z).color;
        let x;
        let x_parent;

        match (zl, zr) {
            (None, _) => {
                x = zr;
                x_parent = self.node(z).parent;
                self.transplant(z, zr);
            }
            (Some(_), None) => {
                x = zl;
                x_parent = self.node(z).parent;
                self.transplant(z, zl);
            }
            (Some(l), Some(r)) => {
                let y = self.minimum(r);
                removed_color = self.node(y).color;
                x = self.node(y).right;
                if self.node(y).parent == Some(z) {
                    x_parent = Some(y);
                } else {
                    x_parent = self.node(y).parent;
                    self.transplant(y, x);
                    self.node_mut(y).right = Some(r);
                    self.node_mut(r).parent = Some(y);
                }
                self.transplant(z, Some(y));
                self.node_mut(y).left = Some(l);
                self.node_mut(l).parent = Some(y);
                let z_color = self.node(z).color;
                self.set_color(y, z_color);
            }
        }

        if removed_color == Color::Black {
            self.delete_fixup(x, x_parent);
        }
        self.release(z)
    }

    fn delete_fixup(&mut self, mut x: Option<usize>, mut parent: Option<usize>) {
        while x != self.root && !self.is_red(x) {
            let Some(p) = parent else { break };
            let x_left = self.node(p).left == x;
            let Some(mut w) = self.child(p, !x_left) else {
                unreachable!("doubly black node without sibling");
            };

            if self.is_red(Some(w)) {
                self.set_color(w, Color::Black);
                self.set_color(p, Color::Red);
                self.rotate(p, x_left);
                w = match self.child(p, !x_left) {
                    Some(w) => w,
                    None => unreachable!("sibling vanished after rotation"),
                };
            }

            let near = self.child(w, x_left);
            let far = self.child(w, !x_left);
            if !self.is_red(near) && !self.is_red(far) {
                self.set_color(w, Color::Red);
                x = Some(p);
                parent = self.node(p).parent;
                continue;
            }

            if !self.is_red(far) {
                if let Some(n) = near {
                    self.set_color(n, Color::Black);
                }
                self.set_color(w, Color::Red);
                self.rotate(w, !x_left);
                w = match self.child(p, !x_left) {
                    Some(w) => w,
                    None => unreachable!("sibling vanished after rotation"),
                };
            }

            let p_color = self.node(p).color;
            self.set_color(w, p_color);
            self.set_color(p, Color::Black);
            if let Some(f) = self.child(w, !x_left) {
                self.set_color(f, Color::Black);
            }
            self.rotate(p, x_left);
            x = self.root;
            break;
        }

        if let Some(x) = x {
            self.set_color(x, Color::Black);
        }
    }
}

/// Handle to the current entry of an [`OrderedMap::each`] walk.
pub struct Cursor<'a, K, V> {
    map: &'a mut OrderedMap<K, V>,
    idx: usize,
}

impl<K: Ord, V> Cursor<'_, K, V> {
    pub fn key(&self) -> &K {
        &self.map.node(self.idx).key
    }

    /// Value of the current entry, `None` once it has been removed.
    pub fn value(&self) -> Option<&V> {
        self.map.node(self.idx).value.as_ref()
    }

    pub fn value_mut(&mut self) -> Option<&mut V> {
        self.map.node_mut(self.idx).value.as_mut()
    }

    /// Remove the current entry.
    pub fn remove(&mut self) -> Option<V> {
        self.map.remove_at(self.idx)
    }

    /// The map being walked.
    ///
    /// Lookups and removals work as usual; inserting panics.
    pub fn map(&mut self) -> &mut OrderedMap<K, V> {
        self.map
    }
}

/// Iterator returned by [`OrderedMap::iter`].
pub struct Iter<'a, K, V> {
    map: &'a OrderedMap<K, V>,
    next: Option<usize>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(idx) = self.next {
            self.next = self.map.successor(idx);
            let node = self.map.node(idx);
            if let Some(value) = node.value.as_ref() {
                return Some((&node.key, value));
            }
        }
        None
    }
}

impl<'a, K: Ord, V> IntoIterator for &'a OrderedMap<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K: Ord, V> FromIterator<(K, V)> for OrderedMap<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = OrderedMap::new();
        map.extend(iter);
        map
    }
}

impl<K: Ord, V> Extend<(K, V)> for OrderedMap<K, V> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl<K: Ord + fmt::Debug, V: fmt::Debug> fmt::Debug for OrderedMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

#[cfg(test)]
impl<K: Ord, V> OrderedMap<K, V> {
    /// Check tree shape, coloring and bookkeeping. Returns the black height.
    fn check_invariants(&self) -> usize {
        fn walk<K: Ord, V>(
            map: &OrderedMap<K, V>,
            idx: Option<usize>,
            parent: Option<usize>,
            live: &mut usize,
        ) -> usize {
            let Some(i) = idx else { return 1 };
            let node = map.node(i);
            assert_eq!(node.parent, parent, "parent link mismatch");
            if node.color == Color::Red {
                assert!(!map.is_red(node.left), "red node with red left child");
                assert!(!map.is_red(node.right), "red node with red right child");
            }
            if let Some(l) = node.left {
                assert!(map.node(l).key < node.key, "left child out of order");
            }
            if let Some(r) = node.right {
                assert!(map.node(r).key > node.key, "right child out of order");
            }
            if node.value.is_some() {
                *live += 1;
            }
            let lh = walk(map, node.left, Some(i), live);
            let rh = walk(map, node.right, Some(i), live);
            assert_eq!(lh, rh, "black height mismatch");
            lh + usize::from(node.color == Color::Black)
        }

        assert!(!self.is_red(self.root), "root must be black");
        let mut live = 0;
        let height = walk(self, self.root, None, &mut live);
        assert_eq!(live, self.len, "len does not match live entries");
        assert_eq!(
            self.slots.iter().filter(|s| s.is_some()).count(),
            self.slots.len() - self.free.len(),
            "free list out of sync"
        );
        height
    }

    fn depth(&self) -> usize {
        fn go<K, V>(map: &OrderedMap<K, V>, idx: Option<usize>) -> usize {
            match idx {
                None => 0,
                Some(i) => 1 + go(map, map.node(i).left).max(go(map, map.node(i).right)),
            }
        }
        go(self, self.root)
    }
}
