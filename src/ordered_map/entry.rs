use core::fmt;
use core::mem;

use crate::raw::{Handle, RawOrderedMap};

/// A view into a single entry in a map, which may either be vacant or occupied.
///
/// This `enum` is constructed from the [`entry`] method on [`crate::OrderedMap`].
///
/// # Examples
///
/// ```
/// use sapling_tree::OrderedMap;
/// use sapling_tree::ordered_map::Entry;
///
/// let mut map = OrderedMap::new();
///
/// match map.entry("oz") {
///     Entry::Vacant(v) => {
///         v.insert(1);
///     }
///     Entry::Occupied(mut o) => {
///         *o.get_mut() += 1;
///     }
/// }
/// assert_eq!(map["oz"], 1);
/// ```
///
/// [`entry`]: crate::OrderedMap::entry
pub enum Entry<'a, K: 'a, V: 'a> {
    /// A vacant entry.
    Vacant(VacantEntry<'a, K, V>),

    /// An occupied entry.
    Occupied(OccupiedEntry<'a, K, V>),
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for Entry<'_, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Entry::Vacant(v) => f.debug_tuple("Entry").field(v).finish(),
            Entry::Occupied(o) => f.debug_tuple("Entry").field(o).finish(),
        }
    }
}

/// A view into a vacant entry in an `OrderedMap`.
/// It is part of the [`Entry`] enum.
///
/// # Examples
///
/// ```
/// use sapling_tree::OrderedMap;
/// use sapling_tree::ordered_map::Entry;
///
/// let mut map = OrderedMap::new();
///
/// if let Entry::Vacant(v) = map.entry("oz") {
///     v.insert(5);
/// }
/// assert_eq!(map["oz"], 5);
/// ```
pub struct VacantEntry<'a, K, V> {
    pub(crate) key: K,
    pub(crate) tree: &'a mut RawOrderedMap<K, V>,
}

impl<K: fmt::Debug, V> fmt::Debug for VacantEntry<'_, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VacantEntry").field("key", &self.key).finish()
    }
}

/// A view into an occupied entry in an `OrderedMap`.
/// It is part of the [`Entry`] enum.
///
/// The entry pins the node's arena handle, so reads and in-place overwrites
/// cost O(1); only removal re-walks the tree.
///
/// # Examples
///
/// ```
/// use sapling_tree::OrderedMap;
/// use sapling_tree::ordered_map::Entry;
///
/// let mut map = OrderedMap::new();
/// map.insert("oz", 1);
///
/// if let Entry::Occupied(mut o) = map.entry("oz") {
///     *o.get_mut() += 1;
/// }
/// assert_eq!(map["oz"], 2);
/// ```
pub struct OccupiedEntry<'a, K, V> {
    pub(crate) handle: Handle,
    pub(crate) tree: &'a mut RawOrderedMap<K, V>,
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for OccupiedEntry<'_, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OccupiedEntry").field("key", self.key()).field("value", self.get()).finish()
    }
}

impl<'a, K: Ord, V> Entry<'a, K, V> {
    /// Ensures a value is in the entry by inserting the default if empty, and returns
    /// a mutable reference to the value in the entry.
    ///
    /// # Examples
    ///
    /// ```
    /// use sapling_tree::OrderedMap;
    ///
    /// let mut map: OrderedMap<&str, usize> = OrderedMap::new();
    /// map.entry("poneyland").or_insert(12);
    ///
    /// assert_eq!(map["poneyland"], 12);
    /// ```
    ///
    /// # Complexity
    ///
    /// O(depth) if vacant (insertion), O(1) if occupied.
    pub fn or_insert(self, default: V) -> &'a mut V {
        match self {
            Entry::Occupied(o) => o.into_mut(),
            Entry::Vacant(v) => v.insert(default),
        }
    }

    /// Ensures a value is in the entry by inserting the result of the default function if empty,
    /// and returns a mutable reference to the value in the entry.
    ///
    /// # Examples
    ///
    /// ```
    /// use sapling_tree::OrderedMap;
    ///
    /// let mut map: OrderedMap<&str, String> = OrderedMap::new();
    /// let s = "hoho".to_string();
    ///
    /// map.entry("poneyland").or_insert_with(|| s);
    ///
    /// assert_eq!(map["poneyland"], "hoho".to_string());
    /// ```
    ///
    /// # Complexity
    ///
    /// O(depth) if vacant (insertion), O(1) if occupied.
    pub fn or_insert_with<F: FnOnce() -> V>(self, default: F) -> &'a mut V {
        match self {
            Entry::Occupied(o) => o.into_mut(),
            Entry::Vacant(v) => v.insert(default()),
        }
    }

    /// Ensures a value is in the entry by inserting, if empty, the result of the default function.
    ///
    /// This method allows for generating key-derived values for insertion by providing the default
    /// function a reference to the key that was moved during the `.entry(key)` method call.
    ///
    /// # Examples
    ///
    /// ```
    /// use sapling_tree::OrderedMap;
    ///
    /// let mut map: OrderedMap<&str, usize> = OrderedMap::new();
    ///
    /// map.entry("poneyland").or_insert_with_key(|key| key.chars().count());
    ///
    /// assert_eq!(map["poneyland"], 9);
    /// ```
    ///
    /// # Complexity
    ///
    /// O(depth) if vacant (insertion), O(1) if occupied.
    pub fn or_insert_with_key<F: FnOnce(&K) -> V>(self, default: F) -> &'a mut V {
        match self {
            Entry::Occupied(o) => o.into_mut(),
            Entry::Vacant(v) => {
                let value = default(&v.key);
                v.insert(value)
            }
        }
    }

    /// Returns a reference to this entry's key.
    ///
    /// # Examples
    ///
    /// ```
    /// use sapling_tree::OrderedMap;
    ///
    /// let mut map: OrderedMap<&str, usize> = OrderedMap::new();
    /// assert_eq!(map.entry("poneyland").key(), &"poneyland");
    /// ```
    ///
    /// # Complexity
    ///
    /// O(1)
    #[allow(clippy::must_use_candidate)]
    pub fn key(&self) -> &K {
        match self {
            Entry::Occupied(o) => o.key(),
            Entry::Vacant(v) => v.key(),
        }
    }

    /// Provides in-place mutable access to an occupied entry before any
    /// potential inserts into the map.
    ///
    /// # Examples
    ///
    /// ```
    /// use sapling_tree::OrderedMap;
    ///
    /// let mut map: OrderedMap<&str, usize> = OrderedMap::new();
    ///
    /// map.entry("poneyland")
    ///    .and_modify(|e| { *e += 1 })
    ///    .or_insert(42);
    /// assert_eq!(map["poneyland"], 42);
    ///
    /// map.entry("poneyland")
    ///    .and_modify(|e| { *e += 1 })
    ///    .or_insert(42);
    /// assert_eq!(map["poneyland"], 43);
    /// ```
    ///
    /// # Complexity
    ///
    /// O(1)
    #[allow(clippy::return_self_not_must_use)]
    pub fn and_modify<F>(mut self, f: F) -> Self
    where
        F: FnOnce(&mut V),
    {
        if let Entry::Occupied(ref mut o) = self {
            f(o.get_mut());
        }
        self
    }

    /// Sets the value of the entry, and returns an `OccupiedEntry`.
    ///
    /// # Examples
    ///
    /// ```
    /// use sapling_tree::OrderedMap;
    ///
    /// let mut map: OrderedMap<&str, String> = OrderedMap::new();
    /// let entry = map.entry("poneyland").insert_entry("hoho".to_string());
    ///
    /// assert_eq!(entry.key(), &"poneyland");
    /// ```
    ///
    /// # Complexity
    ///
    /// O(depth) if vacant (insertion), O(1) if occupied.
    pub fn insert_entry(self, value: V) -> OccupiedEntry<'a, K, V> {
        match self {
            Entry::Occupied(mut o) => {
                o.insert(value);
                o
            }
            Entry::Vacant(v) => v.insert_entry(value),
        }
    }
}

impl<'a, K: Ord, V: Default> Entry<'a, K, V> {
    /// Ensures a value is in the entry by inserting the default value if empty,
    /// and returns a mutable reference to the value in the entry.
    ///
    /// # Examples
    ///
    /// ```
    /// use sapling_tree::OrderedMap;
    ///
    /// let mut map: OrderedMap<&str, Option<usize>> = OrderedMap::new();
    /// map.entry("poneyland").or_default();
    ///
    /// assert_eq!(map["poneyland"], None);
    /// ```
    ///
    /// # Complexity
    ///
    /// O(depth) if vacant (insertion), O(1) if occupied.
    #[allow(clippy::must_use_candidate)]
    pub fn or_default(self) -> &'a mut V {
        match self {
            Entry::Occupied(o) => o.into_mut(),
            Entry::Vacant(v) => v.insert(V::default()),
        }
    }
}

impl<'a, K: Ord, V> VacantEntry<'a, K, V> {
    /// Gets a reference to the key that would be used when inserting a value
    /// through the `VacantEntry`.
    ///
    /// # Examples
    ///
    /// ```
    /// use sapling_tree::OrderedMap;
    ///
    /// let mut map: OrderedMap<&str, usize> = OrderedMap::new();
    /// assert_eq!(map.entry("poneyland").key(), &"poneyland");
    /// ```
    ///
    /// # Complexity
    ///
    /// O(1)
    #[allow(clippy::must_use_candidate)]
    pub fn key(&self) -> &K {
        &self.key
    }

    /// Take ownership of the key.
    ///
    /// # Examples
    ///
    /// ```
    /// use sapling_tree::OrderedMap;
    /// use sapling_tree::ordered_map::Entry;
    ///
    /// let mut map: OrderedMap<&str, usize> = OrderedMap::new();
    ///
    /// if let Entry::Vacant(v) = map.entry("poneyland") {
    ///     v.into_key();
    /// }
    /// ```
    ///
    /// # Complexity
    ///
    /// O(1)
    #[allow(clippy::must_use_candidate)]
    pub fn into_key(self) -> K {
        self.key
    }

    /// Sets the value of the entry with the `VacantEntry`'s key,
    /// and returns a mutable reference to it.
    ///
    /// # Examples
    ///
    /// ```
    /// use sapling_tree::OrderedMap;
    /// use sapling_tree::ordered_map::Entry;
    ///
    /// let mut map: OrderedMap<&str, u32> = OrderedMap::new();
    ///
    /// if let Entry::Vacant(o) = map.entry("poneyland") {
    ///     o.insert(37);
    /// }
    /// assert_eq!(map["poneyland"], 37);
    /// ```
    ///
    /// # Complexity
    ///
    /// O(depth)
    pub fn insert(self, value: V) -> &'a mut V {
        let VacantEntry { key, tree } = self;
        let handle = tree.insert_vacant(key, value);
        &mut tree.node_mut(handle).value
    }

    /// Sets the value of the entry with the `VacantEntry`'s key,
    /// and returns an `OccupiedEntry`.
    ///
    /// # Examples
    ///
    /// ```
    /// use sapling_tree::OrderedMap;
    /// use sapling_tree::ordered_map::Entry;
    ///
    /// let mut map: OrderedMap<&str, u32> = OrderedMap::new();
    ///
    /// if let Entry::Vacant(o) = map.entry("poneyland") {
    ///     let entry = o.insert_entry(37);
    ///     assert_eq!(entry.get(), &37);
    /// }
    /// assert_eq!(map["poneyland"], 37);
    /// ```
    ///
    /// # Complexity
    ///
    /// O(depth)
    pub fn insert_entry(self, value: V) -> OccupiedEntry<'a, K, V> {
        let VacantEntry { key, tree } = self;
        let handle = tree.insert_vacant(key, value);
        OccupiedEntry { handle, tree }
    }
}

impl<'a, K, V> OccupiedEntry<'a, K, V> {
    /// Gets a reference to the key in the entry.
    ///
    /// # Examples
    ///
    /// ```
    /// use sapling_tree::OrderedMap;
    ///
    /// let mut map: OrderedMap<&str, usize> = OrderedMap::new();
    /// map.entry("poneyland").or_insert(12);
    /// assert_eq!(map.entry("poneyland").key(), &"poneyland");
    /// ```
    ///
    /// # Complexity
    ///
    /// O(1)
    #[must_use]
    pub fn key(&self) -> &K {
        &self.tree.node(self.handle).key
    }

    /// Gets a reference to the value in the entry.
    ///
    /// # Examples
    ///
    /// ```
    /// use sapling_tree::OrderedMap;
    /// use sapling_tree::ordered_map::Entry;
    ///
    /// let mut map: OrderedMap<&str, usize> = OrderedMap::new();
    /// map.entry("poneyland").or_insert(12);
    ///
    /// if let Entry::Occupied(o) = map.entry("poneyland") {
    ///     assert_eq!(o.get(), &12);
    /// }
    /// ```
    ///
    /// # Complexity
    ///
    /// O(1)
    #[must_use]
    pub fn get(&self) -> &V {
        &self.tree.node(self.handle).value
    }

    /// Gets a mutable reference to the value in the entry.
    ///
    /// If you need a reference to the `OccupiedEntry` that may outlive the
    /// destruction of the `Entry` value, see [`into_mut`].
    ///
    /// [`into_mut`]: OccupiedEntry::into_mut
    ///
    /// # Examples
    ///
    /// ```
    /// use sapling_tree::OrderedMap;
    /// use sapling_tree::ordered_map::Entry;
    ///
    /// let mut map: OrderedMap<&str, usize> = OrderedMap::new();
    /// map.entry("poneyland").or_insert(12);
    ///
    /// assert_eq!(map["poneyland"], 12);
    /// if let Entry::Occupied(mut o) = map.entry("poneyland") {
    ///     *o.get_mut() += 10;
    ///     assert_eq!(*o.get(), 22);
    ///
    ///     // We can use the same Entry multiple times.
    ///     *o.get_mut() += 2;
    /// }
    /// assert_eq!(map["poneyland"], 24);
    /// ```
    ///
    /// # Complexity
    ///
    /// O(1)
    pub fn get_mut(&mut self) -> &mut V {
        &mut self.tree.node_mut(self.handle).value
    }

    /// Converts the entry into a mutable reference to its value.
    ///
    /// If you need multiple references to the `OccupiedEntry`, see [`get_mut`].
    ///
    /// [`get_mut`]: OccupiedEntry::get_mut
    ///
    /// # Examples
    ///
    /// ```
    /// use sapling_tree::OrderedMap;
    /// use sapling_tree::ordered_map::Entry;
    ///
    /// let mut map: OrderedMap<&str, usize> = OrderedMap::new();
    /// map.entry("poneyland").or_insert(12);
    ///
    /// assert_eq!(map["poneyland"], 12);
    /// if let Entry::Occupied(o) = map.entry("poneyland") {
    ///     *o.into_mut() += 10;
    /// }
    /// assert_eq!(map["poneyland"], 22);
    /// ```
    ///
    /// # Complexity
    ///
    /// O(1)
    #[must_use = "`self` will be dropped if the result is not used"]
    pub fn into_mut(self) -> &'a mut V {
        let OccupiedEntry { handle, tree } = self;
        &mut tree.node_mut(handle).value
    }

    /// Sets the value of the entry with the `OccupiedEntry`'s key,
    /// and returns the entry's old value.
    ///
    /// # Examples
    ///
    /// ```
    /// use sapling_tree::OrderedMap;
    /// use sapling_tree::ordered_map::Entry;
    ///
    /// let mut map: OrderedMap<&str, usize> = OrderedMap::new();
    /// map.entry("poneyland").or_insert(12);
    ///
    /// if let Entry::Occupied(mut o) = map.entry("poneyland") {
    ///     assert_eq!(o.insert(15), 12);
    /// }
    /// assert_eq!(map["poneyland"], 15);
    /// ```
    ///
    /// # Complexity
    ///
    /// O(1)
    pub fn insert(&mut self, value: V) -> V {
        mem::replace(self.get_mut(), value)
    }
}

impl<'a, K: Ord, V> OccupiedEntry<'a, K, V> {
    /// Take ownership of the key and value from the map.
    ///
    /// # Examples
    ///
    /// ```
    /// use sapling_tree::OrderedMap;
    /// use sapling_tree::ordered_map::Entry;
    ///
    /// let mut map: OrderedMap<&str, usize> = OrderedMap::new();
    /// map.entry("poneyland").or_insert(12);
    ///
    /// if let Entry::Occupied(o) = map.entry("poneyland") {
    ///     // We delete the entry from the map.
    ///     o.remove_entry();
    /// }
    ///
    /// assert!(!map.contains_key("poneyland"));
    /// ```
    ///
    /// # Complexity
    ///
    /// O(depth) - the referencing slot is recovered by re-walking from the
    /// root, since nodes store no parent links.
    #[allow(clippy::must_use_candidate)]
    pub fn remove_entry(self) -> (K, V) {
        self.tree.remove_at(self.handle)
    }

    /// Takes the value of the entry out of the map, and returns it.
    ///
    /// # Examples
    ///
    /// ```
    /// use sapling_tree::OrderedMap;
    /// use sapling_tree::ordered_map::Entry;
    ///
    /// let mut map: OrderedMap<&str, usize> = OrderedMap::new();
    /// map.entry("poneyland").or_insert(12);
    ///
    /// if let Entry::Occupied(o) = map.entry("poneyland") {
    ///     assert_eq!(o.remove(), 12);
    /// }
    /// assert!(!map.contains_key("poneyland"));
    /// ```
    ///
    /// # Complexity
    ///
    /// O(depth)
    #[allow(clippy::must_use_candidate)]
    pub fn remove(self) -> V {
        self.remove_entry().1
    }
}
