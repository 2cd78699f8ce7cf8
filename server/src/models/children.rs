use indexmap::map::{IntoValues, Values};
use indexmap::IndexMap;
use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A record that lives inside an event and is addressed by its own id.
pub trait Identified {
    fn id(&self) -> Uuid;
}

/// Children embedded in an event aggregate, keyed by id and kept in
/// insertion order.
///
/// On the wire and in storage this is a plain JSON array; the map only
/// exists in memory so lookups and removals don't scan the list.
#[derive(Debug, Clone, PartialEq)]
pub struct Children<T> {
    items: IndexMap<Uuid, T>,
}

impl<T> Default for Children<T> {
    fn default() -> Self {
        Self {
            items: IndexMap::new(),
        }
    }
}

impl<T: Identified> Children<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a child. A child with an id already present replaces the old
    /// one in place.
    pub fn push(&mut self, child: T) {
        self.items.insert(child.id(), child);
    }

    pub fn get(&self, id: Uuid) -> Option<&T> {
        self.items.get(&id)
    }

    pub fn get_mut(&mut self, id: Uuid) -> Option<&mut T> {
        self.items.get_mut(&id)
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.items.contains_key(&id)
    }

    /// Removes a child, keeping the order of the remaining ones.
    pub fn remove(&mut self, id: Uuid) -> Option<T> {
        self.items.shift_remove(&id)
    }

    pub fn last(&self) -> Option<&T> {
        self.items.last().map(|(_, child)| child)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> Values<'_, Uuid, T> {
        self.items.values()
    }
}

impl<T: Identified> FromIterator<T> for Children<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut children = Self::new();
        for child in iter {
            children.push(child);
        }
        children
    }
}

impl<T> IntoIterator for Children<T> {
    type Item = T;
    type IntoIter = IntoValues<Uuid, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_values()
    }
}

impl<'a, T> IntoIterator for &'a Children<T> {
    type Item = &'a T;
    type IntoIter = Values<'a, Uuid, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.values()
    }
}

impl<T: Serialize> Serialize for Children<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.items.values())
    }
}

impl<'de, T> Deserialize<'de> for Children<T>
where
    T: Deserialize<'de> + Identified,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let list = Vec::<T>::deserialize(deserializer)?;
        Ok(list.into_iter().collect())
    }
}
