//! Ordered collection of model instances or raw values

use serde::{Serialize, Serializer};
use serde_json::Value as Json;
use std::ops::Index;

use crate::error::ModelResult;
use crate::value::Value;

/// Conversion of an element into a plain nested value (maps and sequences only)
pub trait ToArray {
    fn to_array(&self) -> Json;
}

impl ToArray for Json {
    fn to_array(&self) -> Json {
        self.clone()
    }
}

impl ToArray for Value {
    fn to_array(&self) -> Json {
        self.to_json()
    }
}

/// Indexable, iterable sequence preserving insertion order
#[derive(Debug, Clone, PartialEq)]
pub struct Collection<T> {
    items: Vec<T>,
}

impl<T> Default for Collection<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Collection<T> {
    /// Create an empty collection
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Wrap existing items
    pub fn from_items(items: Vec<T>) -> Self {
        Self { items }
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.items.get_mut(index)
    }

    /// Replace the item at `index`, or append when the index is absent or out of range
    pub fn set(&mut self, index: Option<usize>, item: T) {
        match index {
            Some(i) if i < self.items.len() => self.items[i] = item,
            _ => self.items.push(item),
        }
    }

    /// Remove the item at `index`, shifting later items down
    pub fn unset(&mut self, index: usize) -> Option<T> {
        if index < self.items.len() {
            Some(self.items.remove(index))
        } else {
            None
        }
    }

    pub fn exists(&self, index: usize) -> bool {
        index < self.items.len()
    }

    /// Append an item
    pub fn add(&mut self, item: T) -> &mut Self {
        self.items.push(item);
        self
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.items.iter_mut()
    }

    /// First item, if any
    pub fn first(&self) -> Option<&T> {
        self.items.first()
    }

    /// First item matching `predicate`
    pub fn first_where<P>(&self, predicate: P) -> Option<&T>
    where
        P: FnMut(&&T) -> bool,
    {
        self.items.iter().find(predicate)
    }

    /// First item matching the optional predicate, or `default` when none matches
    pub fn first_or<'a, P>(&'a self, predicate: Option<P>, default: &'a T) -> &'a T
    where
        P: FnMut(&&T) -> bool,
    {
        match predicate {
            Some(predicate) => self.first_where(predicate),
            None => self.first(),
        }
        .unwrap_or(default)
    }

    /// Matching items, in order
    pub fn filter<P>(&self, mut predicate: P) -> Collection<T>
    where
        T: Clone,
        P: FnMut(&T) -> bool,
    {
        self.items.iter().filter(|item| predicate(item)).cloned().collect()
    }

    pub fn into_inner(self) -> Vec<T> {
        self.items
    }
}

impl<T: ToArray> Collection<T> {
    /// Recursively resolve contained items to plain nested values
    pub fn to_array(&self) -> Json {
        Json::Array(self.items.iter().map(ToArray::to_array).collect())
    }

    /// Serialize the array form
    pub fn to_json(&self) -> ModelResult<String> {
        Ok(serde_json::to_string(&self.to_array())?)
    }
}

impl<T: ToArray> ToArray for Collection<T> {
    fn to_array(&self) -> Json {
        Collection::to_array(self)
    }
}

impl<T: ToArray> Serialize for Collection<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_array().serialize(serializer)
    }
}

impl<T> Index<usize> for Collection<T> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        &self.items[index]
    }
}

impl<T> FromIterator<T> for Collection<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

impl<T> IntoIterator for Collection<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a Collection<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
