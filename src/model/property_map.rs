//! PropertyMap — the key-value store on nodes and relationships.

use std::collections::HashMap;
use super::Value;

/// A map of property names to values.
pub type PropertyMap = HashMap<String, Value>;

/// Shorthand for building a [`PropertyMap`] from pairs.
///
/// ```rust
/// use neomodel_rs::{props, Value};
/// let bag = props([("name", Value::from("Ada")), ("age", Value::from(36))]);
/// assert_eq!(bag.len(), 2);
/// ```
pub fn props<const N: usize>(pairs: [(&str, Value); N]) -> PropertyMap {
    pairs.into_iter().map(|(k, v)| (k.to_owned(), v)).collect()
}
