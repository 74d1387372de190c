//! Per-element local style tables and the named style classes they refer to.

use crate::key::StyleKey;
use crate::value::{StyleValue, ValueType};
use indexmap::IndexMap;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StyleError {
    #[error("Style key '{key}' expects a {expected} value, got {actual}")]
    TypeMismatch {
        key: StyleKey,
        expected: ValueType,
        actual: ValueType,
    },

    #[error("Unknown style key: '{0}'")]
    UnknownKey(String),

    #[error(transparent)]
    Parse(#[from] crate::parsers::StyleParseError),
}

/// The locally-set values of one element, indexed by [`StyleKey`].
///
/// A key without a local value is absent, not defaulted: the resolver then
/// consults the element's class, its parent and finally the key's default.
#[derive(Debug, Clone, PartialEq)]
pub struct StyleSheet {
    values: Vec<Option<StyleValue>>,
}

impl Default for StyleSheet {
    fn default() -> Self {
        Self::new()
    }
}

/// A snapshot of every local value, used to undo edits exactly.
#[derive(Debug, Clone, PartialEq)]
pub struct StyleChangeSet {
    values: Vec<Option<StyleValue>>,
}

impl StyleSheet {
    pub fn new() -> Self {
        Self {
            values: vec![None; StyleKey::COUNT],
        }
    }

    fn slot(&mut self, key: StyleKey) -> &mut Option<StyleValue> {
        if self.values.len() < StyleKey::COUNT {
            self.values.resize(StyleKey::COUNT, None);
        }
        &mut self.values[key.index()]
    }

    pub fn get(&self, key: StyleKey) -> Option<&StyleValue> {
        self.values.get(key.index()).and_then(Option::as_ref)
    }

    pub fn is_local(&self, key: StyleKey) -> bool {
        self.get(key).is_some()
    }

    /// Sets a local value. The value must have the key's type.
    pub fn set(&mut self, key: StyleKey, value: impl Into<StyleValue>) -> Result<(), StyleError> {
        let value = value.into();
        if value.value_type() != key.value_type() {
            return Err(StyleError::TypeMismatch {
                key,
                expected: key.value_type(),
                actual: value.value_type(),
            });
        }
        *self.slot(key) = Some(value);
        Ok(())
    }

    /// Sets a value given as text, parsing it according to the key's type.
    pub fn set_text(&mut self, key: &str, text: &str) -> Result<(), StyleError> {
        let key: StyleKey = key.parse().map_err(|_| StyleError::UnknownKey(key.to_string()))?;
        let value = match key.value_type() {
            ValueType::Bool => StyleValue::Bool(text.trim().eq_ignore_ascii_case("true")),
            ValueType::Length => StyleValue::Length(crate::parsers::parse_dimension(text)?),
            ValueType::Integer => StyleValue::Integer(text.trim().parse().map_err(|_| {
                StyleError::TypeMismatch {
                    key,
                    expected: ValueType::Integer,
                    actual: ValueType::Text,
                }
            })?),
            ValueType::Text => StyleValue::text(text),
            ty => StyleValue::from_data(ty, &quire_types::Value::text(text)).ok_or(
                StyleError::TypeMismatch {
                    key,
                    expected: ty,
                    actual: ValueType::Text,
                },
            )?,
        };
        self.set(key, value)
    }

    pub fn remove(&mut self, key: StyleKey) -> Option<StyleValue> {
        self.slot(key).take()
    }

    /// Iterates the locally-set keys in key order.
    pub fn local_keys(&self) -> impl Iterator<Item = StyleKey> + '_ {
        StyleKey::ALL.iter().copied().filter(|k| self.is_local(*k))
    }

    pub fn capture(&self) -> StyleChangeSet {
        StyleChangeSet {
            values: self.values.clone(),
        }
    }

    pub fn restore(&mut self, changes: &StyleChangeSet) {
        self.values.clone_from(&changes.values);
    }
}

/// Named style classes, referenced by elements and resolved between the
/// inherited value and the element's own local values.
#[derive(Debug, Clone, Default)]
pub struct NamedStyles {
    classes: IndexMap<String, Arc<StyleSheet>>,
}

impl NamedStyles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, sheet: StyleSheet) {
        self.classes.insert(name.into(), Arc::new(sheet));
    }

    pub fn get(&self, name: &str) -> Option<&Arc<StyleSheet>> {
        self.classes.get(name)
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.classes.keys().map(String::as_str)
    }
}
