use indexmap::IndexMap;
use itertools::Itertools;
use quire_types::Value;
use std::sync::Arc;

/// Named report parameters, in declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Parameters {
    values: IndexMap<Arc<str>, Value>,
}

impl Parameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: &str, value: impl Into<Value>) {
        self.values.insert(Arc::from(name), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_ref(), v))
    }

    /// Adds every entry of `defaults` that is not already set.
    pub fn merge_defaults(&mut self, defaults: &Parameters) {
        for (name, value) in &defaults.values {
            self.values.entry(name.clone()).or_insert_with(|| value.clone());
        }
    }

    /// An order-independent identity of the parameter values.
    pub fn fingerprint(&self) -> Vec<(Arc<str>, Value)> {
        self.values
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .sorted_by(|a, b| a.0.cmp(&b.0))
            .collect()
    }
}

impl<'a, V: Into<Value>> FromIterator<(&'a str, V)> for Parameters {
    fn from_iter<I: IntoIterator<Item = (&'a str, V)>>(iter: I) -> Self {
        let mut parameters = Parameters::new();
        for (name, value) in iter {
            parameters.set(name, value);
        }
        parameters
    }
}
