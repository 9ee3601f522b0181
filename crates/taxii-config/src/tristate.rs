// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Three-valued configuration fields

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A configuration value that remembers whether its key was present
///
/// Fields of this type must carry `#[serde(default)]` (or live in a struct
/// with a container-level default) so that an absent key decodes as
/// [`Tristate::Unset`]. A key present with a JSON `null` decodes as
/// [`Tristate::Null`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Tristate<T> {
    /// Key absent: inherit the parent value
    #[default]
    Unset,
    /// Key present with `null`: ignore the parent and use the built-in default
    Null,
    /// Key present with a concrete value
    Value(T),
}

impl<T> Tristate<T> {
    pub fn is_unset(&self) -> bool {
        matches!(self, Tristate::Unset)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Tristate::Null)
    }

    pub fn as_value(&self) -> Option<&T> {
        match self {
            Tristate::Value(value) => Some(value),
            Tristate::Unset | Tristate::Null => None,
        }
    }
}

impl<T: Clone> Tristate<T> {
    /// Resolve this child setting against its parent
    ///
    /// Only an unset child takes the parent's state; a `Null` child stays
    /// `Null` so that it later resolves to the built-in default.
    pub fn inherit(&self, parent: &Tristate<T>) -> Tristate<T> {
        match self {
            Tristate::Unset => parent.clone(),
            other => other.clone(),
        }
    }

    /// Concrete value, or `default` when unset or null
    pub fn value_or(&self, default: T) -> T {
        self.as_value().cloned().unwrap_or(default)
    }
}

impl<T> From<Option<T>> for Tristate<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => Tristate::Value(value),
            None => Tristate::Null,
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Tristate<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        // Only called when the key is present; absence goes through Default.
        Option::<T>::deserialize(deserializer).map(Tristate::from)
    }
}

impl<T: Serialize> Serialize for Tristate<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Tristate::Value(value) => serializer.serialize_some(value),
            Tristate::Unset | Tristate::Null => serializer.serialize_none(),
        }
    }
}
