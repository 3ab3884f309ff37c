//! Explicit field-presence wrapper for merge-patch payloads.
//!
//! # Responsibility
//! - Distinguish "field absent from the payload" from "field present"
//!   without overloading `Option` for both meanings.
//!
//! # Invariants
//! - A field absent from the wire deserializes as `Unset`.
//! - A field present on the wire deserializes as `Set`, including an
//!   explicit `null` for nullable targets (`Field<Option<T>>`).

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Presence-aware patch field.
///
/// Used together with `#[serde(default)]` on the patch struct: serde
/// only invokes the deserializer for keys present in the payload, so
/// missing keys fall back to `Unset` while present keys become `Set`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field<T> {
    /// Key was not supplied; leave the target unchanged.
    Unset,
    /// Key was supplied; overwrite the target with this value.
    Set(T),
}

impl<T> Field<T> {
    pub fn is_unset(&self) -> bool {
        matches!(self, Self::Unset)
    }

    pub fn is_set(&self) -> bool {
        matches!(self, Self::Set(_))
    }

    /// Overwrites `slot` when the field was supplied.
    pub fn apply(self, slot: &mut T) {
        if let Self::Set(value) = self {
            *slot = value;
        }
    }

    /// Returns the supplied value, if any.
    pub fn into_option(self) -> Option<T> {
        match self {
            Self::Unset => None,
            Self::Set(value) => Some(value),
        }
    }
}

impl<T> Default for Field<T> {
    fn default() -> Self {
        Self::Unset
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Field<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        T::deserialize(deserializer).map(Self::Set)
    }
}

impl<T: Serialize> Serialize for Field<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Set(value) => value.serialize(serializer),
            // Only reachable when the caller forgot skip_serializing_if.
            Self::Unset => serializer.serialize_none(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Field;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    #[serde(default)]
    struct Probe {
        label: Field<String>,
        note: Field<Option<String>>,
    }

    impl Default for Probe {
        fn default() -> Self {
            Self {
                label: Field::Unset,
                note: Field::Unset,
            }
        }
    }

    #[test]
    fn absent_key_deserializes_as_unset() {
        let probe: Probe = serde_json::from_str("{}").unwrap();
        assert!(probe.label.is_unset());
        assert!(probe.note.is_unset());
    }

    #[test]
    fn present_key_deserializes_as_set() {
        let probe: Probe = serde_json::from_str(r#"{"label": "exam"}"#).unwrap();
        assert_eq!(probe.label, Field::Set("exam".to_string()));
    }

    #[test]
    fn explicit_null_sets_nullable_target_to_none() {
        let probe: Probe = serde_json::from_str(r#"{"note": null}"#).unwrap();
        assert_eq!(probe.note, Field::Set(None));
    }

    #[test]
    fn apply_overwrites_only_when_set() {
        let mut slot = "old".to_string();
        Field::<String>::Unset.apply(&mut slot);
        assert_eq!(slot, "old");
        Field::Set("new".to_string()).apply(&mut slot);
        assert_eq!(slot, "new");
    }
}
