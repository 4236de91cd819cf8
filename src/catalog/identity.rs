use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::borrow::Borrow;
use std::fmt;

/// Opaque, stable identifier for an installed component (e.g. `akismet/akismet.php`).
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComponentKey(pub String);

/// Name of something a component offers or requires.
///
/// A capability is *real* when it equals a component key and *virtual*
/// otherwise; the two are stored identically and only told apart at lookup.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CapabilityName(pub String);

impl ComponentKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The real capability every component implicitly provides.
    pub fn as_capability(&self) -> CapabilityName {
        CapabilityName(self.0.clone())
    }
}

impl CapabilityName {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for ComponentKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for CapabilityName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ComponentKey {
    fn from(value: &str) -> Self {
        ComponentKey(value.to_string())
    }
}

impl From<&str> for CapabilityName {
    fn from(value: &str) -> Self {
        CapabilityName(value.to_string())
    }
}

impl fmt::Display for ComponentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for CapabilityName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Discovery tier a component was found in.
///
/// `MustUse` components are always loaded: they never appear in the active set
/// but still satisfy dependencies on the local site.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum ComponentTier {
    #[default]
    Standard,
    MustUse,
}

impl ComponentTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentTier::Standard => "standard",
            ComponentTier::MustUse => "must_use",
        }
    }

    fn from_str(value: &str) -> Option<Self> {
        match value {
            "standard" => Some(ComponentTier::Standard),
            "must_use" => Some(ComponentTier::MustUse),
            _ => None,
        }
    }
}

impl Serialize for ComponentTier {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ComponentTier {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Self::from_str(&value)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown component tier '{value}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_serializes_as_snake_case_and_rejects_unknown() {
        let json = serde_json::to_string(&ComponentTier::MustUse).unwrap();
        assert_eq!(json, "\"must_use\"");
        let back: ComponentTier = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ComponentTier::MustUse);

        let err = serde_json::from_str::<ComponentTier>("\"dropin\"").expect_err("unknown tier");
        assert!(err.to_string().contains("dropin"));
    }

    #[test]
    fn key_and_capability_are_transparent_strings() {
        let key = ComponentKey::from("hello-dolly/hello.php");
        let serialized = serde_json::to_string(&key).unwrap();
        assert_eq!(serialized, "\"hello-dolly/hello.php\"");
        let parsed: ComponentKey = serde_json::from_str(&serialized).unwrap();
        assert_eq!(parsed, key);

        assert_eq!(key.as_capability(), CapabilityName::from("hello-dolly/hello.php"));
    }
}
