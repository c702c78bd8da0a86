use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Live resource a capability limit is counted against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Products,
    Categories,
}

/// Capabilities with a known counting rule. A plan row naming anything else
/// fails closed at evaluation time.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Capability {
    ProductSlot,
    CategoryLimit,
}

impl Capability {
    pub const ALL: [Capability; 2] = [Capability::ProductSlot, Capability::CategoryLimit];

    pub fn key(&self) -> &'static str {
        match self {
            Capability::ProductSlot => "product-slot",
            Capability::CategoryLimit => "category-limit",
        }
    }

    pub fn from_key(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|capability| capability.key() == value.trim())
    }

    pub fn resource_kind(&self) -> ResourceKind {
        match self {
            Capability::ProductSlot => ResourceKind::Products,
            Capability::CategoryLimit => ResourceKind::Categories,
        }
    }
}

impl Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_round_trip_through_registry() {
        for capability in Capability::ALL {
            assert_eq!(Capability::from_key(capability.key()), Some(capability));
        }
    }

    #[test]
    fn unknown_key_has_no_counting_rule() {
        assert_eq!(Capability::from_key("storage-gb"), None);
        assert_eq!(Capability::from_key(""), None);
    }

    #[test]
    fn capabilities_count_their_own_resource() {
        assert_eq!(
            Capability::ProductSlot.resource_kind(),
            ResourceKind::Products
        );
        assert_eq!(
            Capability::CategoryLimit.resource_kind(),
            ResourceKind::Categories
        );
    }
}
