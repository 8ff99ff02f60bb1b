use serde::{Deserialize, Serialize};

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Wraps a raw storage identifier.
            pub const fn new(id: i64) -> Self {
                Self(id)
            }

            /// Returns the raw storage identifier.
            pub const fn as_i64(&self) -> i64 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

entity_id!(
    /// Identifier of a customer record.
    UserId
);

entity_id!(
    /// Identifier of a placed order, assigned by storage on insert.
    OrderId
);

entity_id!(
    /// Identifier of a catalog product.
    ProductId
);

entity_id!(
    /// Identifier of a catalog collection.
    CollectionId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_preserves_raw_value() {
        let id = ProductId::new(42);
        assert_eq!(id.as_i64(), 42);
        assert_eq!(i64::from(id), 42);
        assert_eq!(OrderId::from(7).to_string(), "7");
    }

    #[test]
    fn id_serializes_as_bare_number() {
        let json = serde_json::to_string(&UserId::new(15)).unwrap();
        assert_eq!(json, "15");

        let id: OrderId = serde_json::from_str("99").unwrap();
        assert_eq!(id, OrderId::new(99));
    }

    #[test]
    fn ids_order_by_raw_value() {
        assert!(CollectionId::new(1) < CollectionId::new(2));
    }
}
