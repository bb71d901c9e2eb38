use serde::{Deserialize, Serialize};

macro_rules! id_type {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        ///
        /// Wraps an `i64` to provide type safety and prevent mixing up
        /// the different identifier families on the wire.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Creates an identifier from a raw value.
            pub fn new(value: i64) -> Self {
                Self(value)
            }

            /// Returns the underlying value.
            pub fn as_i64(&self) -> i64 {
                self.0
            }

            /// Returns true if the identifier is a valid, store-assignable value.
            ///
            /// Stores assign identifiers starting at 1, so zero and negative
            /// values can never refer to an existing record.
            pub fn is_positive(&self) -> bool {
                self.0 > 0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

id_type! {
    /// Unique identifier for a book in the catalogue.
    BookId
}

id_type! {
    /// Unique identifier for a user of the payments service.
    UserId
}

id_type! {
    /// Unique identifier for a payment record.
    PaymentId
}
