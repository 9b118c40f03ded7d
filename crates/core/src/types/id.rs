//! Newtype IDs for type-safe entity references.
//!
//! The EcoBloom backend hands out 24-character hex object ids. The client
//! treats them as opaque strings; the `define_id!` macro wraps them so that
//! ids from different entity types cannot be mixed up.

/// Macro to define a type-safe ID wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`
/// - Conversion methods: `new()`, `as_str()`, `into_inner()`, `short()`
/// - `From<String>`, `From<&str>`, and `AsRef<str>` implementations
///
/// # Example
///
/// ```rust
/// # use ecobloom_core::define_id;
/// define_id!(PlantId);
/// define_id!(OrderId);
///
/// let plant_id = PlantId::new("66f2a90d9c3b5e0012ab34cd");
///
/// // These are different types, so this won't compile:
/// // let _: OrderId = plant_id;
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new ID from a string value.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Get the underlying string value.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the ID and return its inner string.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }

            /// The last eight characters, the short form shown in tables.
            #[must_use]
            pub fn short(&self) -> &str {
                let start = self.0.len().saturating_sub(8);
                self.0.get(start..).unwrap_or(&self.0)
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

// Define standard entity IDs
define_id!(UserId);
define_id!(PlantId);
define_id!(OrderId);
define_id!(CategoryId);

/// Whether a string has the shape of a backend object id (24 hex chars).
///
/// Used by the search box shortcut: a query in this shape navigates straight
/// to the plant detail page instead of hitting the suggestion endpoint.
#[must_use]
pub fn looks_like_object_id(s: &str) -> bool {
    s.len() == 24 && s.bytes().all(|b| b.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_form_is_last_eight_chars() {
        let id = OrderId::new("66f2a90d9c3b5e0012ab34cd");
        assert_eq!(id.short(), "12ab34cd");
    }

    #[test]
    fn short_form_of_short_id_is_whole_id() {
        let id = OrderId::new("abc");
        assert_eq!(id.short(), "abc");
    }

    #[test]
    fn object_id_shape() {
        assert!(looks_like_object_id("66f2a90d9c3b5e0012ab34cd"));
        assert!(!looks_like_object_id("66f2a90d9c3b5e0012ab34c")); // 23 chars
        assert!(!looks_like_object_id("66f2a90d9c3b5e0012ab34cz")); // non-hex
        assert!(!looks_like_object_id("money plant"));
        assert!(!looks_like_object_id(""));
    }

    #[test]
    fn serde_is_transparent() {
        let id = PlantId::new("66f2a90d9c3b5e0012ab34cd");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"66f2a90d9c3b5e0012ab34cd\"");
        let back: PlantId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
