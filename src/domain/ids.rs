//! Type-safe session and file identifiers.
//!
//! [`SessionId`] and [`FileId`] are newtype wrappers around [`uuid::Uuid`]
//! (v4) so that a file identifier can never be passed where a session
//! identifier is expected.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(uuid::Uuid);

        impl $name {
            /// Creates a new random identifier (UUID v4).
            #[must_use]
            pub fn new() -> Self {
                Self(uuid::Uuid::new_v4())
            }

            /// Creates an identifier from an existing [`uuid::Uuid`].
            #[must_use]
            pub const fn from_uuid(uuid: uuid::Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the inner [`uuid::Uuid`].
            #[must_use]
            pub const fn as_uuid(&self) -> &uuid::Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<uuid::Uuid> for $name {
            fn from(uuid: uuid::Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for uuid::Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

uuid_id!(
    /// Identifier of an upload session.
    ///
    /// Generated when the session is opened and used as the key in
    /// [`super::SessionRegistry`].
    SessionId
);

uuid_id!(
    /// Identifier of one uploaded file inside a session.
    FileId
);

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn new_generates_unique_ids() {
        assert_ne!(SessionId::new(), SessionId::new());
        assert_ne!(FileId::new(), FileId::new());
    }

    #[test]
    fn display_is_uuid_format() {
        let s = format!("{}", SessionId::new());
        assert_eq!(s.len(), 36);
        assert!(s.contains('-'));
    }

    #[test]
    fn serde_is_transparent() {
        let uuid = uuid::Uuid::new_v4();
        let id = FileId::from_uuid(uuid);
        let Ok(json) = serde_json::to_string(&id) else {
            panic!("serialization failed");
        };
        assert_eq!(json, format!("\"{uuid}\""));
        let Ok(back) = serde_json::from_str::<FileId>(&json) else {
            panic!("deserialization failed");
        };
        assert_eq!(back, id);
    }

    #[test]
    fn uuid_conversions() {
        let uuid = uuid::Uuid::new_v4();
        let id = SessionId::from(uuid);
        assert_eq!(*id.as_uuid(), uuid);
        assert_eq!(uuid::Uuid::from(id), uuid);
    }
}
