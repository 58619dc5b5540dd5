// SPDX-License-Identifier: MIT
// Copyright (c) 2026 bridgehub contributors

//! Typed peer identifiers.
//!
//! Every identifier in the hub arrives over the wire as a string: an
//! 8-hex admission token that becomes a portal id, a monotonic client
//! session id, a client-chosen sandbox UUID, a bridge-client instance
//! UUID. They are stored inline in a fixed-size buffer so registry
//! keys stay `Copy` and allocation-free.

/// Maximum byte length for an inline ID.
///
/// Sized for the longest identifier on the wire: a canonical UUID
/// (36 bytes, client-chosen sandbox ids and bridge instance ids).
pub const ID_MAX_LEN: usize = 36;

/// Fixed-size inline ID buffer. Always ≤ 36 ASCII bytes, `Copy`.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct IdBuf {
    len: u8,
    buf: [u8; ID_MAX_LEN],
}

impl std::hash::Hash for IdBuf {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        // Hash only the active bytes so it matches str::hash,
        // which is required for Borrow<str> map lookups.
        self.as_str().hash(state);
    }
}

impl IdBuf {
    pub const fn empty() -> Self {
        Self { len: 0, buf: [0; ID_MAX_LEN] }
    }

    pub fn new(s: &str) -> Self {
        debug_assert!(
            s.len() <= ID_MAX_LEN,
            "ID exceeds {} bytes ({} bytes): {:?}",
            ID_MAX_LEN,
            s.len(),
            s,
        );
        let len = s.len().min(ID_MAX_LEN);
        let mut buf = [0u8; ID_MAX_LEN];
        buf[..len].copy_from_slice(&s.as_bytes()[..len]);
        Self { len: len as u8, buf }
    }

    pub fn as_str(&self) -> &str {
        // Invariant: only constructed from &str, always valid UTF-8.
        match std::str::from_utf8(&self.buf[..self.len as usize]) {
            Ok(s) => s,
            Err(_) => unreachable!("IdBuf constructed from non-UTF-8"),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl std::borrow::Borrow<str> for IdBuf {
    fn borrow(&self) -> &str {
        self.as_str()
    }
}

impl std::fmt::Debug for IdBuf {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self.as_str())
    }
}

impl std::fmt::Display for IdBuf {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl serde::Serialize for IdBuf {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> serde::Deserialize<'de> for IdBuf {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        if s.len() > ID_MAX_LEN {
            return Err(serde::de::Error::custom(format!(
                "ID exceeds {} bytes: {:?}",
                ID_MAX_LEN, s
            )));
        }
        Ok(IdBuf::new(&s))
    }
}

/// Define a newtype ID wrapper around [`IdBuf`].
///
/// Generates `from_string()`, `as_str()`, `is_empty()`, `Display`,
/// `From<String>`, `From<&str>`, `PartialEq<str>`, `PartialEq<&str>`,
/// `Borrow<str>`, and `Deref` implementations. IDs are never invented
/// by the hub itself except through typed constructors, so there is no
/// blanket random `new()`.
#[macro_export]
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        pub struct $name:ident;
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub $crate::id::IdBuf);

        impl $name {
            /// Create an ID from an existing string (wire input).
            pub fn from_string(id: impl AsRef<str>) -> Self {
                Self($crate::id::IdBuf::new(id.as_ref()))
            }

            pub fn as_str(&self) -> &str {
                self.0.as_str()
            }

            /// Returns true if the ID is an empty string.
            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0.as_str())
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self::from_string(s)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self::from_string(s)
            }
        }

        impl From<&String> for $name {
            fn from(s: &String) -> Self {
                Self::from_string(s)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                self.0.as_str()
            }
        }

        impl PartialEq<str> for $name {
            fn eq(&self, other: &str) -> bool {
                self.0.as_str() == other
            }
        }

        impl PartialEq<&str> for $name {
            fn eq(&self, other: &&str) -> bool {
                self.0.as_str() == *other
            }
        }

        impl std::borrow::Borrow<str> for $name {
            fn borrow(&self) -> &str {
                self.0.as_str()
            }
        }

        impl std::ops::Deref for $name {
            type Target = str;

            fn deref(&self) -> &str {
                self.0.as_str()
            }
        }
    };
}

crate::define_id! {
    /// Portal identifier. Equal to the admission token the portal
    /// consumed at registration; never reused for a later portal.
    pub struct PortalId;
}

crate::define_id! {
    /// Client session identifier, assigned monotonically on connect.
    pub struct SessionId;
}

impl SessionId {
    /// Session ids are minted in connect order: `sess-1`, `sess-2`, …
    pub fn numbered(n: u64) -> Self {
        Self::from_string(format!("sess-{n}"))
    }
}

crate::define_id! {
    /// Sandbox identifier, chosen by the owning client (typically a UUID).
    pub struct SandboxId;
}

crate::define_id! {
    /// Bridge-client instance identifier, chosen by the child's
    /// interception shim when it opens its channel.
    pub struct InstanceId;
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
