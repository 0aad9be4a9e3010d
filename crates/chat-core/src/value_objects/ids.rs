//! Numeric identifiers for users and channels
//!
//! Both are plain 64-bit integers on the wire and in storage. Zero is reserved
//! to mean "not set", which matches how clients omit a channel on chat frames.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Error when parsing an identifier from a string
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum IdParseError {
    #[error("invalid identifier format")]
    InvalidFormat,
}

macro_rules! numeric_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Create an identifier from a raw value
            #[inline]
            pub const fn new(id: i64) -> Self {
                Self(id)
            }

            /// Get the inner i64 value
            #[inline]
            pub const fn into_inner(self) -> i64 {
                self.0
            }

            /// Check if the identifier is unset (zero)
            #[inline]
            pub const fn is_unset(&self) -> bool {
                self.0 == 0
            }

            /// Check if the identifier can name a stored row
            #[inline]
            pub const fn is_valid(&self) -> bool {
                self.0 > 0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
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

        impl std::str::FromStr for $name {
            type Err = IdParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim()
                    .parse::<i64>()
                    .map(Self)
                    .map_err(|_| IdParseError::InvalidFormat)
            }
        }
    };
}

numeric_id!(
    /// Stable user identity, as issued by the credential service
    UserId
);

numeric_id!(
    /// A named routing domain; sessions subscribe to exactly one at a time
    ChannelId
);

impl ChannelId {
    /// The "general" channel every session joins on admission
    pub const GENERAL: Self = Self(1);

    /// Resolve an optional client-supplied channel, falling back to [`ChannelId::GENERAL`]
    #[must_use]
    pub fn or_general(channel: Option<Self>) -> Self {
        channel.filter(|c| !c.is_unset()).unwrap_or(Self::GENERAL)
    }
}
