// crates/veilcraft-core/src/hexid.rs
//
// Shared plumbing for 32-byte identifiers that render as 0x-prefixed hex
// in logs, configuration files, and the JSON event stream.

macro_rules! impl_hex32 {
    ($name:ident) => {
        impl $name {
            /// Wrap raw bytes.
            pub const fn from_bytes(bytes: [u8; 32]) -> Self {
                Self(bytes)
            }

            /// Borrow the raw bytes.
            pub fn as_bytes(&self) -> &[u8; 32] {
                &self.0
            }

            /// Whether every byte is zero.
            pub fn is_zero(&self) -> bool {
                self.0 == [0u8; 32]
            }

            /// Render as a 0x-prefixed lowercase hex string.
            pub fn to_hex(&self) -> String {
                format!("0x{}", ::hex::encode(self.0))
            }

            /// Parse from hex, with or without a 0x prefix.
            pub fn from_hex(s: &str) -> Result<Self, $crate::error::CraftError> {
                let trimmed = s.strip_prefix("0x").unwrap_or(s);
                let raw = ::hex::decode(trimmed).map_err(|e| {
                    $crate::error::CraftError::Serialization(format!(
                        "invalid hex for {}: {}",
                        stringify!($name),
                        e
                    ))
                })?;
                let bytes: [u8; 32] = raw.try_into().map_err(|_| {
                    $crate::error::CraftError::Serialization(format!(
                        "{} must be exactly 32 bytes",
                        stringify!($name)
                    ))
                })?;
                Ok(Self(bytes))
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(&self.to_hex())
            }
        }

        impl ::std::fmt::Debug for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                write!(f, "{}({})", stringify!($name), self.to_hex())
            }
        }

        impl ::std::str::FromStr for $name {
            type Err = $crate::error::CraftError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::from_hex(s)
            }
        }

        impl ::serde::Serialize for $name {
            fn serialize<S: ::serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.to_hex())
            }
        }

        impl<'de> ::serde::Deserialize<'de> for $name {
            fn deserialize<D: ::serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = <String as ::serde::Deserialize>::deserialize(deserializer)?;
                Self::from_hex(&s).map_err(::serde::de::Error::custom)
            }
        }
    };
}

pub(crate) use impl_hex32;
