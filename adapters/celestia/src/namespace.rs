use std::fmt::{Display, Formatter};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// The length of the namespace version prefix
pub const NS_VER_SIZE: usize = 1;
/// The length of a namespace id
pub const NS_ID_SIZE: usize = 28;
/// The length of a full namespace (version + id)
pub const NS_SIZE: usize = NS_VER_SIZE + NS_ID_SIZE;

/// Longest accepted hex input: a full namespace, version byte included.
pub const MAX_NAMESPACE_HEX_LEN: usize = 2 * NS_SIZE;
const ID_HEX_LEN: usize = 2 * NS_ID_SIZE;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NamespaceError {
    #[error("Namespace contains a non-hex character at position {position}")]
    InvalidHex { position: usize },

    #[error("Invalid namespace length: expected at most {max}, got {actual}")]
    InvalidLength { max: usize, actual: usize },

    #[error("Namespace {0} is reserved")]
    Reserved(Namespace),
}

/// A versioned Celestia namespace: one version byte followed by a 28 byte id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Namespace([u8; NS_SIZE]);

impl Namespace {
    /// Creates a namespace from its version and id, rejecting reserved ids.
    pub fn new(version: u8, id: &[u8]) -> Result<Self, NamespaceError> {
        if id.len() != NS_ID_SIZE {
            return Err(NamespaceError::InvalidLength {
                max: NS_ID_SIZE,
                actual: id.len(),
            });
        }
        let mut bytes = [0u8; NS_SIZE];
        bytes[0] = version;
        bytes[NS_VER_SIZE..].copy_from_slice(id);

        let namespace = Self(bytes);
        if namespace.is_reserved() {
            return Err(NamespaceError::Reserved(namespace));
        }
        Ok(namespace)
    }

    /// Parses a namespace from its 29 byte serialized form.
    pub fn from_raw(bytes: &[u8]) -> Result<Self, NamespaceError> {
        if bytes.len() != NS_SIZE {
            return Err(NamespaceError::InvalidLength {
                max: NS_SIZE,
                actual: bytes.len(),
            });
        }
        Self::new(bytes[0], &bytes[NS_VER_SIZE..])
    }

    /// Parses a user supplied hex namespace.
    ///
    /// Up to 56 hex characters are treated as an id and left-padded with zeros, with
    /// version 0 prepended. 57 or 58 characters are treated as a full namespace whose
    /// first byte is the version. A leading `0x` is ignored.
    pub fn from_hex(hex: &str) -> Result<Self, NamespaceError> {
        let normalized = normalize_hex(hex)?;
        let mut bytes = [0u8; NS_SIZE];
        hex::decode_to_slice(&normalized, &mut bytes)
            .map_err(|_| NamespaceError::InvalidHex { position: 0 })?;
        Self::from_raw(&bytes)
    }

    /// Wraps raw bytes without checking for reserved ids.
    pub(crate) const fn new_unchecked(bytes: [u8; NS_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn version(&self) -> u8 {
        self.0[0]
    }

    pub fn id(&self) -> &[u8] {
        &self.0[NS_VER_SIZE..]
    }

    pub fn as_bytes(&self) -> &[u8; NS_SIZE] {
        &self.0
    }

    /// Returns true if the id is all zeros.
    pub fn is_primary_reserved(&self) -> bool {
        self.id().iter().all(|&b| b == 0)
    }

    /// Returns true if the id is `0xff` everywhere except for a trailing zero byte.
    pub fn is_secondary_reserved(&self) -> bool {
        let id = self.id();
        id[NS_ID_SIZE - 1] == 0 && id[..NS_ID_SIZE - 1].iter().all(|&b| b == 0xff)
    }

    pub fn is_reserved(&self) -> bool {
        self.is_primary_reserved() || self.is_secondary_reserved()
    }
}

/// Normalizes a hex namespace into its canonical 58 character form: lower case,
/// zero padded and prefixed with the version byte.
///
/// Normalizing an already normalized string returns it unchanged.
pub fn normalize_hex(hex: &str) -> Result<String, NamespaceError> {
    let hex = hex
        .strip_prefix("0x")
        .or_else(|| hex.strip_prefix("0X"))
        .unwrap_or(hex);

    if let Some(position) = hex.chars().position(|c| !c.is_ascii_hexdigit()) {
        return Err(NamespaceError::InvalidHex { position });
    }
    // Only ASCII remains, so bytes and characters agree
    if hex.len() > MAX_NAMESPACE_HEX_LEN {
        return Err(NamespaceError::InvalidLength {
            max: MAX_NAMESPACE_HEX_LEN,
            actual: hex.len(),
        });
    }

    let hex = hex.to_ascii_lowercase();
    if hex.len() <= ID_HEX_LEN {
        Ok(format!("00{:0>width$}", hex, width = ID_HEX_LEN))
    } else {
        Ok(format!("{:0>width$}", hex, width = MAX_NAMESPACE_HEX_LEN))
    }
}

impl AsRef<[u8]> for Namespace {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Display for Namespace {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl Serialize for Namespace {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        hex::serde::serialize(self.0, serializer)
    }
}

impl<'de> Deserialize<'de> for Namespace {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let hex = String::deserialize(deserializer)?;
        Self::from_hex(&hex).map_err(serde::de::Error::custom)
    }
}
