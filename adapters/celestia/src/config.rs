use serde::{Deserialize, Deserializer, Serialize};

use crate::shares::{CONTINUATION_SHARE_OVERHEAD, FIRST_SHARE_OVERHEAD};

/// Selects the value whose square root bounds the subtree width.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SquareBound {
    /// `round_up_pow2(ceil(sqrt(subtree_width)))`
    #[default]
    SubtreeWidth,
    /// `round_up_pow2(ceil(sqrt(share_count)))`, as celestia-app computes the
    /// minimum square size of a blob.
    ShareCount,
}

/// Protocol parameters used when splitting blobs and computing their commitments.
///
/// Every `BlobConfig` has passed validation, whether it was built with
/// [`BlobConfig::new`] or deserialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlobConfig {
    share_size: usize,
    subtree_root_threshold: usize,
    square_bound: SquareBound,
}

/// The unchecked form of [`BlobConfig`], as read from a config file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
struct RawBlobConfig {
    /// The size of a share, in bytes
    #[serde(default = "default_share_size")]
    share_size: usize,
    /// The maximum number of subtree roots a commitment may be built from before
    /// subtrees start growing
    #[serde(default = "default_subtree_root_threshold")]
    subtree_root_threshold: usize,
    #[serde(default)]
    square_bound: SquareBound,
}

const fn default_share_size() -> usize {
    512
}

const fn default_subtree_root_threshold() -> usize {
    64
}

impl Default for BlobConfig {
    fn default() -> Self {
        Self {
            share_size: default_share_size(),
            subtree_root_threshold: default_subtree_root_threshold(),
            square_bound: SquareBound::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("Share size {share_size} leaves no room for data after the {overhead} byte header")]
    ShareSizeTooSmall { share_size: usize, overhead: usize },

    #[error("Subtree root threshold must be positive")]
    ZeroSubtreeRootThreshold,
}

impl<'de> Deserialize<'de> for BlobConfig {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = RawBlobConfig::deserialize(deserializer)?;
        Self::new(raw.share_size, raw.subtree_root_threshold, raw.square_bound)
            .map_err(serde::de::Error::custom)
    }
}

impl BlobConfig {
    pub fn new(
        share_size: usize,
        subtree_root_threshold: usize,
        square_bound: SquareBound,
    ) -> Result<Self, ConfigError> {
        if share_size <= FIRST_SHARE_OVERHEAD {
            return Err(ConfigError::ShareSizeTooSmall {
                share_size,
                overhead: FIRST_SHARE_OVERHEAD,
            });
        }
        if subtree_root_threshold == 0 {
            return Err(ConfigError::ZeroSubtreeRootThreshold);
        }
        Ok(Self {
            share_size,
            subtree_root_threshold,
            square_bound,
        })
    }

    pub fn with_square_bound(self, square_bound: SquareBound) -> Self {
        Self {
            square_bound,
            ..self
        }
    }

    /// The size of a share, in bytes
    pub fn share_size(&self) -> usize {
        self.share_size
    }

    /// The maximum number of subtree roots a commitment may be built from before
    /// subtrees start growing
    pub fn subtree_root_threshold(&self) -> usize {
        self.subtree_root_threshold
    }

    pub fn square_bound(&self) -> SquareBound {
        self.square_bound
    }

    /// Payload bytes carried by the first share of a blob
    pub fn first_share_capacity(&self) -> usize {
        self.share_size - FIRST_SHARE_OVERHEAD
    }

    /// Payload bytes carried by every following share
    pub fn continuation_share_capacity(&self) -> usize {
        self.share_size - CONTINUATION_SHARE_OVERHEAD
    }
}

/// Reads a TOML file and deserializes it into `R`.
#[cfg(feature = "native")]
pub fn from_toml_path<P: AsRef<std::path::Path>, R: serde::de::DeserializeOwned>(
    path: P,
) -> anyhow::Result<R> {
    let contents = std::fs::read_to_string(path)?;
    let result: R = toml::from_str(&contents)?;
    Ok(result)
}
