use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::blob::{Blob, SUPPORTED_SHARE_VERSION};
use crate::config::BlobConfig;
use crate::namespace::{Namespace, NS_SIZE};

/// The length of the "info byte" field in a share
pub const INFO_BYTE_LEN: usize = 1;
/// The length of the "sequence length" field
pub const SEQUENCE_LENGTH_BYTES: usize = 4;
/// Header bytes preceding the data of the first share of a sequence
pub const FIRST_SHARE_OVERHEAD: usize = NS_SIZE + INFO_BYTE_LEN + SEQUENCE_LENGTH_BYTES;
/// Header bytes preceding the data of every other share
pub const CONTINUATION_SHARE_OVERHEAD: usize = NS_SIZE + INFO_BYTE_LEN;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ShareError {
    #[error("Share of {0} bytes is too short to hold its header")]
    TooShort(usize),

    #[error("Unsupported share version {0}")]
    UnsupportedShareVersion(u8),

    #[error("Share is not the start of a sequence")]
    NotAStartShare,

    #[error("Sequence does not begin with a start share")]
    MissingStartShare,

    #[error("Unexpected start share at index {0}")]
    UnexpectedStartShare(usize),

    #[error("Share at index {0} belongs to a different namespace")]
    NamespaceMismatch(usize),

    #[error("Sequence truncated: expected {expected} bytes, found {actual}")]
    Truncated { expected: usize, actual: usize },
}

/// The info byte packs the share version above a "sequence start" flag.
pub fn info_byte(share_version: u8, is_sequence_start: bool) -> u8 {
    (share_version << 1) | u8::from(is_sequence_start)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Share {
    Continuation(Bytes),
    Start(Bytes),
}

impl AsRef<[u8]> for Share {
    fn as_ref(&self) -> &[u8] {
        self.as_serialized()
    }
}

impl Share {
    /// Parses a serialized share, classifying it by its info byte.
    pub fn new(inner: Bytes) -> Result<Self, ShareError> {
        if inner.len() < CONTINUATION_SHARE_OVERHEAD {
            return Err(ShareError::TooShort(inner.len()));
        }
        let info = inner[NS_SIZE];
        let version = info >> 1;
        if version != SUPPORTED_SHARE_VERSION {
            return Err(ShareError::UnsupportedShareVersion(version));
        }
        if info & 0x01 == 0 {
            return Ok(Self::Continuation(inner));
        }
        if inner.len() < FIRST_SHARE_OVERHEAD {
            return Err(ShareError::TooShort(inner.len()));
        }
        Ok(Self::Start(inner))
    }

    pub fn as_serialized(&self) -> &[u8] {
        match self {
            Share::Continuation(inner) => inner.as_ref(),
            Share::Start(inner) => inner.as_ref(),
        }
    }

    pub fn is_sequence_start(&self) -> bool {
        match self {
            Share::Continuation(_) => false,
            Share::Start(_) => true,
        }
    }

    /// Get the namespace associated with this share
    pub fn namespace(&self) -> Namespace {
        let mut out = [0u8; NS_SIZE];
        out.copy_from_slice(&self.as_serialized()[..NS_SIZE]);
        Namespace::new_unchecked(out)
    }

    pub fn info_byte(&self) -> u8 {
        self.as_serialized()[NS_SIZE]
    }

    pub fn share_version(&self) -> u8 {
        self.info_byte() >> 1
    }

    /// Returns the length of the sequence this share starts.
    pub fn sequence_length(&self) -> Result<u32, ShareError> {
        match self {
            Share::Continuation(_) => Err(ShareError::NotAStartShare),
            Share::Start(inner) => {
                let mut inner = &inner[NS_SIZE + INFO_BYTE_LEN..];
                Ok(inner.get_u32())
            }
        }
    }

    fn data_offset(&self) -> usize {
        match self {
            Share::Continuation(_) => CONTINUATION_SHARE_OVERHEAD,
            Share::Start(_) => FIRST_SHARE_OVERHEAD,
        }
    }

    /// Returns the data portion of this share, padding included.
    pub fn data(&self) -> &[u8] {
        &self.as_serialized()[self.data_offset()..]
    }
}

/// Number of shares needed to hold `data_len` bytes of blob data.
pub fn share_count(data_len: usize, config: &BlobConfig) -> usize {
    let overflow = data_len.saturating_sub(config.first_share_capacity());
    let continuation_capacity = config.continuation_share_capacity();
    1 + overflow / continuation_capacity + usize::from(overflow % continuation_capacity != 0)
}

/// Splits a blob into a sequence of `config.share_size()` byte shares.
///
/// The first share carries the sequence length; only the last share is padded.
pub fn split_shares(blob: &Blob, config: &BlobConfig) -> Vec<Share> {
    let mut shares = Vec::with_capacity(share_count(blob.data().len(), config));
    let mut remaining = blob.data().clone();

    let first_len = remaining.len().min(config.first_share_capacity());
    let chunk = remaining.split_to(first_len);
    shares.push(build_share(blob, Some(blob.size()), &chunk, config.share_size()));

    while !remaining.is_empty() {
        let len = remaining.len().min(config.continuation_share_capacity());
        let chunk = remaining.split_to(len);
        shares.push(build_share(blob, None, &chunk, config.share_size()));
    }
    shares
}

fn build_share(blob: &Blob, sequence_len: Option<u32>, chunk: &[u8], share_size: usize) -> Share {
    let mut share = BytesMut::with_capacity(share_size);
    share.put_slice(blob.namespace().as_bytes());
    share.put_u8(info_byte(blob.share_version(), sequence_len.is_some()));
    if let Some(len) = sequence_len {
        share.put_u32(len);
    }
    share.put_slice(chunk);
    share.resize(share_size, 0);

    let share = share.freeze();
    match sequence_len {
        Some(_) => Share::Start(share),
        None => Share::Continuation(share),
    }
}

/// Reassembles the data of a single sequence, stripping headers and padding.
pub fn parse_sequence(shares: &[Share]) -> Result<Bytes, ShareError> {
    let first = shares.first().ok_or(ShareError::MissingStartShare)?;
    if !first.is_sequence_start() {
        return Err(ShareError::MissingStartShare);
    }
    let expected = first.sequence_length()? as usize;
    let namespace = first.namespace();

    let mut output = BytesMut::with_capacity(expected);
    for (idx, share) in shares.iter().enumerate() {
        if idx > 0 && share.is_sequence_start() {
            return Err(ShareError::UnexpectedStartShare(idx));
        }
        if share.namespace() != namespace {
            return Err(ShareError::NamespaceMismatch(idx));
        }
        let take = share.data().len().min(expected - output.len());
        output.put_slice(&share.data()[..take]);
        if output.len() == expected {
            return Ok(output.freeze());
        }
    }
    Err(ShareError::Truncated {
        expected,
        actual: output.len(),
    })
}
