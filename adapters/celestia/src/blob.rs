use bytes::Bytes;

use crate::namespace::Namespace;

/// The only blob (namespace) version currently accepted
pub const SUPPORTED_BLOB_VERSION: u8 = 0;
/// The only share format version currently accepted
pub const SUPPORTED_SHARE_VERSION: u8 = 0;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BlobError {
    #[error("Blob data must not be empty")]
    EmptyPayload,

    #[error("Unsupported blob version {0}")]
    UnsupportedBlobVersion(u8),

    #[error("Unsupported share version {0}")]
    UnsupportedShareVersion(u8),

    #[error("Blob of {0} bytes does not fit in a 32 bit sequence length")]
    PayloadTooLarge(usize),
}

/// A blob which passed validation and is ready to be split into shares.
///
/// The namespace version doubles as the blob version, so both the share prefix and the
/// wire `namespace_version` field are taken from [`Namespace::version`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    namespace: Namespace,
    data: Bytes,
    share_version: u8,
}

impl Blob {
    pub fn new(
        namespace: Namespace,
        data: impl Into<Bytes>,
        share_version: u8,
    ) -> Result<Self, BlobError> {
        if namespace.version() != SUPPORTED_BLOB_VERSION {
            return Err(BlobError::UnsupportedBlobVersion(namespace.version()));
        }
        if share_version != SUPPORTED_SHARE_VERSION {
            return Err(BlobError::UnsupportedShareVersion(share_version));
        }
        let data = data.into();
        if data.is_empty() {
            return Err(BlobError::EmptyPayload);
        }
        if u32::try_from(data.len()).is_err() {
            return Err(BlobError::PayloadTooLarge(data.len()));
        }
        Ok(Self {
            namespace,
            data,
            share_version,
        })
    }

    pub fn namespace(&self) -> Namespace {
        self.namespace
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }

    pub fn share_version(&self) -> u8 {
        self.share_version
    }

    /// The payload length, as recorded in the first share and in `MsgPayForBlobs`
    pub fn size(&self) -> u32 {
        // Checked in `Blob::new`
        self.data.len() as u32
    }
}
