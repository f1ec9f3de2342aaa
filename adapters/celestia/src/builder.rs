use bytes::Bytes;
use prost::Message;
use serde::Serialize;
use tracing::{debug, info};

use crate::blob::{Blob, BlobError, SUPPORTED_SHARE_VERSION};
use crate::config::BlobConfig;
use crate::namespace::{Namespace, NamespaceError};
use crate::pfb::{BlobTx, MsgPayForBlobs, ProtoBlob};
use crate::share_commit::{create_commitment, Commitment, CommitmentError};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PrepareError {
    #[error("Invalid namespace: {0}")]
    Namespace(#[from] NamespaceError),

    #[error("Invalid blob: {0}")]
    Blob(#[from] BlobError),

    #[error("Failed to compute share commitment: {0}")]
    Commitment(#[from] CommitmentError),
}

/// Everything needed to pay for a single blob and submit it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreparedBlob {
    #[serde(with = "hex::serde")]
    msg_pay_for_blobs: Vec<u8>,
    #[serde(with = "hex::serde")]
    blob_tx: Vec<u8>,
    blob_size: u32,
    commitment: Commitment,
    #[serde(skip)]
    message: MsgPayForBlobs,
    #[serde(skip)]
    blob: ProtoBlob,
}

impl PreparedBlob {
    /// The encoded `MsgPayForBlobs`, to be wrapped in a transaction and signed
    pub fn msg_pay_for_blobs(&self) -> &[u8] {
        &self.msg_pay_for_blobs
    }

    pub fn message(&self) -> &MsgPayForBlobs {
        &self.message
    }

    /// The encoded `BlobTx` envelope, with an empty `tx` slot
    pub fn blob_tx(&self) -> &[u8] {
        &self.blob_tx
    }

    pub fn blob(&self) -> &ProtoBlob {
        &self.blob
    }

    pub fn blob_size(&self) -> u32 {
        self.blob_size
    }

    pub fn commitment(&self) -> &Commitment {
        &self.commitment
    }

    /// Encodes the envelope around an externally signed transaction.
    pub fn blob_tx_with(&self, signed_tx: &[u8]) -> Vec<u8> {
        BlobTx::with_blobs(signed_tx.to_vec(), vec![self.blob.clone()]).encode_to_vec()
    }
}

/// Turns raw payloads into blobs, commitments and the messages paying for them.
#[derive(Debug, Clone, Default)]
pub struct BlobCommitter {
    config: BlobConfig,
}

impl BlobCommitter {
    pub fn new(config: BlobConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BlobConfig {
        &self.config
    }

    /// Validates user input. Nothing is split or hashed until this succeeds.
    pub fn validate(
        &self,
        namespace_hex: &str,
        payload: impl Into<Bytes>,
    ) -> Result<Blob, PrepareError> {
        let namespace = Namespace::from_hex(namespace_hex)?;
        Ok(Blob::new(namespace, payload, SUPPORTED_SHARE_VERSION)?)
    }

    pub fn commit(&self, blob: &Blob) -> Result<Commitment, CommitmentError> {
        create_commitment(blob, &self.config)
    }

    /// Builds a single `MsgPayForBlobs` covering all `blobs`, in order.
    pub fn pay_for_blobs(
        &self,
        signer: &str,
        blobs: &[Blob],
    ) -> Result<MsgPayForBlobs, CommitmentError> {
        let mut namespaces = Vec::with_capacity(blobs.len());
        let mut blob_sizes = Vec::with_capacity(blobs.len());
        let mut share_commitments = Vec::with_capacity(blobs.len());
        let mut share_versions = Vec::with_capacity(blobs.len());
        for blob in blobs {
            let commitment = self.commit(blob)?;
            debug!(namespace = %blob.namespace(), %commitment, "Committed to blob");
            namespaces.push(blob.namespace().as_bytes().to_vec());
            blob_sizes.push(blob.size());
            share_commitments.push(commitment.0.to_vec());
            share_versions.push(u32::from(blob.share_version()));
        }
        Ok(MsgPayForBlobs::new(
            signer.to_string(),
            namespaces,
            blob_sizes,
            share_commitments,
            share_versions,
        ))
    }

    pub fn build_commitment(
        &self,
        signer: &str,
        namespace_hex: &str,
        payload: impl Into<Bytes>,
    ) -> Result<PreparedBlob, PrepareError> {
        let blob = self.validate(namespace_hex, payload)?;
        let commitment = self.commit(&blob)?;

        let message = MsgPayForBlobs::new(
            signer.to_string(),
            vec![blob.namespace().as_bytes().to_vec()],
            vec![blob.size()],
            vec![commitment.0.to_vec()],
            vec![u32::from(blob.share_version())],
        );
        let proto_blob = ProtoBlob::from_blob(&blob);
        let blob_tx = BlobTx::with_blobs(Vec::new(), vec![proto_blob.clone()]);

        info!(
            namespace = %blob.namespace(),
            size = blob.size(),
            %commitment,
            "Prepared blob"
        );
        Ok(PreparedBlob {
            msg_pay_for_blobs: message.encode_to_vec(),
            blob_tx: blob_tx.encode_to_vec(),
            blob_size: blob.size(),
            commitment,
            message,
            blob: proto_blob,
        })
    }
}

/// [`BlobCommitter::build_commitment`] with the default Celestia parameters.
pub fn build_commitment(
    signer: &str,
    namespace_hex: &str,
    payload: impl Into<Bytes>,
) -> Result<PreparedBlob, PrepareError> {
    BlobCommitter::default().build_commitment(signer, namespace_hex, payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SquareBound;
    use crate::namespace::MAX_NAMESPACE_HEX_LEN;
    use crate::wire::decode_message;

    const SIGNER: &str = "celestia1zfvrrfaq9ud6g9t4kzmslpf24ysaxqfnzee5w9";
    const NAMESPACE: &str = "0000000000000000000000000000000000000000000001";

    #[test]
    fn test_build_is_deterministic() {
        let first = build_commitment(SIGNER, NAMESPACE, vec![0xab; 10]).unwrap();
        let second = build_commitment(SIGNER, NAMESPACE, vec![0xab; 10]).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.blob_size(), 10);
        assert_eq!(first.message().signer(), SIGNER);
        assert_eq!(first.message().blob_sizes(), &[10]);
        assert_eq!(first.message().share_commitments()[0], first.commitment().0);
    }

    #[test]
    fn test_validation_errors() {
        let too_long = "0".repeat(MAX_NAMESPACE_HEX_LEN + 1);
        assert_eq!(
            build_commitment(SIGNER, &too_long, vec![1]),
            Err(PrepareError::Namespace(NamespaceError::InvalidLength {
                max: MAX_NAMESPACE_HEX_LEN,
                actual: MAX_NAMESPACE_HEX_LEN + 1,
            }))
        );
        assert!(matches!(
            build_commitment(SIGNER, "zz", vec![1]),
            Err(PrepareError::Namespace(NamespaceError::InvalidHex { .. }))
        ));
        assert!(matches!(
            build_commitment(SIGNER, "00", vec![1]),
            Err(PrepareError::Namespace(NamespaceError::Reserved(_)))
        ));
        assert_eq!(
            build_commitment(SIGNER, NAMESPACE, Vec::<u8>::new()),
            Err(PrepareError::Blob(BlobError::EmptyPayload))
        );
    }

    #[test]
    fn test_committer_with_custom_config() {
        let config = BlobConfig::new(64, 1, SquareBound::SubtreeWidth).unwrap();
        let committer = BlobCommitter::new(config.clone());
        assert_eq!(committer.config(), &config);

        // 100 bytes span four 64 byte shares
        let prepared = committer
            .build_commitment(SIGNER, NAMESPACE, vec![5; 100])
            .unwrap();
        assert_ne!(
            prepared.commitment(),
            build_commitment(SIGNER, NAMESPACE, vec![5; 100])
                .unwrap()
                .commitment()
        );
    }

    #[test]
    fn test_blob_tx_with_signed_tx() {
        let prepared = build_commitment(SIGNER, NAMESPACE, vec![0xab; 10]).unwrap();
        let unsigned = decode_message::<BlobTx>(prepared.blob_tx()).unwrap();
        assert!(unsigned.tx().is_empty());

        let signed = decode_message::<BlobTx>(&prepared.blob_tx_with(&[1, 2, 3])).unwrap();
        assert_eq!(signed.tx(), &[1, 2, 3]);
        assert_eq!(signed.blobs(), unsigned.blobs());
        assert_eq!(signed.type_id(), "BLOB");
    }

    #[test]
    fn test_pay_for_several_blobs() {
        let committer = BlobCommitter::default();
        let first = committer.validate("01", vec![1; 100]).unwrap();
        let second = committer.validate("02", vec![2; 2000]).unwrap();

        let message = committer
            .pay_for_blobs(SIGNER, &[first.clone(), second.clone()])
            .unwrap();
        assert_eq!(message.blob_sizes(), &[100, 2000]);
        assert_eq!(message.share_versions(), &[0, 0]);
        assert_eq!(message.namespaces()[1], second.namespace().as_bytes().to_vec());
        assert_eq!(
            message.share_commitments()[0],
            committer.commit(&first).unwrap().0.to_vec()
        );
        assert_eq!(
            message.share_commitments()[1],
            committer.commit(&second).unwrap().0.to_vec()
        );
    }

    #[test]
    fn test_prepared_blob_json() {
        let prepared = build_commitment(SIGNER, NAMESPACE, vec![0xab; 10]).unwrap();
        let json = serde_json::to_value(&prepared).unwrap();
        assert_eq!(json["blob_size"], 10);
        assert_eq!(
            json["commitment"],
            "7c59c5647d17d1b83ccf50118e0179db657714609dc54062b35099210da868f7"
        );
        assert_eq!(json["blob_tx"], hex::encode(prepared.blob_tx()));
    }
}
