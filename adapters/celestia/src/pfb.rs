//! The celestia-app messages needed to pay for and submit blobs.
//!
//! Field numbers follow `celestia/blob/v1/tx.proto` and `celestia/core/v1/blob/blob.proto`,
//! so the encodings are byte compatible with any protobuf implementation.

use serde::{Deserialize, Serialize};

use crate::blob::Blob;
use crate::wire::{FieldKind, WireLayout};

/// The type id marking a `BlobTx` envelope
pub const BLOB_TX_TYPE_ID: &str = "BLOB";

/// Blob (named after the software celestia-app) represents data submitted to the
/// network together with a `MsgPayForBlobs`.
#[derive(Clone, PartialEq, Eq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProtoBlob {
    #[prost(bytes = "vec", tag = "1")]
    #[serde(with = "crate::utils::base64_bytes")]
    namespace_id: Vec<u8>,
    #[prost(bytes = "vec", tag = "2")]
    #[serde(with = "crate::utils::base64_bytes")]
    data: Vec<u8>,
    #[prost(uint32, tag = "3")]
    share_version: u32,
    #[prost(uint32, tag = "4")]
    namespace_version: u32,
}

impl ProtoBlob {
    pub fn new(
        namespace_id: Vec<u8>,
        data: Vec<u8>,
        share_version: u32,
        namespace_version: u32,
    ) -> Self {
        Self {
            namespace_id,
            data,
            share_version,
            namespace_version,
        }
    }

    /// The wire form of a validated blob. Only the 28 byte id travels in `namespace_id`.
    pub fn from_blob(blob: &Blob) -> Self {
        let namespace = blob.namespace();
        Self {
            namespace_id: namespace.id().to_vec(),
            data: blob.data().to_vec(),
            share_version: u32::from(blob.share_version()),
            namespace_version: u32::from(namespace.version()),
        }
    }

    pub fn namespace_id(&self) -> &[u8] {
        &self.namespace_id
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn share_version(&self) -> u32 {
        self.share_version
    }

    pub fn namespace_version(&self) -> u32 {
        self.namespace_version
    }
}

impl WireLayout for ProtoBlob {
    fn field_kind(field: u32) -> Option<FieldKind> {
        match field {
            1 | 2 => Some(FieldKind::Bytes),
            3 | 4 => Some(FieldKind::Uint32),
            _ => None,
        }
    }
}

/// MsgPayForBlobs pays for the inclusion of a blob in the block.
///
/// The lists are parallel: entry `i` of each describes the `i`-th blob.
#[derive(Clone, PartialEq, Eq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MsgPayForBlobs {
    #[prost(string, tag = "1")]
    signer: String,
    #[prost(bytes = "vec", repeated, tag = "2")]
    #[serde(with = "crate::utils::base64_bytes_vec")]
    namespaces: Vec<Vec<u8>>,
    #[prost(uint32, repeated, tag = "3")]
    blob_sizes: Vec<u32>,
    #[prost(bytes = "vec", repeated, tag = "4")]
    #[serde(with = "crate::utils::base64_bytes_vec")]
    share_commitments: Vec<Vec<u8>>,
    // Field numbers 5 through 7 are reserved
    #[prost(uint32, repeated, tag = "8")]
    share_versions: Vec<u32>,
}

impl MsgPayForBlobs {
    pub fn new(
        signer: String,
        namespaces: Vec<Vec<u8>>,
        blob_sizes: Vec<u32>,
        share_commitments: Vec<Vec<u8>>,
        share_versions: Vec<u32>,
    ) -> Self {
        Self {
            signer,
            namespaces,
            blob_sizes,
            share_commitments,
            share_versions,
        }
    }

    pub fn signer(&self) -> &str {
        &self.signer
    }

    /// Full 29 byte namespaces, version included
    pub fn namespaces(&self) -> &[Vec<u8>] {
        &self.namespaces
    }

    pub fn blob_sizes(&self) -> &[u32] {
        &self.blob_sizes
    }

    pub fn share_commitments(&self) -> &[Vec<u8>] {
        &self.share_commitments
    }

    pub fn share_versions(&self) -> &[u32] {
        &self.share_versions
    }
}

impl WireLayout for MsgPayForBlobs {
    fn field_kind(field: u32) -> Option<FieldKind> {
        match field {
            1 => Some(FieldKind::String),
            2 | 4 => Some(FieldKind::Bytes),
            3 | 8 => Some(FieldKind::RepeatedUint32),
            _ => None,
        }
    }
}

/// BlobTx wraps an encoded sdk.Tx with a second field to contain blobs of data.
/// The raw bytes of the blobs are not signed over, instead they are verified
/// against the `MsgPayForBlobs` that is signed over in the encoded sdk.Tx.
#[derive(Clone, PartialEq, Eq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlobTx {
    #[prost(bytes = "vec", tag = "1")]
    #[serde(with = "crate::utils::base64_bytes")]
    tx: Vec<u8>,
    #[prost(message, repeated, tag = "2")]
    blobs: Vec<ProtoBlob>,
    #[prost(string, tag = "3")]
    type_id: String,
}

impl BlobTx {
    pub fn new(tx: Vec<u8>, blobs: Vec<ProtoBlob>, type_id: String) -> Self {
        Self { tx, blobs, type_id }
    }

    /// Wraps `blobs` in an envelope carrying the standard [`BLOB_TX_TYPE_ID`].
    pub fn with_blobs(tx: Vec<u8>, blobs: Vec<ProtoBlob>) -> Self {
        Self::new(tx, blobs, BLOB_TX_TYPE_ID.to_string())
    }

    pub fn tx(&self) -> &[u8] {
        &self.tx
    }

    pub fn blobs(&self) -> &[ProtoBlob] {
        &self.blobs
    }

    pub fn type_id(&self) -> &str {
        &self.type_id
    }
}

impl WireLayout for BlobTx {
    fn field_kind(field: u32) -> Option<FieldKind> {
        match field {
            1 => Some(FieldKind::Bytes),
            2 => Some(FieldKind::Message(ProtoBlob::field_kind)),
            3 => Some(FieldKind::String),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use hex_literal::hex;
    use prost::encoding::WireType;
    use prost::Message;
    use proptest::prelude::*;

    use super::*;
    use crate::namespace::Namespace;
    use crate::wire::{decode_message, WireError};

    const SIGNER: &str = "celestia1zfvrrfaq9ud6g9t4kzmslpf24ysaxqfnzee5w9";

    fn test_blob() -> ProtoBlob {
        let namespace = Namespace::from_hex("0000000000000000000000000000000000000000000001").unwrap();
        ProtoBlob::from_blob(&Blob::new(namespace, vec![0xab; 10], 0).unwrap())
    }

    fn test_pfb() -> MsgPayForBlobs {
        let mut namespace = vec![0u8; 29];
        namespace[28] = 1;
        MsgPayForBlobs::new(
            SIGNER.to_string(),
            vec![namespace],
            vec![10],
            vec![hex!("7c59c5647d17d1b83ccf50118e0179db657714609dc54062b35099210da868f7").to_vec()],
            vec![0],
        )
    }

    #[test]
    fn test_blob_encoding() {
        let blob = test_blob();
        assert_eq!(blob.namespace_id().len(), 28);
        assert_eq!(
            blob.encode_to_vec(),
            hex!("0a1c00000000000000000000000000000000000000000000000000000001120aabababababababababab")
        );
        assert_eq!(decode_message::<ProtoBlob>(&blob.encode_to_vec()), Ok(blob));
    }

    #[test]
    fn test_pfb_encoding() {
        let expected = hex!(
            "0a2f63656c6573746961317a6676727266617139756436673974346b7a6d736c706632347973617871666e7a6565357739"
            "121d0000000000000000000000000000000000000000000000000000000001"
            "1a010a"
            "22207c59c5647d17d1b83ccf50118e0179db657714609dc54062b35099210da868f7"
            "420100"
        );
        let pfb = test_pfb();
        assert_eq!(pfb.encode_to_vec(), expected);
        assert_eq!(decode_message::<MsgPayForBlobs>(&expected), Ok(pfb));
    }

    #[test]
    fn test_blob_tx_encoding() {
        let blob_tx = BlobTx::with_blobs(Vec::new(), vec![test_blob()]);
        assert_eq!(
            blob_tx.encode_to_vec(),
            hex!("122a0a1c00000000000000000000000000000000000000000000000000000001120aabababababababababab1a04424c4f42")
        );

        let signed = BlobTx::with_blobs(vec![1, 2, 3], vec![test_blob()]);
        let encoded = signed.encode_to_vec();
        assert_eq!(&encoded[..5], &hex!("0a03010203"));
        assert_eq!(decode_message::<BlobTx>(&encoded), Ok(signed));
    }

    #[test]
    fn test_default_messages_encode_empty() {
        assert!(ProtoBlob::default().encode_to_vec().is_empty());
        assert!(MsgPayForBlobs::default().encode_to_vec().is_empty());
        assert!(BlobTx::default().encode_to_vec().is_empty());
        assert_eq!(
            decode_message::<MsgPayForBlobs>(&[]),
            Ok(MsgPayForBlobs::default())
        );
    }

    #[test]
    fn test_unpacked_repeated_fields() {
        // blob_sizes as two separate varint entries, share_versions as one
        let encoded = hex!("180a18144000");
        let pfb = decode_message::<MsgPayForBlobs>(&encoded).unwrap();
        assert_eq!(pfb.blob_sizes(), &[10, 20]);
        assert_eq!(pfb.share_versions(), &[0]);
    }

    #[test]
    fn test_unknown_fields_are_skipped() {
        let mut encoded = test_blob().encode_to_vec();
        // field 9 varint, field 10 fixed64, field 11 bytes, field 12 fixed32
        encoded.extend_from_slice(&hex!("4896015100000000000000005a0201026500000000"));
        assert_eq!(decode_message::<ProtoBlob>(&encoded), Ok(test_blob()));

        let mut encoded = test_pfb().encode_to_vec();
        encoded.extend_from_slice(&hex!("2801"));
        assert_eq!(decode_message::<MsgPayForBlobs>(&encoded), Ok(test_pfb()));
    }

    #[test]
    fn test_malformed_inputs() {
        assert_eq!(
            decode_message::<ProtoBlob>(&[0x80]),
            Err(WireError::TruncatedVarint)
        );
        assert_eq!(
            decode_message::<ProtoBlob>(&[0x0b]),
            Err(WireError::UnknownWireType(3))
        );
        assert_eq!(
            decode_message::<ProtoBlob>(&hex!("0a05ab")),
            Err(WireError::MalformedLengthDelimited {
                len: 5,
                remaining: 1
            })
        );
        assert_eq!(
            decode_message::<ProtoBlob>(&hex!("650000")),
            Err(WireError::UnknownFieldUnskippable {
                field: 12,
                wire_type: WireType::ThirtyTwoBit
            })
        );
        assert_eq!(
            decode_message::<ProtoBlob>(&hex!("188080808010")),
            Err(WireError::IntegerOverflow {
                field: 3,
                value: 1 << 32
            })
        );
        assert_eq!(
            decode_message::<MsgPayForBlobs>(&hex!("0a01ff")),
            Err(WireError::InvalidUtf8(1))
        );
        assert_eq!(
            decode_message::<BlobTx>(&hex!("1001")),
            Err(WireError::UnexpectedWireType {
                field: 2,
                expected: WireType::LengthDelimited,
                actual: WireType::Varint
            })
        );
        // A nested blob whose own length prefix is wrong
        assert_eq!(
            decode_message::<BlobTx>(&hex!("12020a05")),
            Err(WireError::MalformedLengthDelimited {
                len: 5,
                remaining: 0
            })
        );
    }

    #[test]
    fn test_json_view() {
        let json = serde_json::to_value(test_blob()).unwrap();
        assert_eq!(json["namespaceId"], "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAQ==");
        assert_eq!(json["data"], "q6urq6urq6urqw==");
        assert_eq!(json["shareVersion"], 0);
        assert_eq!(json["namespaceVersion"], 0);

        let pfb = test_pfb();
        let json = serde_json::to_string(&pfb).unwrap();
        assert!(json.contains("\"blobSizes\":[10]"));
        assert_eq!(serde_json::from_str::<MsgPayForBlobs>(&json).unwrap(), pfb);
    }

    fn arb_blob() -> impl Strategy<Value = ProtoBlob> {
        (
            proptest::collection::vec(any::<u8>(), 0..40),
            proptest::collection::vec(any::<u8>(), 0..600),
            any::<u32>(),
            any::<u32>(),
        )
            .prop_map(|(id, data, sv, nv)| ProtoBlob::new(id, data, sv, nv))
    }

    proptest! {
        #[test]
        fn proptest_pfb_checked_decode_agrees_with_prost(
            signer in "[a-z0-9]{0,64}",
            namespaces in proptest::collection::vec(proptest::collection::vec(any::<u8>(), 0..32), 0..4),
            blob_sizes in proptest::collection::vec(any::<u32>(), 0..4),
            share_commitments in proptest::collection::vec(proptest::collection::vec(any::<u8>(), 0..32), 0..4),
            share_versions in proptest::collection::vec(any::<u32>(), 0..4),
        ) {
            let pfb = MsgPayForBlobs::new(signer, namespaces, blob_sizes, share_commitments, share_versions);
            let encoded = pfb.encode_to_vec();
            prop_assert_eq!(decode_message::<MsgPayForBlobs>(&encoded), Ok(pfb.clone()));
            prop_assert_eq!(MsgPayForBlobs::decode(&encoded[..]).unwrap(), pfb);
        }

        #[test]
        fn proptest_blob_tx_checked_decode_agrees_with_prost(
            tx in proptest::collection::vec(any::<u8>(), 0..64),
            blobs in proptest::collection::vec(arb_blob(), 0..3),
            type_id in "[A-Z]{0,8}",
        ) {
            let blob_tx = BlobTx::new(tx, blobs, type_id);
            let encoded = blob_tx.encode_to_vec();
            prop_assert_eq!(decode_message::<BlobTx>(&encoded), Ok(blob_tx.clone()));
            prop_assert_eq!(BlobTx::decode(&encoded[..]).unwrap(), blob_tx);
        }

        #[test]
        fn proptest_checked_decode_never_panics(bytes in proptest::collection::vec(any::<u8>(), 0..128)) {
            let _ = decode_message::<BlobTx>(&bytes);
            let _ = decode_message::<MsgPayForBlobs>(&bytes);
        }
    }
}
