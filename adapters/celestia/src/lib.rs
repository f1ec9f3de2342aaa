pub mod blob;
pub mod builder;
pub mod config;
pub mod merkle;
pub mod namespace;
pub mod nmt;
pub mod pfb;
pub mod share_commit;
pub mod shares;
mod utils;
pub mod wire;

pub use blob::{Blob, BlobError};
pub use builder::{build_commitment, BlobCommitter, PrepareError, PreparedBlob};
#[cfg(feature = "native")]
pub use config::from_toml_path;
pub use config::{BlobConfig, ConfigError, SquareBound};
pub use namespace::{Namespace, NamespaceError};
pub use pfb::{BlobTx, MsgPayForBlobs, ProtoBlob};
pub use share_commit::{create_commitment, Commitment, CommitmentError};
pub use wire::{decode_message, WireError};
