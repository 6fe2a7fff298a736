use ethereum_types::H256;
use hexary_rlp::error::RLPDecodeError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrieError {
    #[error("Node with hash {0:#x} is referenced but not present in the DB")]
    MissingNode(H256),
    #[error(transparent)]
    RLPDecode(#[from] RLPDecodeError),
    #[error("Database error: {0}")]
    DbError(anyhow::Error),
    #[error("Invalid input: {0}")]
    InvalidInput(&'static str),
}
