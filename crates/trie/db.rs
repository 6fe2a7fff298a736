pub mod in_memory;

use crate::error::TrieError;

/// Contract for the trie's backend key-value store.
/// Keys are node hashes and values are canonically encoded nodes, so writes
/// of distinct content to the same key cannot occur and writes are idempotent.
pub trait TrieDB {
    fn get(&self, key: Vec<u8>) -> Result<Option<Vec<u8>>, TrieError>;
    fn put(&self, key: Vec<u8>, value: Vec<u8>) -> Result<(), TrieError>;
}
