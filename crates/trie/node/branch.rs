use hexary_rlp::structs::Encoder;

use crate::error::TrieError;
use crate::nibbles::Nibbles;
use crate::node_hash::NodeHash;
use crate::state::TrieState;
use crate::ValueRLP;

use super::{ExtensionNode, LeafNode, Node};

/// Branch Node of an an Ethereum Compatible Patricia Merkle Trie
/// Contains the hashes of its children nodes and an optional value
#[derive(Debug, Clone, PartialEq)]
pub struct BranchNode {
    pub choices: Box<[NodeHash; 16]>,
    pub value: ValueRLP,
}

impl BranchNode {
    /// Empty choice array for more convenient node-building
    pub const EMPTY_CHOICES: [NodeHash; 16] = [
        NodeHash::const_default(),
        NodeHash::const_default(),
        NodeHash::const_default(),
        NodeHash::const_default(),
        NodeHash::const_default(),
        NodeHash::const_default(),
        NodeHash::const_default(),
        NodeHash::const_default(),
        NodeHash::const_default(),
        NodeHash::const_default(),
        NodeHash::const_default(),
        NodeHash::const_default(),
        NodeHash::const_default(),
        NodeHash::const_default(),
        NodeHash::const_default(),
        NodeHash::const_default(),
    ];

    /// Creates a new branch node given its children, without any stored value
    pub fn new(choices: Box<[NodeHash; 16]>) -> Self {
        Self {
            choices,
            value: Default::default(),
        }
    }

    /// Creates a new branch node given its children and a value
    pub fn new_with_value(choices: Box<[NodeHash; 16]>, value: ValueRLP) -> Self {
        Self { choices, value }
    }

    /// Updates the node's value
    pub fn update(&mut self, new_value: ValueRLP) {
        self.value = new_value;
    }

    /// Retrieves a value from the subtrie originating from this node given its path
    pub fn get(&self, state: &TrieState, mut path: Nibbles) -> Result<Option<ValueRLP>, TrieError> {
        // If path is at the end, return own value if present.
        // Otherwise, check the corresponding choice and delegate accordingly if present.
        match path.next_choice() {
            Some(choice) => {
                // Delegate to children if present
                let child_hash = &self.choices[choice];
                if child_hash.is_valid() {
                    let child_node = state.get_node(child_hash.clone())?;
                    child_node.get(state, path)
                } else {
                    Ok(None)
                }
            }
            None => {
                // Return internal value if present.
                Ok((!self.value.is_empty()).then_some(self.value.clone()))
            }
        }
    }

    /// Inserts a value into the subtrie originating from this node and returns the new root of the subtrie
    pub fn insert(
        mut self,
        state: &mut TrieState,
        mut path: Nibbles,
        value: ValueRLP,
    ) -> Result<Node, TrieError> {
        // If path is at the end, insert or replace its own value.
        // Otherwise, check the corresponding choice and insert or delegate accordingly.
        match path.next_choice() {
            Some(choice) => match &mut self.choices[choice] {
                // Create new child (leaf node)
                choice_hash if !choice_hash.is_valid() => {
                    let new_leaf = LeafNode::new(path, value);
                    *choice_hash = new_leaf.insert_self(state)?;
                }
                // Insert into existing child and then update it
                choice_hash => {
                    let child_node = state.get_node(choice_hash.clone())?;
                    let child_node = child_node.insert(state, path, value)?;
                    *choice_hash = child_node.insert_self(state)?;
                }
            },
            None => {
                // Insert into self
                self.update(value);
            }
        };

        Ok(self.into())
    }

    /// Removes a value from the subtrie originating from this node given its path
    /// Returns the new root of the subtrie (if any) and the removed value if it existed in the subtrie
    pub fn remove(
        mut self,
        state: &mut TrieState,
        mut path: Nibbles,
    ) -> Result<(Option<Node>, Option<ValueRLP>), TrieError> {
        /* Possible flow paths:
            Step 1: Removal
                Branch { [ ... ], Value } -> Branch { [ ... ], None } (remove own value)
                Branch { [ childA, ... ], Value } -> Branch { [ childA', ... ], Value } (remove from child)

            Step 2: Restructure
                [0 children]
                Branch { [], Value } -> Leaf { Value } (no children, with value)
                Branch { [], None } -> gone
                [1 child]
                Branch { [ ExtensionChild ], None } -> Extension { ChoiceIndex+ChildPrefix, ChildChild }
                Branch { [ BranchChild ], None } -> Extension { ChoiceIndex, BranchChild }
                Branch { [ LeafChild ], None } -> Leaf { ChoiceIndex+ChildPartial }
                [+1 children]
                Branch { [ childA, childB, ... ], _ } -> Branch { [ childA, childB, ... ], _ }
        */

        // Step 1: Remove value

        // Check if the value is located in a child subtrie
        let value = match path.next_choice() {
            Some(choice_index) => {
                if self.choices[choice_index].is_valid() {
                    let child_node = state.get_node(self.choices[choice_index].clone())?;
                    // Remove value from child node
                    let (child_node, old_value) = child_node.remove(state, path)?;
                    self.choices[choice_index] = match child_node {
                        // Update child node
                        Some(child_node) => child_node.insert_self(state)?,
                        // Remove child hash if the child subtrie was removed in the process
                        None => NodeHash::default(),
                    };
                    old_value
                } else {
                    None
                }
            }
            None => {
                // Remove own value (if it has one) and return it
                let value = std::mem::take(&mut self.value);
                (!value.is_empty()).then_some(value)
            }
        };

        // Step 2: Restructure self

        let mut valid_children = 0;
        let mut child_index = 0;
        for (index, child) in self.choices.iter().enumerate() {
            if child.is_valid() {
                valid_children += 1;
                child_index = index;
            }
        }
        let new_node = match (valid_children, self.value.is_empty()) {
            // The branch is no longer needed
            (0, true) => None,
            // No more children, convert to a leaf holding the branch's value
            (0, false) => Some(LeafNode::new(Nibbles::from_hex(vec![16]), self.value).into()),
            // A single child and no value, collapse into the child
            (1, true) => {
                let child_hash = self.choices[child_index].clone();
                let child_node = state.get_node(child_hash.clone())?;
                Some(match child_node {
                    // The child branch stays where it is, an extension made of
                    // the vacated choice index leads to it
                    Node::Branch(_) => {
                        ExtensionNode::new(Nibbles::from_hex(vec![child_index as u8]), child_hash)
                            .into()
                    }
                    // Absorb the child extension, prepending the vacated choice index to its prefix
                    Node::Extension(mut extension_node) => {
                        extension_node.prefix.prepend(child_index as u8);
                        extension_node.into()
                    }
                    // Absorb the child leaf, prepending the vacated choice index to its partial path
                    Node::Leaf(mut leaf_node) => {
                        leaf_node.partial.prepend(child_index as u8);
                        leaf_node.into()
                    }
                })
            }
            // The branch keeps enough edges to stay as it is
            _ => Some(self.into()),
        };

        Ok((new_node, value))
    }

    /// Computes the node's hash
    pub fn compute_hash(&self) -> NodeHash {
        NodeHash::from_encoded_raw(self.encode_raw())
    }

    /// Encodes the node into its canonical form: a 17-item list holding one
    /// entry per choice plus the stored value
    pub fn encode_raw(&self) -> Vec<u8> {
        let mut buf = vec![];
        let mut encoder = Encoder::new(&mut buf);
        for child in self.choices.iter() {
            encoder = match child {
                NodeHash::Hashed(hash) => encoder.encode_bytes(hash.as_bytes()),
                NodeHash::Inline(raw) if !raw.is_empty() => encoder.encode_raw(raw),
                _ => encoder.encode_bytes(&[]),
            };
        }
        encoder.encode_bytes(&self.value).finish();
        buf
    }

    /// Inserts the node into the state and returns its hash
    pub fn insert_self(self, state: &mut TrieState) -> Result<NodeHash, TrieError> {
        let hash = self.compute_hash();
        state.insert_node(self.into(), hash.clone());
        Ok(hash)
    }
}
