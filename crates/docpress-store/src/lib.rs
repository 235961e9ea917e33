#![warn(missing_docs)]

//! In-memory reference implementation of the docpress persistence
//! collaborator, with an indexed content-hash lookup and commit-time hash
//! uniqueness.

pub mod memory;

pub use memory::MemoryDocumentStore;
