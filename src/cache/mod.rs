//! Versioned cache partitions
//!
//! Responses live in named partitions, one per logical role and generation
//! (`app-shell-v4`, `dynamic-resources-v4`). Changing the version tag is the
//! only way to invalidate a partition wholesale: partitions with other names
//! are swept on the next activation.
//!
//! # Backends
//!
//! | Backend | Lifetime | Use |
//! |---------|----------|-----|
//! | [`MemoryStore`] | process | tests, embedding |
//! | [`DiskStore`] | persistent | CLI, across invocations |

mod disk;
pub mod key;
mod memory;
pub mod names;
pub mod store;

pub use disk::DiskStore;
pub use key::CacheKey;
pub use memory::MemoryStore;
pub use names::{AllowList, CacheNames, PartitionRole};
pub use store::{Partition, PartitionStore};
