//! Cluster adapters implementing the store and workflow-engine ports.

mod in_memory;
mod kubernetes;
mod merge_patch;

pub use in_memory::InMemoryCluster;
pub use kubernetes::KubernetesCluster;
pub use merge_patch::apply_merge_patch;
