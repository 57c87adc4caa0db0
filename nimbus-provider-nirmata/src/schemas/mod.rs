//! Resource schema definitions

pub mod common;
pub mod eks_cluster_type;
