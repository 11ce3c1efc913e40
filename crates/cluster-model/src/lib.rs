//! Cluster records
//!
//! Data types shared by the Cluster API driver and its collaborators:
//! the cluster record persisted by the API layer, its template, node
//! groups, the lifecycle status and the deterministic naming rules used
//! for every infrastructure identifier derived from a cluster.

pub mod cluster;
pub mod naming;
pub mod status;

pub use cluster::*;
pub use naming::*;
pub use status::*;
