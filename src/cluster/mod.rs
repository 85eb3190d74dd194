//! Cluster assignment: mini-batch k-means over the clustering feature set, with CSV
//! export and import of the resulting labels.

pub mod assigner;
pub mod export;
pub mod kmeans;
pub mod state;

pub use assigner::{ClusterAssigner, ClusterReport, SweepPoint};
pub use kmeans::{KMeansModel, MiniBatchKMeans};
pub use state::{ClusterAssignment, ClusterState};
