use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use serde::Serialize;

use crate::types::{ClusterLabel, MovieId};

/// Cluster label per movie id, from one build or one import.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ClusterAssignment {
    pub labels: HashMap<MovieId, ClusterLabel>,
    pub num_clusters: usize,
    /// Within-cluster sum of squares, when the assignment was computed here.
    pub inertia: Option<f64>,
}

impl ClusterAssignment {
    pub fn new(labels: HashMap<MovieId, ClusterLabel>, inertia: Option<f64>) -> Self {
        let num_clusters = labels
            .values()
            .collect::<std::collections::HashSet<_>>()
            .len();
        Self {
            labels,
            num_clusters,
            inertia,
        }
    }

    pub fn label(&self, movie_id: MovieId) -> Option<ClusterLabel> {
        self.labels.get(&movie_id).copied()
    }

    /// Ids in `order` that share `movie_id`'s cluster, excluding `movie_id` itself.
    /// `None` when `movie_id` has no label. Labelled ids missing from `order` are skipped.
    pub fn co_members(&self, movie_id: MovieId, order: &[MovieId]) -> Option<Vec<MovieId>> {
        let label = self.label(movie_id)?;
        Some(
            order
                .iter()
                .copied()
                .filter(|&id| id != movie_id && self.label(id) == Some(label))
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Holder for the authoritative cluster assignment.
///
/// Readers take an `Arc` snapshot and keep using it even if a new assignment is
/// swapped in meanwhile.
#[derive(Debug, Default)]
pub struct ClusterState {
    current: RwLock<Option<Arc<ClusterAssignment>>>,
}

impl ClusterState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Option<Arc<ClusterAssignment>> {
        self.current
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Install `assignment`, returning the one it replaced.
    pub fn replace(&self, assignment: ClusterAssignment) -> Option<Arc<ClusterAssignment>> {
        let mut current = self.current.write().unwrap_or_else(|e| e.into_inner());
        current.replace(Arc::new(assignment))
    }

    pub fn clear(&self) -> Option<Arc<ClusterAssignment>> {
        self.current.write().unwrap_or_else(|e| e.into_inner()).take()
    }
}
