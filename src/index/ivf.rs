//! IVF-flat vector index.
//!
//! Vectors are partitioned into `lists` clusters around centroids; a search
//! ranks the centroids against the query and scans only the `probes`
//! closest clusters exhaustively. The first `lists` inserted vectors seed
//! the centroids, `rebuild` refines them with a few rounds of k-means.

use std::cmp::Ordering;

use super::distance::DistanceType;
use super::{OnMissing, VectorIndex};
use crate::core::{DatabaseError, Rid, VectorIndexMeta};

const KMEANS_ITERATIONS: usize = 10;

#[derive(Debug, Clone)]
struct Cluster {
    centroid: Vec<f32>,
    entries: Vec<(Rid, Vec<f32>)>,
}

#[derive(Debug, Clone)]
pub struct IvfFlatIndex {
    name: String,
    field: String,
    dimension: usize,
    distance: DistanceType,
    lists: usize,
    probes: usize,
    clusters: Vec<Cluster>,
}

impl IvfFlatIndex {
    pub fn new(meta: &VectorIndexMeta, dimension: usize) -> Result<Self, DatabaseError> {
        if dimension == 0 || meta.lists == 0 || meta.probes == 0 {
            return Err(DatabaseError::InvalidArgument(format!(
                "vector index '{}' needs positive dimension, lists and probes",
                meta.name
            )));
        }
        Ok(Self {
            name: meta.name.clone(),
            field: meta.field.clone(),
            dimension,
            distance: meta.distance,
            lists: meta.lists,
            probes: meta.probes,
            clusters: Vec::new(),
        })
    }

    fn check_dimension(&self, vector: &[f32]) -> Result<(), DatabaseError> {
        if vector.len() == self.dimension {
            Ok(())
        } else {
            Err(DatabaseError::VectorDimensionMismatch {
                expected: self.dimension,
                actual: vector.len(),
            })
        }
    }

    /// Cluster indexes ordered by centroid distance to `vector`
    fn ranked_clusters(&self, vector: &[f32]) -> Vec<usize> {
        let mut ranked: Vec<(usize, f32)> = self
            .clusters
            .iter()
            .enumerate()
            .map(|(i, c)| (i, self.distance.distance(&c.centroid, vector)))
            .collect();
        ranked.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));
        ranked.into_iter().map(|(i, _)| i).collect()
    }

    fn nearest_cluster(&self, vector: &[f32]) -> Option<usize> {
        self.ranked_clusters(vector).first().copied()
    }

    fn remove_from(&mut self, cluster: usize, rid: Rid) -> bool {
        let entries = &mut self.clusters[cluster].entries;
        let before = entries.len();
        entries.retain(|(r, _)| *r != rid);
        entries.len() != before
    }

    fn mean(vectors: &[&[f32]], dimension: usize) -> Option<Vec<f32>> {
        if vectors.is_empty() {
            return None;
        }
        let mut sum = vec![0.0f32; dimension];
        for v in vectors {
            for (s, x) in sum.iter_mut().zip(v.iter()) {
                *s += x;
            }
        }
        let n = vectors.len() as f32;
        Some(sum.into_iter().map(|s| s / n).collect())
    }
}

impl VectorIndex for IvfFlatIndex {
    fn name(&self) -> &str {
        &self.name
    }

    fn field_name(&self) -> &str {
        &self.field
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn insert(&mut self, vector: &[f32], rid: Rid) -> Result<(), DatabaseError> {
        self.check_dimension(vector)?;
        if self.clusters.len() < self.lists {
            self.clusters.push(Cluster {
                centroid: vector.to_vec(),
                entries: vec![(rid, vector.to_vec())],
            });
            return Ok(());
        }
        if let Some(cluster) = self.nearest_cluster(vector) {
            self.clusters[cluster].entries.push((rid, vector.to_vec()));
        }
        Ok(())
    }

    fn delete(&mut self, vector: &[f32], rid: Rid, on_missing: OnMissing) -> Result<(), DatabaseError> {
        self.check_dimension(vector)?;
        let mut removed = self
            .nearest_cluster(vector)
            .is_some_and(|cluster| self.remove_from(cluster, rid));
        if !removed {
            // centroids may have moved since the entry was placed
            for cluster in 0..self.clusters.len() {
                if self.remove_from(cluster, rid) {
                    removed = true;
                    break;
                }
            }
        }

        if !removed && on_missing == OnMissing::Error {
            return Err(DatabaseError::IndexEntryNotFound {
                index: self.name.clone(),
                rid,
            });
        }
        Ok(())
    }

    fn search(&self, query: &[f32], k: usize) -> Result<Vec<(Rid, f32)>, DatabaseError> {
        self.check_dimension(query)?;
        let mut candidates: Vec<(Rid, f32)> = self
            .ranked_clusters(query)
            .into_iter()
            .take(self.probes)
            .flat_map(|i| self.clusters[i].entries.iter())
            .map(|(rid, v)| (*rid, self.distance.distance(v, query)))
            .collect();
        candidates.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal).then(a.0.cmp(&b.0)));
        candidates.truncate(k);
        Ok(candidates)
    }

    fn rebuild(&mut self) -> Result<(), DatabaseError> {
        let mut entries: Vec<(Rid, Vec<f32>)> = self.clusters.iter_mut().flat_map(|c| c.entries.drain(..)).collect();
        entries.sort_by_key(|(rid, _)| *rid);

        let mut centroids: Vec<Vec<f32>> = self.clusters.iter().map(|c| c.centroid.clone()).collect();
        if centroids.is_empty() {
            return Ok(());
        }

        let mut assignment = vec![0usize; entries.len()];
        for _ in 0..KMEANS_ITERATIONS {
            let mut changed = false;
            for (slot, (_, vector)) in assignment.iter_mut().zip(&entries) {
                let nearest = centroids
                    .iter()
                    .enumerate()
                    .map(|(i, c)| (i, self.distance.distance(c, vector)))
                    .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal))
                    .map_or(0, |(i, _)| i);
                if *slot != nearest {
                    *slot = nearest;
                    changed = true;
                }
            }

            for (i, centroid) in centroids.iter_mut().enumerate() {
                let members: Vec<&[f32]> = entries
                    .iter()
                    .zip(&assignment)
                    .filter(|(_, a)| **a == i)
                    .map(|((_, v), _)| v.as_slice())
                    .collect();
                // an empty cluster keeps its old centroid
                if let Some(mean) = Self::mean(&members, self.dimension) {
                    *centroid = mean;
                }
            }
            if !changed {
                break;
            }
        }

        self.clusters = centroids
            .into_iter()
            .map(|centroid| Cluster {
                centroid,
                entries: Vec::new(),
            })
            .collect();
        for ((rid, vector), cluster) in entries.into_iter().zip(assignment) {
            self.clusters[cluster].entries.push((rid, vector));
        }
        tracing::debug!(index = %self.name, clusters = self.clusters.len(), "rebuilt vector index");
        Ok(())
    }

    fn entry_count(&self) -> usize {
        self.clusters.iter().map(|c| c.entries.len()).sum()
    }
}
