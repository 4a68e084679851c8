//! Resource inspection and values patching for Helm releases
//!
//! This crate provides the core functionality for:
//! - Reading container requests and limits from a rendered release manifest
//! - Generating recommendations from observed usage
//! - Writing recommendations back into a values file without reformatting it

pub mod manifest;
pub mod models;
pub mod observability;
pub mod patch;
pub mod quantity;
pub mod recommend;
pub mod sources;

pub use manifest::ManifestExtractor;
pub use models::*;
pub use observability::PatchLogger;
pub use patch::{apply_patches_to_yaml, PatchError, ResourceField, ValuesPatcher};
pub use recommend::{analyze_recommendations, RecommendationConfig, Recommender};
pub use sources::{Aggregation, ContainerUsage, MetricsQuery, NoUsage, ReplicaSource, UsageSource};
