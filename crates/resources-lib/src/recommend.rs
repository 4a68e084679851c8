//! Resource recommendations from observed usage
//!
//! A container whose usage exceeds its request gets a new request of
//! usage x 1.2 and a new limit of usage x 2.0, rounded up to 500m steps for
//! CPU and 128Mi steps for memory.

use crate::models::{ResourceInfo, ResourceRecommendation};

/// Request headroom over observed usage
pub const REQUEST_FACTOR: f64 = 1.2;

/// Limit headroom over observed usage
pub const LIMIT_FACTOR: f64 = 2.0;

/// CPU rounding step in millicores (500m)
pub const CPU_INCREMENT_MILLICORES: i64 = 500;

/// Memory rounding step in bytes (128Mi)
pub const MEMORY_INCREMENT_BYTES: i64 = 128 * 1024 * 1024;

/// CPU used when the scaled value is not positive (100m)
pub const MIN_CPU_MILLICORES: i64 = 100;

/// Memory used when the scaled value is not positive (64Mi)
pub const MIN_MEMORY_BYTES: i64 = 64 * 1024 * 1024;

/// Tuning for recommendation generation
#[derive(Debug, Clone)]
pub struct RecommendationConfig {
    pub request_factor: f64,
    pub limit_factor: f64,
    pub cpu_increment_millicores: i64,
    pub memory_increment_bytes: i64,
    pub min_cpu_millicores: i64,
    pub min_memory_bytes: i64,
}

impl Default for RecommendationConfig {
    fn default() -> Self {
        Self {
            request_factor: REQUEST_FACTOR,
            limit_factor: LIMIT_FACTOR,
            cpu_increment_millicores: CPU_INCREMENT_MILLICORES,
            memory_increment_bytes: MEMORY_INCREMENT_BYTES,
            min_cpu_millicores: MIN_CPU_MILLICORES,
            min_memory_bytes: MIN_MEMORY_BYTES,
        }
    }
}

/// Turns resource snapshots into recommendations
#[derive(Debug, Clone, Default)]
pub struct Recommender {
    config: RecommendationConfig,
}

impl Recommender {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: RecommendationConfig) -> Self {
        Self { config }
    }

    /// Recommendations for every container that outgrew its requests
    ///
    /// Records without both CPU and memory usage are ignored. Dimensions
    /// that are within their request keep their current values.
    pub fn analyze(&self, resources: &[ResourceInfo]) -> Vec<ResourceRecommendation> {
        resources
            .iter()
            .filter(|r| r.cpu_usage != 0 && r.mem_usage != 0)
            .filter_map(|r| self.recommend(r))
            .collect()
    }

    fn recommend(&self, info: &ResourceInfo) -> Option<ResourceRecommendation> {
        let mut rec = ResourceRecommendation {
            release: info.release.clone(),
            kind: info.kind.clone(),
            name: info.name.clone(),
            container: info.container.clone(),
            cpu_usage: info.cpu_usage,
            mem_usage: info.mem_usage,
            current_cpu_request: info.cpu_request,
            recommended_cpu_request: info.cpu_request,
            current_mem_request: info.mem_request,
            recommended_mem_request: info.mem_request,
            current_cpu_limit: info.cpu_limit,
            recommended_cpu_limit: info.cpu_limit,
            current_mem_limit: info.mem_limit,
            recommended_mem_limit: info.mem_limit,
        };
        let mut needs_update = false;

        if info.cpu_usage > 0 && info.cpu_request > 0 && info.cpu_usage > info.cpu_request {
            rec.recommended_cpu_request =
                self.round_up_cpu(scale(info.cpu_usage, self.config.request_factor));
            rec.recommended_cpu_limit =
                self.round_up_cpu(scale(info.cpu_usage, self.config.limit_factor));
            needs_update = true;
        }

        if info.mem_usage > 0 && info.mem_request > 0 && info.mem_usage > info.mem_request {
            rec.recommended_mem_request =
                self.round_up_memory(scale(info.mem_usage, self.config.request_factor));
            rec.recommended_mem_limit =
                self.round_up_memory(scale(info.mem_usage, self.config.limit_factor));
            needs_update = true;
        }

        needs_update.then_some(rec)
    }

    /// Round millicores up to the next CPU step
    pub fn round_up_cpu(&self, milli_cores: i64) -> i64 {
        if milli_cores <= 0 {
            return self.config.min_cpu_millicores;
        }
        round_up(milli_cores, self.config.cpu_increment_millicores)
    }

    /// Round bytes up to the next memory step
    pub fn round_up_memory(&self, bytes: i64) -> i64 {
        if bytes <= 0 {
            return self.config.min_memory_bytes;
        }
        round_up(bytes, self.config.memory_increment_bytes)
    }
}

/// Recommendations with the default tuning
pub fn analyze_recommendations(resources: &[ResourceInfo]) -> Vec<ResourceRecommendation> {
    Recommender::new().analyze(resources)
}

fn scale(value: i64, factor: f64) -> i64 {
    (value as f64 * factor) as i64
}

fn round_up(value: i64, increment: i64) -> i64 {
    ((value + increment - 1) / increment) * increment
}
