use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

// ============================================================================
// Health Check Abstractions
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", content = "reason", rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy(String),
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        matches!(self, HealthStatus::Healthy)
    }
}

/// Health information for a component
#[derive(Debug, Clone, Serialize)]
pub struct ComponentHealth {
    pub name: String,
    pub status: HealthStatus,
    pub last_check: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
}

impl ComponentHealth {
    pub fn new(name: impl Into<String>, status: HealthStatus) -> Self {
        Self {
            name: name.into(),
            status,
            last_check: Utc::now(),
            latency_ms: None,
        }
    }

    pub fn with_latency(mut self, latency: std::time::Duration) -> Self {
        self.latency_ms = Some(latency.as_millis() as u64);
        self
    }
}

/// Components that can probe their own dependencies
#[async_trait]
pub trait HealthCheckable: Send + Sync {
    async fn check_health(&self) -> ComponentHealth;

    fn component_name(&self) -> &str;
}
