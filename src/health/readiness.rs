//! Readiness evaluation over the configured dependencies.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::time;

use crate::config::schema::{DependenciesConfig, ReadinessConfig};
use crate::health::checks::{CheckError, DependencyCheck, TcpProbe};

/// The optional backing services and the time bound for checking them.
#[derive(Debug, Clone)]
pub struct Dependencies {
    database: Option<Arc<dyn DependencyCheck>>,
    cache: Option<Arc<dyn DependencyCheck>>,
    timeout: Duration,
}

impl Dependencies {
    /// No dependencies; every readiness check passes.
    pub fn none(timeout: Duration) -> Self {
        Self {
            database: None,
            cache: None,
            timeout,
        }
    }

    /// TCP probes for whichever of `database_url` / `redis_url` are set.
    pub fn from_config(
        deps: &DependenciesConfig,
        readiness: &ReadinessConfig,
    ) -> Result<Self, CheckError> {
        let mut this = Self::none(Duration::from_millis(readiness.check_timeout_ms));
        if let Some(url) = &deps.database_url {
            this.database = Some(Arc::new(TcpProbe::from_url("database", url)?));
        }
        if let Some(url) = &deps.redis_url {
            this.cache = Some(Arc::new(TcpProbe::from_url("cache", url)?));
        }
        Ok(this)
    }

    pub fn with_database(mut self, check: Arc<dyn DependencyCheck>) -> Self {
        self.database = Some(check);
        self
    }

    pub fn with_cache(mut self, check: Arc<dyn DependencyCheck>) -> Self {
        self.cache = Some(check);
        self
    }

    pub fn database(&self) -> Option<&dyn DependencyCheck> {
        self.database.as_deref()
    }

    /// Run one check under the configured time bound. Returns its latency.
    pub async fn probe(&self, check: &dyn DependencyCheck) -> Result<Duration, CheckError> {
        let started = Instant::now();
        match time::timeout(self.timeout, check.check()).await {
            Ok(result) => result.map(|()| started.elapsed()),
            Err(_) => Err(CheckError::Timeout {
                name: check.name().to_string(),
                timeout_ms: millis(self.timeout),
            }),
        }
    }

    /// Check every configured dependency, stopping at the first failure.
    pub async fn check_all(&self) -> Result<(), CheckError> {
        for check in [&self.database, &self.cache].into_iter().flatten() {
            let latency = self.probe(check.as_ref()).await?;
            tracing::debug!(
                dependency = check.name(),
                latency_ms = millis(latency),
                "Dependency check passed"
            );
        }
        Ok(())
    }
}

/// Whole milliseconds in `duration`, saturating at `u64::MAX`.
pub fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    #[derive(Debug)]
    struct Stalled;

    #[async_trait]
    impl DependencyCheck for Stalled {
        fn name(&self) -> &str {
            "database"
        }

        async fn check(&self) -> Result<(), CheckError> {
            std::future::pending().await
        }
    }

    #[derive(Debug)]
    struct Failing;

    #[async_trait]
    impl DependencyCheck for Failing {
        fn name(&self) -> &str {
            "cache"
        }

        async fn check(&self) -> Result<(), CheckError> {
            Err(CheckError::Failed {
                name: "cache".into(),
                reason: "PING returned LOADING".into(),
            })
        }
    }

    #[tokio::test]
    async fn nothing_configured_is_ready() {
        let deps = Dependencies::none(Duration::from_millis(50));
        assert!(deps.check_all().await.is_ok());
        assert!(deps.database().is_none());
    }

    #[tokio::test]
    async fn stalled_check_times_out() {
        let deps = Dependencies::none(Duration::from_millis(20)).with_database(Arc::new(Stalled));
        let err = deps.check_all().await.unwrap_err();
        assert_eq!(err.to_string(), "database check timed out after 20ms");
    }

    #[tokio::test]
    async fn failing_check_is_reported() {
        let deps = Dependencies::none(Duration::from_millis(50)).with_cache(Arc::new(Failing));
        let err = deps.check_all().await.unwrap_err();
        assert!(err.to_string().contains("PING returned LOADING"));
    }

    #[test]
    fn from_config_builds_probes() {
        let deps = DependenciesConfig {
            database_url: Some("postgres://db:5432/app".into()),
            redis_url: None,
        };
        let built = Dependencies::from_config(&deps, &ReadinessConfig::default()).unwrap();
        assert_eq!(built.database().map(|d| d.name()), Some("database"));
        assert!(built.cache.is_none());
    }

    #[test]
    fn millis_saturates() {
        assert_eq!(millis(Duration::from_millis(1500)), 1500);
        assert_eq!(millis(Duration::MAX), u64::MAX);
    }
}
