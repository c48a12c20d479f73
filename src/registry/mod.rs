//! Model Registry & Version Store (C4)
//!
//! Named models with versions, metrics, backups, and deployment
//! history. Mutations (`deploy`/`rollback`/`record_performance`) are
//! serialized per model via a per-model lock so readers never observe a
//! half-deployed model.

mod drift;

pub use drift::DriftIndicator;

use std::collections::HashMap;
use std::sync::RwLock;

use crate::error::{RegistryError, Result};
use crate::types::{
    now_ms, DeploymentEvent, DeploymentRecord, Model, ModelBackup, ModelHealth, ModelStatus,
    ModelType, PerformanceSample, Version,
};

struct ModelEntry {
    model: Model,
    /// Bounded performance history, most recent last.
    history: Vec<PerformanceSample>,
}

pub struct ModelSpec {
    pub name: String,
    pub r#type: ModelType,
    pub components: Vec<String>,
}

pub struct ModelRegistry {
    models: RwLock<HashMap<String, ModelEntry>>,
    max_model_versions: usize,
    max_backups: usize,
    max_performance_samples: usize,
}

impl ModelRegistry {
    pub fn new(max_model_versions: usize, max_backups: usize, max_performance_samples: usize) -> Self {
        Self {
            models: RwLock::new(HashMap::new()),
            max_model_versions,
            max_backups,
            max_performance_samples,
        }
    }

    pub fn register(&self, spec: ModelSpec) -> Result<()> {
        let mut models = self.models.write().expect("lock poisoned");
        if models.contains_key(&spec.name) {
            return Err(RegistryError::InvalidVersion(format!(
                "model {} already registered",
                spec.name
            ))
            .into());
        }
        models.insert(
            spec.name.clone(),
            ModelEntry {
                model: Model {
                    name: spec.name,
                    r#type: spec.r#type,
                    version: Version::new(1, 0, 0),
                    status: ModelStatus::Active,
                    components: spec.components,
                    current_performance: 0.0,
                    metrics: HashMap::new(),
                    health: ModelHealth {
                        healthy: true,
                        last_checked: now_ms(),
                        issues: Vec::new(),
                    },
                    deployment_history: Vec::new(),
                    backups: Vec::new(),
                    last_updated: now_ms(),
                },
                history: Vec::new(),
            },
        );
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Result<Model> {
        self.models
            .read()
            .expect("lock poisoned")
            .get(name)
            .map(|e| e.model.clone())
            .ok_or_else(|| RegistryError::ModelNotFound(name.to_string()).into())
    }

    pub fn list(&self) -> Vec<Model> {
        self.models
            .read()
            .expect("lock poisoned")
            .values()
            .map(|e| e.model.clone())
            .collect()
    }

    pub fn history(&self, name: &str) -> Result<Vec<PerformanceSample>> {
        self.models
            .read()
            .expect("lock poisoned")
            .get(name)
            .map(|e| e.history.clone())
            .ok_or_else(|| RegistryError::ModelNotFound(name.to_string()).into())
    }

    /// Serialized by the registry's single write lock — simpler than
    /// per-model lock striping and the registry is not large enough for
    /// that to become a bottleneck.
    pub fn record_performance(&self, name: &str, sample: PerformanceSample) -> Result<()> {
        let mut models = self.models.write().expect("lock poisoned");
        let entry = models
            .get_mut(name)
            .ok_or_else(|| RegistryError::ModelNotFound(name.to_string()))?;
        entry.history.push(sample);
        while entry.history.len() > self.max_performance_samples {
            entry.history.remove(0);
        }
        entry.model.current_performance =
            entry.history.iter().map(|s| s.overall).sum::<f64>() / entry.history.len() as f64;
        entry.model.last_updated = now_ms();
        Ok(())
    }

    /// Deploys a training result for `name`. Must only be called from
    /// the improvement pipeline (C5). Atomically backs up, bumps the
    /// patch version, replaces `current_performance`, and appends to
    /// deployment history — external readers never observe a partial
    /// state because the whole sequence happens under the write lock.
    pub fn deploy(
        &self,
        name: &str,
        performance: f64,
        metrics: HashMap<String, f64>,
        backup_before_update: bool,
    ) -> Result<Model> {
        let mut models = self.models.write().expect("lock poisoned");
        let entry = models
            .get_mut(name)
            .ok_or_else(|| RegistryError::ModelNotFound(name.to_string()))?;

        if backup_before_update {
            entry.model.backups.push(ModelBackup {
                version: entry.model.version,
                performance: entry.model.current_performance,
                metrics: entry.model.metrics.clone(),
                timestamp: now_ms(),
            });
            while entry.model.backups.len() > self.max_backups {
                entry.model.backups.remove(0);
            }
        }

        entry.model.version = entry.model.version.bump_patch();
        entry.model.current_performance = performance;
        entry.model.metrics = metrics;
        entry.model.last_updated = now_ms();
        entry.model.status = ModelStatus::Active;

        entry.model.deployment_history.push(DeploymentRecord {
            version: entry.model.version,
            performance,
            timestamp: now_ms(),
            event: DeploymentEvent::ModelDeployed,
        });
        while entry.model.deployment_history.len() > self.max_model_versions {
            entry.model.deployment_history.remove(0);
        }

        Ok(entry.model.clone())
    }

    /// Restores the most recent backup, bumping `PATCH` forward to a new
    /// version number (rollback is still a forward version move, never
    /// a rewind).
    pub fn rollback(&self, name: &str) -> Result<Model> {
        let mut models = self.models.write().expect("lock poisoned");
        let entry = models
            .get_mut(name)
            .ok_or_else(|| RegistryError::ModelNotFound(name.to_string()))?;

        let Some(backup) = entry.model.backups.pop() else {
            return Err(RegistryError::ModelNotFound(format!(
                "no backup available for {name}"
            ))
            .into());
        };

        entry.model.version = entry.model.version.bump_patch();
        entry.model.current_performance = backup.performance;
        entry.model.metrics = backup.metrics;
        entry.model.last_updated = now_ms();

        entry.model.deployment_history.push(DeploymentRecord {
            version: entry.model.version,
            performance: backup.performance,
            timestamp: now_ms(),
            event: DeploymentEvent::ModelRolledBack,
        });
        while entry.model.deployment_history.len() > self.max_model_versions {
            entry.model.deployment_history.remove(0);
        }

        Ok(entry.model.clone())
    }

    /// `detected` when magnitude > 5%; `high` severity if > 15%, else
    /// `medium`. Computed from the last 10 samples vs. the previous 10.
    pub fn drift_indicator(&self, name: &str) -> Result<DriftIndicator> {
        let models = self.models.read().expect("lock poisoned");
        let entry = models
            .get(name)
            .ok_or_else(|| RegistryError::ModelNotFound(name.to_string()))?;
        Ok(drift::compute(&entry.history))
    }

    pub fn restore(&self, models: HashMap<String, Model>) {
        let mut guard = self.models.write().expect("lock poisoned");
        for (name, model) in models {
            guard.insert(
                name,
                ModelEntry {
                    model,
                    history: Vec::new(),
                },
            );
        }
    }

    pub fn snapshot(&self) -> HashMap<String, Model> {
        self.models
            .read()
            .expect("lock poisoned")
            .iter()
            .map(|(k, v)| (k.clone(), v.model.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> ModelRegistry {
        ModelRegistry::new(10, 5, 100)
    }

    #[test]
    fn deploy_bumps_patch_and_keeps_backup() {
        let registry = registry();
        registry
            .register(ModelSpec {
                name: "angel_learning_model".to_string(),
                r#type: ModelType::ReinforcementLearning,
                components: vec![],
            })
            .unwrap();
        let model = registry
            .deploy("angel_learning_model", 0.82, HashMap::new(), true)
            .unwrap();
        assert_eq!(model.version, Version::new(1, 0, 1));
        assert_eq!(model.backups.len(), 1);
        assert!((model.current_performance - 0.82).abs() < 1e-9);
    }

    #[test]
    fn rollback_with_zero_backups_is_not_found() {
        let registry = registry();
        registry
            .register(ModelSpec {
                name: "m".to_string(),
                r#type: ModelType::Generic,
                components: vec![],
            })
            .unwrap();
        let err = registry.rollback("m").unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::NotFound);
    }

    #[test]
    fn repeated_deploy_is_idempotent_in_performance() {
        let registry = registry();
        registry
            .register(ModelSpec {
                name: "m".to_string(),
                r#type: ModelType::Generic,
                components: vec![],
            })
            .unwrap();
        for _ in 0..3 {
            registry.deploy("m", 0.9, HashMap::new(), true).unwrap();
        }
        let model = registry.lookup("m").unwrap();
        assert_eq!(model.version, Version::new(1, 0, 3));
        assert!((model.current_performance - 0.9).abs() < 1e-9);
    }
}
