//! JSON manifests of workloads and proposals
//!
//! Used by `validate -f` and by `run --manifests` to seed the memory
//! backend.

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use conductor_application::{AdmissionOperation, AdmissionReview, AdmissionUseCase, EndpointProbe};
use conductor_domain::proposal::PROPOSAL_KIND;
use conductor_domain::workload::WORKLOAD_KIND;
use conductor_domain::{AgentWorkload, AgenticProposal, ValidationError};
use serde_json::Value;
use std::path::{Path, PathBuf};

const DEFAULT_NAMESPACE: &str = "default";

#[derive(Debug, Clone, PartialEq)]
pub enum Manifest {
    Workload(AgentWorkload),
    Proposal(AgenticProposal),
}

impl Manifest {
    /// Parse one object, dispatching on its `kind`.
    pub fn from_json(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text).context("not valid JSON")?;
        let kind = value.get("kind").and_then(Value::as_str).unwrap_or_default();
        let mut manifest = match kind {
            WORKLOAD_KIND => Manifest::Workload(
                serde_json::from_value(value).context("not a valid AgentWorkload")?,
            ),
            PROPOSAL_KIND => Manifest::Proposal(
                serde_json::from_value(value).context("not a valid AgenticProposal")?,
            ),
            "" => bail!("missing `kind`"),
            other => bail!(
                "unsupported kind {}; expected {} or {}",
                other,
                WORKLOAD_KIND,
                PROPOSAL_KIND
            ),
        };

        let meta = match &mut manifest {
            Manifest::Workload(w) => &mut w.metadata,
            Manifest::Proposal(p) => &mut p.metadata,
        };
        if meta.namespace.is_empty() {
            meta.namespace = DEFAULT_NAMESPACE.to_string();
        }
        Ok(manifest)
    }

    pub fn read(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("invalid manifest {}", path.display()))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Manifest::Workload(_) => WORKLOAD_KIND,
            Manifest::Proposal(_) => PROPOSAL_KIND,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Manifest::Workload(w) => w.name(),
            Manifest::Proposal(p) => p.name(),
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            Manifest::Workload(w) => serde_json::to_value(w),
            Manifest::Proposal(p) => serde_json::to_value(p),
        }
        .unwrap_or(Value::Null)
    }

    /// Run admission, applying defaults in place.
    pub async fn admit<P: EndpointProbe + 'static>(
        &mut self,
        admission: &AdmissionUseCase<P>,
        operation: AdmissionOperation,
        now: DateTime<Utc>,
    ) -> Result<AdmissionReview, ValidationError> {
        match self {
            Manifest::Workload(w) => admission.admit_workload(operation, w).await,
            Manifest::Proposal(p) => admission.admit_proposal(operation, p, now),
        }
    }
}

/// Every `*.json` file in `dir`, in file name order.
pub fn load_dir(dir: &Path) -> Result<Vec<(PathBuf, Manifest)>> {
    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)
        .with_context(|| format!("cannot read manifest directory {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
        .collect();
    paths.sort();

    paths
        .into_iter()
        .map(|path| Manifest::read(&path).map(|manifest| (path, manifest)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const WORKLOAD: &str = r#"{
        "apiVersion": "conductor.agentic.io/v1alpha1",
        "kind": "AgentWorkload",
        "metadata": {"name": "minio-tuning"},
        "spec": {
            "type": "minio",
            "engineEndpoint": "http://argo-server.argo.svc:2746",
            "objective": "Keep bucket latency under 50ms",
            "agents": ["planner"]
        }
    }"#;

    #[test]
    fn test_parse_workload_defaults_namespace() {
        let manifest = Manifest::from_json(WORKLOAD).unwrap();
        assert_eq!(manifest.kind(), WORKLOAD_KIND);
        assert_eq!(manifest.name(), "minio-tuning");
        let Manifest::Workload(workload) = manifest else {
            panic!("expected workload");
        };
        assert_eq!(workload.namespace(), "default");
    }

    #[test]
    fn test_unknown_kind() {
        let err = Manifest::from_json(r#"{"kind": "Pod", "metadata": {"name": "x"}}"#).unwrap_err();
        assert!(err.to_string().contains("unsupported kind Pod"));
    }

    #[test]
    fn test_missing_kind() {
        let err = Manifest::from_json(r#"{"metadata": {"name": "x"}}"#).unwrap_err();
        assert!(err.to_string().contains("missing `kind`"));
    }

    #[tokio::test]
    async fn test_admit_workload_without_probe() {
        let mut manifest = Manifest::from_json(WORKLOAD).unwrap();
        let admission = AdmissionUseCase::without_probe();
        let review = manifest
            .admit(&admission, AdmissionOperation::Create, Utc::now())
            .await
            .unwrap();
        assert!(review.warnings.is_empty());
        assert_eq!(manifest.to_json()["kind"], "AgentWorkload");
    }

    #[test]
    fn test_load_dir_skips_other_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b-workload.json"), WORKLOAD).unwrap();
        std::fs::write(dir.path().join("notes.txt"), "not a manifest").unwrap();

        let manifests = load_dir(dir.path()).unwrap();
        assert_eq!(manifests.len(), 1);
        assert!(manifests[0].0.ends_with("b-workload.json"));
    }

    #[test]
    fn test_load_dir_reports_bad_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("broken.json"), "{").unwrap();
        let err = load_dir(dir.path()).unwrap_err();
        assert!(format!("{:#}", err).contains("broken.json"));
    }
}
