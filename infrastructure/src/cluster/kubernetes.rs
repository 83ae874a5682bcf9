//! Kubernetes API adapter over plain REST.
//!
//! Custom resources live under `/apis/conductor.agentic.io/v1alpha1`,
//! workflows and templates under `/apis/argoproj.io/v1alpha1`. Status
//! writes go to the `/status` sub-resource with the object's
//! `resourceVersion`, so the API server enforces optimistic concurrency.

use crate::config::FileKubernetesConfig;
use async_trait::async_trait;
use conductor_application::ports::cluster::{ClusterError, ResourceStore, WorkflowEngine};
use conductor_domain::workflow::{WORKFLOW_KIND, WORKFLOW_TEMPLATE_KIND, WorkflowTemplate};
use conductor_domain::{
    API_VERSION, AgentWorkload, AgenticProposal, ResourceKind, Workflow,
};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, trace};

const WORKFLOW_GROUP_PATH: &str = "/apis/argoproj.io/v1alpha1";
const MERGE_PATCH: &str = "application/merge-patch+json";

#[derive(Deserialize)]
struct ObjectList<T> {
    items: Vec<T>,
}

/// The `Status` body the API server returns with errors.
#[derive(Deserialize, Default)]
struct ApiStatus {
    #[serde(default)]
    message: String,
    #[serde(default)]
    reason: String,
}

/// Object the request addresses, for error messages.
struct Target<'a> {
    kind: &'a str,
    namespace: &'a str,
    name: &'a str,
}

impl<'a> Target<'a> {
    fn new(kind: &'a str, namespace: &'a str, name: &'a str) -> Self {
        Self {
            kind,
            namespace,
            name,
        }
    }
}

pub struct KubernetesCluster {
    client: reqwest::Client,
    api_server: String,
    token_file: Option<PathBuf>,
}

impl KubernetesCluster {
    pub fn from_config(config: &FileKubernetesConfig) -> Result<Self, ClusterError> {
        let mut builder = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .danger_accept_invalid_certs(config.insecure);

        let ca_file = config.ca_file();
        if ca_file.exists() {
            let pem = std::fs::read(&ca_file).map_err(|e| {
                ClusterError::Fatal(format!("cannot read {}: {}", ca_file.display(), e))
            })?;
            let cert = reqwest::Certificate::from_pem(&pem).map_err(|e| {
                ClusterError::Fatal(format!("invalid CA bundle {}: {}", ca_file.display(), e))
            })?;
            builder = builder.add_root_certificate(cert);
        }

        let client = builder
            .build()
            .map_err(|e| ClusterError::Fatal(format!("cannot build HTTP client: {}", e)))?;
        let token_file = config.token_file();
        Ok(Self {
            client,
            api_server: config.api_server().trim_end_matches('/').to_string(),
            token_file: token_file.exists().then_some(token_file),
        })
    }

    /// Client without credentials, e.g. behind `kubectl proxy`.
    pub fn with_client(client: reqwest::Client, api_server: impl Into<String>) -> Self {
        Self {
            client,
            api_server: api_server.into().trim_end_matches('/').to_string(),
            token_file: None,
        }
    }

    fn resource_path(kind: ResourceKind, namespace: Option<&str>, name: Option<&str>) -> String {
        let mut path = format!("/apis/{}", API_VERSION);
        if let Some(ns) = namespace {
            path.push_str(&format!("/namespaces/{}", ns));
        }
        path.push('/');
        path.push_str(kind.plural());
        if let Some(name) = name {
            path.push('/');
            path.push_str(name);
        }
        path
    }

    fn engine_path(plural: &str, namespace: &str, name: Option<&str>) -> String {
        match name {
            Some(name) => format!(
                "{}/namespaces/{}/{}/{}",
                WORKFLOW_GROUP_PATH, namespace, plural, name
            ),
            None => format!("{}/namespaces/{}/{}", WORKFLOW_GROUP_PATH, namespace, plural),
        }
    }

    /// The service account token is re-read per request; projected tokens rotate.
    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, ClusterError> {
        let url = format!("{}{}", self.api_server, path);
        trace!(%method, %url, "API request");
        let mut request = self.client.request(method, url);
        if let Some(file) = &self.token_file {
            let token = std::fs::read_to_string(file).map_err(|e| {
                ClusterError::Fatal(format!("cannot read token {}: {}", file.display(), e))
            })?;
            request = request.bearer_auth(token.trim());
        }
        Ok(request)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        target: Target<'_>,
    ) -> Result<T, ClusterError> {
        let response = request
            .send()
            .await
            .map_err(|e| ClusterError::Transient(e.to_string()))?;
        let response = check_status(response, &target).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| ClusterError::Transient(format!("unreadable response: {}", e)))
    }
}

async fn check_status(response: Response, target: &Target<'_>) -> Result<Response, ClusterError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body: ApiStatus = response.json().await.unwrap_or_default();
    debug!(status = status.as_u16(), reason = %body.reason, "API error");
    Err(classify(status, body, target))
}

fn classify(status: StatusCode, body: ApiStatus, target: &Target<'_>) -> ClusterError {
    let (kind, namespace, name) = (target.kind, target.namespace, target.name);
    match status {
        StatusCode::NOT_FOUND => ClusterError::not_found(kind, namespace, name),
        StatusCode::CONFLICT if body.reason == "AlreadyExists" => {
            ClusterError::already_exists(kind, namespace, name)
        }
        StatusCode::CONFLICT => ClusterError::conflict(kind, namespace, name),
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
            ClusterError::Rejected(body.message)
        }
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            ClusterError::Fatal(format!(
                "{} {}/{}: {}",
                status.as_u16(),
                namespace,
                name,
                body.message
            ))
        }
        s if s.is_server_error() || s == StatusCode::TOO_MANY_REQUESTS => {
            ClusterError::Transient(format!("{}: {}", s.as_u16(), body.message))
        }
        s => ClusterError::Fatal(format!("unexpected {}: {}", s.as_u16(), body.message)),
    }
}

#[async_trait]
impl ResourceStore for KubernetesCluster {
    async fn get_workload(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<AgentWorkload, ClusterError> {
        let path = Self::resource_path(ResourceKind::AgentWorkload, Some(namespace), Some(name));
        self.send(
            self.request(Method::GET, &path)?,
            Target::new(ResourceKind::AgentWorkload.as_str(), namespace, name),
        )
        .await
    }

    async fn list_workloads(
        &self,
        namespace: Option<&str>,
    ) -> Result<Vec<AgentWorkload>, ClusterError> {
        let path = Self::resource_path(ResourceKind::AgentWorkload, namespace, None);
        let list: ObjectList<AgentWorkload> = self
            .send(
                self.request(Method::GET, &path)?,
                Target::new(ResourceKind::AgentWorkload.as_str(), namespace.unwrap_or(""), ""),
            )
            .await?;
        Ok(list.items)
    }

    async fn update_workload_status(
        &self,
        workload: &AgentWorkload,
    ) -> Result<AgentWorkload, ClusterError> {
        let path = format!(
            "{}/status",
            Self::resource_path(
                ResourceKind::AgentWorkload,
                Some(workload.namespace()),
                Some(workload.name())
            )
        );
        self.send(
            self.request(Method::PUT, &path)?.json(workload),
            Target::new(
                ResourceKind::AgentWorkload.as_str(),
                workload.namespace(),
                workload.name(),
            ),
        )
        .await
    }

    async fn get_proposal(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<AgenticProposal, ClusterError> {
        let path = Self::resource_path(ResourceKind::AgenticProposal, Some(namespace), Some(name));
        self.send(
            self.request(Method::GET, &path)?,
            Target::new(ResourceKind::AgenticProposal.as_str(), namespace, name),
        )
        .await
    }

    async fn list_proposals(
        &self,
        namespace: Option<&str>,
    ) -> Result<Vec<AgenticProposal>, ClusterError> {
        let path = Self::resource_path(ResourceKind::AgenticProposal, namespace, None);
        let list: ObjectList<AgenticProposal> = self
            .send(
                self.request(Method::GET, &path)?,
                Target::new(ResourceKind::AgenticProposal.as_str(), namespace.unwrap_or(""), ""),
            )
            .await?;
        Ok(list.items)
    }

    async fn update_proposal_status(
        &self,
        proposal: &AgenticProposal,
    ) -> Result<AgenticProposal, ClusterError> {
        let path = format!(
            "{}/status",
            Self::resource_path(
                ResourceKind::AgenticProposal,
                Some(proposal.namespace()),
                Some(proposal.name())
            )
        );
        self.send(
            self.request(Method::PUT, &path)?.json(proposal),
            Target::new(
                ResourceKind::AgenticProposal.as_str(),
                proposal.namespace(),
                proposal.name(),
            ),
        )
        .await
    }
}

#[async_trait]
impl WorkflowEngine for KubernetesCluster {
    async fn create_workflow(&self, workflow: &Workflow) -> Result<Workflow, ClusterError> {
        let path = Self::engine_path("workflows", workflow.namespace(), None);
        self.send(
            self.request(Method::POST, &path)?.json(workflow),
            Target::new(WORKFLOW_KIND, workflow.namespace(), workflow.name()),
        )
        .await
    }

    async fn get_workflow(&self, namespace: &str, name: &str) -> Result<Workflow, ClusterError> {
        let path = Self::engine_path("workflows", namespace, Some(name));
        self.send(
            self.request(Method::GET, &path)?,
            Target::new(WORKFLOW_KIND, namespace, name),
        )
        .await
    }

    /// Workflows have no status sub-resource; the patch goes to the object.
    async fn patch_workflow_status(
        &self,
        namespace: &str,
        name: &str,
        patch: &Value,
    ) -> Result<Workflow, ClusterError> {
        let path = Self::engine_path("workflows", namespace, Some(name));
        let body = serde_json::to_vec(patch).map_err(|e| ClusterError::Fatal(e.to_string()))?;
        self.send(
            self.request(Method::PATCH, &path)?
                .header(reqwest::header::CONTENT_TYPE, MERGE_PATCH)
                .body(body),
            Target::new(WORKFLOW_KIND, namespace, name),
        )
        .await
    }

    async fn get_template(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<WorkflowTemplate, ClusterError> {
        let path = Self::engine_path("workflowtemplates", namespace, Some(name));
        self.send(
            self.request(Method::GET, &path)?,
            Target::new(WORKFLOW_TEMPLATE_KIND, namespace, name),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_http::serve_once;

    fn target() -> Target<'static> {
        Target {
            kind: "AgentWorkload",
            namespace: "team-a",
            name: "job-1",
        }
    }

    fn status(reason: &str) -> ApiStatus {
        ApiStatus {
            message: "boom".to_string(),
            reason: reason.to_string(),
        }
    }

    #[test]
    fn test_paths() {
        assert_eq!(
            KubernetesCluster::resource_path(
                ResourceKind::AgentWorkload,
                Some("team-a"),
                Some("job-1")
            ),
            "/apis/conductor.agentic.io/v1alpha1/namespaces/team-a/agentworkloads/job-1"
        );
        assert_eq!(
            KubernetesCluster::resource_path(ResourceKind::AgenticProposal, None, None),
            "/apis/conductor.agentic.io/v1alpha1/agenticproposals"
        );
        assert_eq!(
            KubernetesCluster::engine_path(
                "workflowtemplates",
                "argo-workflows",
                Some("agentic-pipeline")
            ),
            "/apis/argoproj.io/v1alpha1/namespaces/argo-workflows/workflowtemplates/agentic-pipeline"
        );
    }

    #[test]
    fn test_classify() {
        assert!(classify(StatusCode::NOT_FOUND, status("NotFound"), &target()).is_not_found());
        assert!(matches!(
            classify(StatusCode::CONFLICT, status("AlreadyExists"), &target()),
            ClusterError::AlreadyExists { .. }
        ));
        assert!(classify(StatusCode::CONFLICT, status("Conflict"), &target()).is_conflict());
        assert_eq!(
            classify(StatusCode::UNPROCESSABLE_ENTITY, status("Invalid"), &target()),
            ClusterError::Rejected("boom".to_string())
        );
        assert!(matches!(
            classify(StatusCode::SERVICE_UNAVAILABLE, status(""), &target()),
            ClusterError::Transient(_)
        ));
        assert!(matches!(
            classify(StatusCode::FORBIDDEN, status("Forbidden"), &target()),
            ClusterError::Fatal(_)
        ));
    }

    #[tokio::test]
    async fn test_get_template_over_http() {
        let (url, server) = serve_once(
            200,
            r#"{"apiVersion":"argoproj.io/v1alpha1","kind":"WorkflowTemplate","metadata":{"name":"agentic-pipeline","namespace":"argo-workflows"}}"#,
        )
        .await;
        let cluster = KubernetesCluster::with_client(reqwest::Client::new(), url);
        let template = cluster
            .get_template("argo-workflows", "agentic-pipeline")
            .await
            .unwrap();
        assert_eq!(template.metadata.name, "agentic-pipeline");
        assert!(server.await.unwrap().starts_with(
            "GET /apis/argoproj.io/v1alpha1/namespaces/argo-workflows/workflowtemplates/agentic-pipeline "
        ));
    }

    #[tokio::test]
    async fn test_missing_workload_over_http() {
        let (url, _server) = serve_once(
            404,
            r#"{"kind":"Status","reason":"NotFound","message":"not found"}"#,
        )
        .await;
        let cluster = KubernetesCluster::with_client(reqwest::Client::new(), url);
        let err = cluster.get_workload("team-a", "ghost").await.unwrap_err();
        assert_eq!(err, ClusterError::not_found("AgentWorkload", "team-a", "ghost"));
    }

    #[tokio::test]
    async fn test_patch_sends_merge_patch() {
        let (url, server) = serve_once(
            200,
            r#"{"apiVersion":"argoproj.io/v1alpha1","kind":"Workflow","metadata":{"name":"job-1","namespace":"argo-workflows"},"spec":{"workflowTemplateRef":{"name":"agentic-pipeline"}}}"#,
        )
        .await;
        let cluster = KubernetesCluster::with_client(reqwest::Client::new(), url);
        cluster
            .patch_workflow_status(
                "argo-workflows",
                "job-1",
                &serde_json::json!({"status": {"conditions": []}}),
            )
            .await
            .unwrap();
        let request = server.await.unwrap().to_lowercase();
        assert!(request.starts_with(
            "patch /apis/argoproj.io/v1alpha1/namespaces/argo-workflows/workflows/job-1 "
        ));
        assert!(request.contains("content-type: application/merge-patch+json"));
    }
}
