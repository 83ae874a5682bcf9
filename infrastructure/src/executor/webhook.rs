//! Plan executor that calls webhooks.
//!
//! `webhook` plans are POSTed as JSON to `parameters.url`. Every other
//! plan type is handed to the fallback executor.

use async_trait::async_trait;
use conductor_application::ports::plan_executor::{DelegatingPlanExecutor, PlanExecutor};
use conductor_domain::core::string::truncate;
use conductor_domain::{AgenticProposal, ExecutionResult, PlanType};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Longest response body kept in the execution result.
const MAX_OUTPUT: usize = 4 * 1024;

pub struct WebhookPlanExecutor {
    client: reqwest::Client,
    timeout: Duration,
    fallback: Arc<dyn PlanExecutor>,
}

impl WebhookPlanExecutor {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            timeout: Duration::from_secs(30),
            fallback: Arc::new(DelegatingPlanExecutor),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_fallback(mut self, fallback: Arc<dyn PlanExecutor>) -> Self {
        self.fallback = fallback;
        self
    }

    async fn call(&self, proposal: &AgenticProposal, url: &str) -> ExecutionResult {
        let body = json!({
            "proposal": proposal.key().to_string(),
            "title": proposal.spec.title,
            "workloadRef": proposal.spec.workload_ref,
            "consensusScore": proposal.status.consensus_score,
            "plan": proposal.spec.execution_plan,
        });

        let response = match self
            .client
            .post(url)
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                warn!(url, error = %e, "Webhook call failed");
                return ExecutionResult::failed(format!("webhook {} failed: {}", url, e));
            }
        };

        let status = response.status();
        let output = match response.text().await {
            Ok(text) => truncate(&text, MAX_OUTPUT),
            Err(e) => format!("<unreadable body: {}>", e),
        };
        info!(url, status = status.as_u16(), "Webhook called");

        if status.is_success() {
            ExecutionResult::succeeded(format!("webhook returned {}", status.as_u16()))
                .with_output(output)
        } else {
            ExecutionResult::failed(format!("webhook returned {}", status.as_u16()))
                .with_output(output)
        }
    }
}

impl Default for WebhookPlanExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PlanExecutor for WebhookPlanExecutor {
    async fn execute(&self, proposal: &AgenticProposal) -> ExecutionResult {
        let plan = &proposal.spec.execution_plan;
        if plan.plan_type != PlanType::Webhook {
            return self.fallback.execute(proposal).await;
        }
        match plan.parameter_str("url") {
            Some(url) => self.call(proposal, url).await,
            None => ExecutionResult::failed("webhook plan has no url parameter"),
        }
    }
}
