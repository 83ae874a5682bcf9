//! `conductor run`: the controller
//!
//! This is where the adapters are wired into the use cases. The memory
//! backend and the Kubernetes backend share one generic wiring function;
//! only the cluster adapter differs.

use super::audit_logger;
use crate::manifest::{self, Manifest};
use anyhow::{Context, Result, bail};
use chrono::Utc;
use conductor_application::{
    AdmissionOperation, AdmissionUseCase, AuditLogger, Controller, ControllerParams, EndpointProbe,
    LicenseSource, ReconcileProposalUseCase, ReconcileWorkloadUseCase, ResourceStore,
    WorkflowEngine,
};
use conductor_domain::{LicenseVerifier, WorkflowDefaults};
use conductor_infrastructure::{
    Backend, ConfiguredLicense, FileConfig, HttpEndpointProbe, InMemoryCluster, KubernetesCluster,
    WebhookPlanExecutor,
};
use conductor_presentation::{BackendArg, RunArgs};
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Everything the reconcilers need besides the cluster adapter.
struct Wiring {
    defaults: WorkflowDefaults,
    verifier: LicenseVerifier,
    license: Arc<dyn LicenseSource>,
    audit: Arc<dyn AuditLogger>,
    params: ControllerParams,
}

pub async fn execute(args: RunArgs, mut config: FileConfig) -> Result<ExitCode> {
    if let Some(backend) = args.backend {
        config.controller.backend = match backend {
            BackendArg::Memory => Backend::Memory,
            BackendArg::Kubernetes => Backend::Kubernetes,
        };
    }
    if let Some(workers) = args.workers {
        config.controller.workers = workers;
    }

    let issues = config.validate();
    for issue in &issues {
        if issue.is_error() {
            error!(key = %issue.key, "{}", issue.message);
        } else {
            warn!(key = %issue.key, "{}", issue.message);
        }
    }
    if issues.iter().any(|i| i.is_error()) {
        bail!("configuration has errors; see `conductor show-config`");
    }

    let wiring = Wiring {
        defaults: config.workflow.to_defaults(),
        verifier: config
            .license
            .verifier()
            .context("license.public_key is not usable")?,
        license: Arc::new(ConfiguredLicense::new(
            config.license.token.clone(),
            config.license.token_file.clone(),
        )),
        audit: audit_logger(&config),
        params: config.controller_params(),
    };

    let shutdown = CancellationToken::new();
    let signal = shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Interrupt received, shutting down"),
            Err(e) => error!(error = %e, "Cannot listen for Ctrl-C; shutting down"),
        }
        signal.cancel();
    });

    match config.controller.backend {
        Backend::Memory => {
            let cluster = Arc::new(InMemoryCluster::new());
            cluster
                .add_template(&wiring.defaults.namespace, &wiring.defaults.template)
                .await;
            if let Some(dir) = &args.manifests {
                let admission = AdmissionUseCase::new(Arc::new(HttpEndpointProbe::new()))
                    .with_probe_timeout(wiring.params.probe_timeout);
                seed(&cluster, &admission, dir).await?;
            }
            info!("Using the in-memory cluster; state is lost on exit");
            serve(cluster, wiring, shutdown).await;
        }
        Backend::Kubernetes => {
            if args.manifests.is_some() {
                warn!("--manifests only applies to the memory backend; ignored");
            }
            let cluster = Arc::new(
                KubernetesCluster::from_config(&config.kubernetes)
                    .context("cannot connect to the API server")?,
            );
            info!(api_server = %config.kubernetes.api_server(), "Using the Kubernetes API");
            serve(cluster, wiring, shutdown).await;
        }
    }

    info!("Controller stopped");
    Ok(ExitCode::SUCCESS)
}

async fn serve<C>(cluster: Arc<C>, wiring: Wiring, shutdown: CancellationToken)
where
    C: ResourceStore + WorkflowEngine + 'static,
{
    let Wiring {
        defaults,
        verifier,
        license,
        audit,
        params,
    } = wiring;

    let workloads =
        ReconcileWorkloadUseCase::new(cluster.clone(), cluster.clone(), defaults, verifier, license)
            .with_audit_logger(audit.clone())
            .with_running_requeue(params.running_requeue);
    let executor = Arc::new(WebhookPlanExecutor::new());
    let proposals =
        ReconcileProposalUseCase::new(cluster.clone(), executor).with_audit_logger(audit);

    let controller = Arc::new(Controller::new(cluster, workloads, proposals, params));
    controller.run(shutdown).await;
}

/// Admit and apply every manifest in `dir`. Rejected objects are logged
/// and skipped.
async fn seed<P: EndpointProbe + 'static>(
    cluster: &InMemoryCluster,
    admission: &AdmissionUseCase<P>,
    dir: &Path,
) -> Result<usize> {
    let mut applied = 0;
    for (path, mut manifest) in manifest::load_dir(dir)? {
        match manifest
            .admit(admission, AdmissionOperation::Create, Utc::now())
            .await
        {
            Ok(review) => {
                for warning in &review.warnings {
                    warn!(file = %path.display(), "{}", warning);
                }
            }
            Err(e) => {
                error!(file = %path.display(), error = %e, "Manifest rejected by admission");
                continue;
            }
        }
        match manifest {
            Manifest::Workload(workload) => {
                cluster.apply_workload(workload).await;
            }
            Manifest::Proposal(proposal) => {
                cluster.apply_proposal(proposal).await;
            }
        }
        applied += 1;
    }
    info!(applied, dir = %dir.display(), "Manifests loaded");
    Ok(applied)
}
