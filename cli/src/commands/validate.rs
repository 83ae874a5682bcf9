//! `conductor validate -f`: admission dry run

use crate::manifest::Manifest;
use anyhow::Result;
use chrono::Utc;
use conductor_application::{AdmissionOperation, AdmissionUseCase};
use conductor_infrastructure::{FileConfig, HttpEndpointProbe};
use conductor_presentation::{OperationArg, OutputFormatter, ValidateArgs};
use std::process::ExitCode;
use std::sync::Arc;

pub async fn execute(
    args: ValidateArgs,
    config: &FileConfig,
    formatter: &dyn OutputFormatter,
) -> Result<ExitCode> {
    let mut manifest = Manifest::read(&args.file)?;
    let operation = match args.operation {
        OperationArg::Create => AdmissionOperation::Create,
        OperationArg::Update => AdmissionOperation::Update,
        OperationArg::Delete => AdmissionOperation::Delete,
    };
    let admission = AdmissionUseCase::new(Arc::new(HttpEndpointProbe::new()))
        .with_probe_timeout(config.admission.probe_timeout());

    let kind = manifest.kind();
    let name = manifest.name().to_string();
    match manifest.admit(&admission, operation, Utc::now()).await {
        Ok(review) => {
            println!(
                "{}",
                formatter.admission_accepted(kind, &name, &review, &manifest.to_json())
            );
            Ok(ExitCode::SUCCESS)
        }
        Err(error) => {
            println!("{}", formatter.admission_rejected(kind, &name, &error));
            Ok(ExitCode::FAILURE)
        }
    }
}
