//! Export command
//!
//! Wires the pipeline together: credentials, catalog + folder discovery,
//! then the orchestrated fetch-and-write loop. Exit codes: 0 clean, 1 for
//! fatal errors (configuration, authentication, incomplete catalog), 2 when
//! the run finished but individual components failed.

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use atomvault_api::{AtomsphereClient, CatalogFetcher};
use atomvault_core::Credentials;
use atomvault_export::{ExportOrchestrator, ExportOutcome, FolderResolver, RunSummary};

use crate::cli::ExportArgs;
use crate::output;

/// Exit code for a run that completed with per-component failures
const EXIT_PARTIAL: u8 = 2;

pub async fn run(args: ExportArgs) -> Result<ExitCode> {
    // Pre-flight: fail on missing credentials before any network call.
    let credentials = Credentials::new(args.account_id, args.username, args.api_token)?;

    let client = AtomsphereClient::with_timeout(credentials, Duration::from_secs(args.timeout_secs))
        .context("Failed to construct platform client")?
        .with_base_url(&args.base_url);
    let client = Arc::new(client);

    output::header("AtomSphere account export");

    // The catalog and folder set must be complete before any component is
    // exported; folder resolution depends on the full set.
    let spinner = output::spinner("Discovering components and folders...");
    let fetcher = CatalogFetcher::new(&client);
    let discovery = async {
        let components = fetcher.fetch_all_components().await?;
        let folders = fetcher.fetch_all_folders().await?;
        Ok::<_, atomvault_core::Error>((components, folders))
    }
    .await;
    spinner.finish_and_clear();

    let (components, folders) = discovery?;
    output::info(&format!(
        "Discovered {} components across {} folders",
        components.len(),
        folders.len()
    ));

    if components.is_empty() {
        output::warning("No components found; nothing to export");
        return Ok(ExitCode::SUCCESS);
    }

    let mut resolver = FolderResolver::new(folders);
    let orchestrator = ExportOrchestrator::new(client.clone(), args.output.clone())
        .with_concurrency(args.concurrency)
        .with_progress(!args.no_progress);

    let outcomes = orchestrator.run(components, &mut resolver).await?;
    let summary = RunSummary::from_outcomes(&outcomes, resolver.anomaly_count());

    for outcome in &outcomes {
        if let ExportOutcome::Failed {
            component_id,
            error,
        } = outcome
        {
            output::error(&format!("{}: {}", component_id, error));
        }
    }

    if summary.anomalies > 0 {
        output::warning(&format!(
            "{} folder integrity anomalies (dangling or cyclic parent references); affected paths were truncated",
            summary.anomalies
        ));
    }

    if summary.failed > 0 {
        output::warning(&format!(
            "Exported {} components to {} ({} failed, listed above)",
            summary.exported, args.output, summary.failed
        ));
        Ok(ExitCode::from(EXIT_PARTIAL))
    } else {
        output::success(&format!(
            "Exported {} components to {}",
            summary.exported, args.output
        ));
        Ok(ExitCode::SUCCESS)
    }
}
