//! Export orchestration
//!
//! Runs after the catalog and folder set are complete. Every component is
//! processed independently: resolve its directory, fetch its XML, write the
//! file. One bad component never aborts the rest of the run; the single
//! exception is an authentication rejection mid-run, which means the whole
//! account is unreachable.

use std::sync::Arc;

use atomvault_api::AtomsphereClient;
use atomvault_core::{sanitize_name, ComponentRecord, Error, Result};
use camino::Utf8PathBuf;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info};

use crate::folders::FolderResolver;

/// Default number of in-flight component fetches
const DEFAULT_CONCURRENCY: usize = 4;

/// Per-component export result
#[derive(Debug)]
pub enum ExportOutcome {
    /// The component's XML was written to this path
    Written {
        component_id: String,
        path: Utf8PathBuf,
    },

    /// Fetch or write failed; the rest of the run continued
    Failed { component_id: String, error: Error },
}

impl ExportOutcome {
    /// The component this outcome belongs to
    pub fn component_id(&self) -> &str {
        match self {
            ExportOutcome::Written { component_id, .. } => component_id,
            ExportOutcome::Failed { component_id, .. } => component_id,
        }
    }

    /// Whether the component was written
    pub fn is_written(&self) -> bool {
        matches!(self, ExportOutcome::Written { .. })
    }
}

/// Aggregate counts for one run
#[derive(Debug, Clone, Copy)]
pub struct RunSummary {
    /// Components written successfully
    pub exported: usize,

    /// Components that failed to fetch or write
    pub failed: usize,

    /// Folder integrity anomalies hit while resolving paths
    pub anomalies: u64,
}

impl RunSummary {
    /// Summarize a finished run
    pub fn from_outcomes(outcomes: &[ExportOutcome], anomalies: u64) -> Self {
        let exported = outcomes.iter().filter(|o| o.is_written()).count();
        Self {
            exported,
            failed: outcomes.len() - exported,
            anomalies,
        }
    }
}

/// Drives the per-component fetch-and-write loop
pub struct ExportOrchestrator {
    client: Arc<AtomsphereClient>,
    output_root: Utf8PathBuf,
    concurrency: usize,
    show_progress: bool,
}

impl ExportOrchestrator {
    /// Create an orchestrator writing under `output_root`
    pub fn new(client: Arc<AtomsphereClient>, output_root: Utf8PathBuf) -> Self {
        Self {
            client,
            output_root,
            concurrency: DEFAULT_CONCURRENCY,
            show_progress: true,
        }
    }

    /// Cap the number of in-flight component fetches
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Enable or disable the terminal progress bar
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Export every component, returning one outcome per record
    ///
    /// Folder paths are resolved on a single-threaded warm-up pass, so the
    /// resolver's memo table needs no lock; fetches and writes then run
    /// under the concurrency cap. Returns `Err` only for a mid-run
    /// authentication rejection.
    pub async fn run(
        &self,
        components: Vec<ComponentRecord>,
        resolver: &mut FolderResolver,
    ) -> Result<Vec<ExportOutcome>> {
        let total = components.len();
        info!(total, output = %self.output_root, "starting component export");

        // Warm-up: every destination path is fixed before any task spawns.
        let jobs: Vec<(ComponentRecord, Utf8PathBuf)> = components
            .into_iter()
            .map(|component| {
                let dir = self.output_root.join(resolver.resolve(component.folder_id.as_deref()));
                let dest = dir.join(file_name(&component));
                (component, dest)
            })
            .collect();

        let progress = self.show_progress.then(|| export_progress_bar(total as u64));
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut join_set = JoinSet::new();

        for (component, dest) in jobs {
            let client = self.client.clone();
            let semaphore = semaphore.clone();
            join_set.spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .expect("export semaphore never closes");
                export_one(&client, component, dest).await
            });
        }

        let mut outcomes = Vec::with_capacity(total);
        while let Some(joined) = join_set.join_next().await {
            let outcome = match joined {
                Ok(outcome) => outcome,
                Err(err) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
                // Cancelled tasks only exist after abort_all, which returns.
                Err(_) => continue,
            };

            // A credential rejection mid-run means every remaining fetch
            // would fail the same way; stop immediately.
            if let ExportOutcome::Failed {
                error: Error::Auth { status },
                ..
            } = &outcome
            {
                join_set.abort_all();
                return Err(Error::auth(*status));
            }

            if let Some(pb) = &progress {
                pb.inc(1);
            }
            outcomes.push(outcome);
        }

        if let Some(pb) = progress {
            pb.finish_and_clear();
        }

        let summary = RunSummary::from_outcomes(&outcomes, resolver.anomaly_count());
        info!(
            exported = summary.exported,
            failed = summary.failed,
            anomalies = summary.anomalies,
            "component export finished"
        );

        Ok(outcomes)
    }
}

/// Deterministic, collision-safe file name for a component
///
/// The id suffix keeps two components with the same display name from
/// overwriting each other.
fn file_name(component: &ComponentRecord) -> String {
    format!(
        "{}_v{}_{}.xml",
        sanitize_name(&component.name),
        component.version,
        component.id
    )
}

/// Fetch and write a single component
async fn export_one(
    client: &AtomsphereClient,
    component: ComponentRecord,
    dest: Utf8PathBuf,
) -> ExportOutcome {
    let component_id = component.id.clone();

    let xml = match client.fetch_component_xml(&component.id).await {
        Ok(bytes) => bytes,
        Err(err) if err.is_auth() => {
            return ExportOutcome::Failed {
                component_id,
                error: Error::auth(err.status().unwrap_or(401)),
            };
        }
        Err(err) => {
            return ExportOutcome::Failed {
                component_id,
                error: Error::item_fetch(&component.id, err.to_string()),
            };
        }
    };

    if let Err(err) = write_component(&dest, &xml).await {
        return ExportOutcome::Failed {
            component_id,
            error: err,
        };
    }

    debug!(id = %component_id, path = %dest, "exported component");
    ExportOutcome::Written {
        component_id,
        path: dest,
    }
}

/// Write the XML bytes, creating the directory chain as needed
///
/// Both steps are idempotent: re-running the export overwrites the file in
/// place with identical bytes when the remote is unchanged.
async fn write_component(dest: &Utf8PathBuf, xml: &[u8]) -> Result<()> {
    if let Some(parent) = dest.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|err| Error::write(parent.as_str(), err))?;
    }

    tokio::fs::write(dest, xml)
        .await
        .map_err(|err| Error::write(dest.as_str(), err))
}

/// Progress bar over the component loop
fn export_progress_bar(len: u64) -> ProgressBar {
    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} components",
        )
        .expect("valid progress bar template")
        .progress_chars("#>-"),
    );
    pb
}
