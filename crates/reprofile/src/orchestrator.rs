//! Cross-tenant orchestration.
//!
//! Tenants migrate independently, so the network run spawns one drive task
//! per tenant and lets them proceed in parallel. Within a tenant the drive
//! stays strictly sequential. A failed tenant is reported and skipped; the
//! rest of the network keeps going.

use std::path::Path;
use std::sync::Arc;

use miette::{IntoDiagnostic, Result, miette};
use reprofile_engine::Migrator;
use reprofile_store::{TenantId, TenantRegistry};
use tokio::sync::mpsc;
use tracing::{error, info};

use crate::driver::{self, Progress, TenantReport};

/// Migrate every tenant under `data_dir`, in parallel across tenants.
pub async fn run(data_dir: &Path, page_size: u64) -> Result<()> {
    let registry = Arc::new(TenantRegistry::new(data_dir));
    let tenants = registry.list_tenants().into_diagnostic()?;

    if tenants.is_empty() {
        println!("No tenant databases found in {}", data_dir.display());
        return Ok(());
    }

    let migrator = Migrator::new(page_size);
    info!(
        tenants = tenants.len(),
        page_size = migrator.page_size(),
        "starting network migration"
    );

    let (progress_tx, mut progress_rx) = mpsc::channel::<Progress>(64);

    let aggregator = tokio::spawn(async move {
        while let Some(progress) = progress_rx.recv().await {
            info!(
                tenant = %progress.tenant,
                covered = progress.covered,
                total = progress.total,
                "window complete"
            );
        }
    });

    let mut handles = Vec::with_capacity(tenants.len());
    for tenant in tenants {
        let registry = Arc::clone(&registry);
        let progress = progress_tx.clone();
        let handle = tokio::spawn(driver::drive_tenant(registry, tenant.clone(), migrator, progress));
        handles.push((tenant, handle));
    }
    drop(progress_tx);

    let mut reports = Vec::new();
    let mut failures = Vec::new();
    for (tenant, handle) in handles {
        match handle.await {
            Ok(Ok(report)) => reports.push(report),
            Ok(Err(e)) => {
                error!(tenant = %tenant, error = %e, "tenant migration failed");
                failures.push((tenant, e.to_string()));
            }
            Err(e) => {
                error!(tenant = %tenant, error = %e, "tenant drive panicked");
                failures.push((tenant, e.to_string()));
            }
        }
    }

    let _ = aggregator.await;

    print_summary(&reports, &failures);

    if failures.is_empty() {
        Ok(())
    } else {
        Err(miette!("{} tenant(s) failed to migrate", failures.len()))
    }
}

fn print_summary(reports: &[TenantReport], failures: &[(TenantId, String)]) {
    println!("\n=== Migration summary ===");
    for report in reports {
        println!(
            "  {}: {} profiles, {} renames, {} window(s), {} record(s) changed",
            report.tenant,
            report.profiles,
            report.renames.total(),
            report.windows,
            report.changed
        );
    }
    if !failures.is_empty() {
        println!("\nFailed:");
        for (tenant, reason) in failures {
            println!("  {tenant}: {reason}");
        }
    }
    println!(
        "\nMigrated: {} tenant(s), {} failed",
        reports.len(),
        failures.len()
    );
}
