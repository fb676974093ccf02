//! Reprofile: legacy profile migration for a multi-tenant content network
//!
//! Main binary with subcommands:
//! - `run`: Migrate every tenant (rename pass, then windowed conversion)
//! - `rename`: Apply the one-shot rename pass to a single tenant
//! - `convert`: Convert one window for a single tenant, or follow to completion
//! - `count`: Report profile counts
//! - `tenants`: List tenant databases

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};
use reprofile_engine::{EngineError, Migrator};
use reprofile_store::{TenantId, TenantRegistry};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod driver;
mod orchestrator;

#[derive(Parser)]
#[command(name = "reprofile")]
#[command(about = "Legacy profile migration for a multi-tenant content network", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Migrate every tenant: rename pass, then windowed conversion
    Run {
        /// Directory holding the tenant databases
        #[arg(long, env = "REPROFILE_DATA_DIR")]
        data_dir: PathBuf,

        /// Records per conversion window
        #[arg(long, env = "REPROFILE_PAGE_SIZE", default_value = "50")]
        page_size: u64,
    },

    /// Apply the one-shot rename pass to a single tenant
    Rename {
        /// Directory holding the tenant databases
        #[arg(long, env = "REPROFILE_DATA_DIR")]
        data_dir: PathBuf,

        /// Tenant to rename
        #[arg(long)]
        tenant: String,
    },

    /// Convert one window for a single tenant
    Convert {
        /// Directory holding the tenant databases
        #[arg(long, env = "REPROFILE_DATA_DIR")]
        data_dir: PathBuf,

        /// Tenant to convert
        #[arg(long)]
        tenant: String,

        /// Window offset to start at
        #[arg(long, default_value = "0")]
        offset: u64,

        /// Records per conversion window
        #[arg(long, env = "REPROFILE_PAGE_SIZE", default_value = "50")]
        page_size: u64,

        /// Chain windows until the count comparison reports completion
        #[arg(long)]
        follow: bool,
    },

    /// Report profile counts for one tenant, or every tenant
    Count {
        /// Directory holding the tenant databases
        #[arg(long, env = "REPROFILE_DATA_DIR")]
        data_dir: PathBuf,

        /// Tenant to count (all tenants when omitted)
        #[arg(long)]
        tenant: Option<String>,
    },

    /// List tenant databases
    Tenants {
        /// Directory holding the tenant databases
        #[arg(long, env = "REPROFILE_DATA_DIR")]
        data_dir: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "reprofile=info".to_string()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            data_dir,
            page_size,
        } => orchestrator::run(&data_dir, page_size).await,

        Commands::Rename { data_dir, tenant } => run_rename_command(&data_dir, &tenant),

        Commands::Convert {
            data_dir,
            tenant,
            offset,
            page_size,
            follow,
        } => run_convert_command(&data_dir, &tenant, offset, page_size, follow),

        Commands::Count { data_dir, tenant } => run_count_command(&data_dir, tenant.as_deref()),

        Commands::Tenants { data_dir } => run_tenants_command(&data_dir),
    }
}

fn run_rename_command(data_dir: &Path, tenant: &str) -> Result<()> {
    let registry = TenantRegistry::new(data_dir);
    let migrator = Migrator::default();
    let tenant = TenantId::from(tenant);

    let report = registry
        .with_tenant::<_, EngineError, _>(&tenant, |store| migrator.quick_convert(store))
        .into_diagnostic()?;

    println!("\n=== Rename pass: {tenant} ===");
    println!("Record types renamed: {}", report.record_types);
    println!("Guids rewritten:      {}", report.guids);
    println!("Taxonomies renamed:   {}", report.taxonomies);
    println!("Shortcodes rewritten: {}", report.shortcodes);
    println!("\nApplied: {} row(s) updated", report.total());
    Ok(())
}

fn run_convert_command(
    data_dir: &Path,
    tenant: &str,
    offset: u64,
    page_size: u64,
    follow: bool,
) -> Result<()> {
    let registry = TenantRegistry::new(data_dir);
    let migrator = Migrator::new(page_size);
    let tenant = TenantId::from(tenant);
    let store = registry.open(&tenant).into_diagnostic()?;

    println!("\n=== Convert: {tenant} ===");

    if follow {
        let mut convert = driver::ConvertLoop::starting_at(offset);
        while let Some(offset) = convert.next_request() {
            let report = migrator.ranged_convert(&store, offset).into_diagnostic()?;
            println!(
                "Window at {}: {} processed, {} changed ({} total)",
                report.offset, report.processed, report.changed, report.total
            );
            convert.on_response(&report);
        }
        println!(
            "\nApplied: {} record(s) changed across {} window(s)",
            convert.changed(),
            convert.windows()
        );
    } else {
        let report = migrator.ranged_convert(&store, offset).into_diagnostic()?;
        println!(
            "Window at {}: {} processed, {} changed ({} total)",
            report.offset, report.processed, report.changed, report.total
        );
        match report.next_offset {
            Some(next) => println!("\nIncomplete. Next offset: {next}"),
            None => println!("\nConversion complete."),
        }
    }
    Ok(())
}

fn run_count_command(data_dir: &Path, tenant: Option<&str>) -> Result<()> {
    let registry = TenantRegistry::new(data_dir);
    let migrator = Migrator::default();

    let tenants = match tenant {
        Some(t) => vec![TenantId::from(t)],
        None => registry.list_tenants().into_diagnostic()?,
    };

    if tenants.is_empty() {
        println!("No tenant databases found in {}", data_dir.display());
        return Ok(());
    }

    println!("\n=== Profile counts ===");
    let mut total = 0;
    for tenant in &tenants {
        let profiles = registry
            .with_tenant::<_, EngineError, _>(tenant, |store| migrator.count_profiles(store))
            .into_diagnostic()?;
        println!("  {tenant}: {profiles} profile(s)");
        total += profiles;
    }
    println!("\nTotal: {total} profile(s) across {} tenant(s)", tenants.len());
    Ok(())
}

fn run_tenants_command(data_dir: &Path) -> Result<()> {
    let registry = TenantRegistry::new(data_dir);
    let tenants = registry.list_tenants().into_diagnostic()?;

    if tenants.is_empty() {
        println!("No tenant databases found in {}", data_dir.display());
        return Ok(());
    }

    for tenant in &tenants {
        println!("{tenant}");
    }
    Ok(())
}
