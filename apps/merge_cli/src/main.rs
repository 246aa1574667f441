use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::Parser;
use shared::domain::{RecordStats, SlotId};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use workflow_core::{
    transport::endpoint_url, CategoryPublisher, HttpCategoryPublisher, HttpMergeService,
    MergeService, MissingCategoryPublisher, MissingMergeService, WorkflowController,
    WorkflowError, WorkflowState,
};

mod config;

use config::{load_settings, Settings};

/// Merge two university platform exports into one student category.
#[derive(Parser, Debug)]
struct Args {
    #[arg(long)]
    category: String,
    /// Export from platform A.
    #[arg(long)]
    file_a: PathBuf,
    /// Export from platform B.
    #[arg(long)]
    file_b: PathBuf,
    #[arg(long)]
    config: Option<PathBuf>,
    /// Write the merged records as CSV.
    #[arg(long)]
    export: bool,
    #[arg(long)]
    export_dir: Option<PathBuf>,
    /// Create the category in the mail/calendar system after merging.
    #[arg(long)]
    publish: bool,
}

fn build_collaborators(
    settings: &Settings,
) -> Result<(Arc<dyn MergeService>, Arc<dyn CategoryPublisher>)> {
    let merge_service: Arc<dyn MergeService> = if settings.merge_path.trim().is_empty() {
        warn!("merge_path is empty; merging is disabled");
        Arc::new(MissingMergeService)
    } else {
        Arc::new(HttpMergeService::new(
            endpoint_url(&settings.service_url, &settings.merge_path)?,
            settings.api_token.clone(),
        ))
    };

    let publisher: Arc<dyn CategoryPublisher> = if settings.publish_path.trim().is_empty() {
        Arc::new(MissingCategoryPublisher)
    } else {
        Arc::new(HttpCategoryPublisher::new(
            endpoint_url(&settings.service_url, &settings.publish_path)?,
            settings.api_token.clone(),
        ))
    };

    Ok((merge_service, publisher))
}

async fn print_progress(controller: &WorkflowController) {
    let state = controller.snapshot().await;
    println!(
        "[{:>3}%] {}",
        state.progress_percent(),
        state.step().label()
    );
}

fn print_preview(state: &WorkflowState) {
    let Some(records) = state.records() else {
        return;
    };
    if records.is_empty() {
        println!("No hay datos para mostrar");
        return;
    }

    println!(
        "{} estudiantes unificados de ambas plataformas",
        records.len()
    );
    for record in records {
        println!(
            "  {:<32} {:<36} {:<10} {:<10} {}",
            record.full_name,
            record.email,
            record.platform_status(SlotId::A),
            record.platform_status(SlotId::B),
            record.status
        );
    }
    let stats = RecordStats::from_records(records);
    println!(
        "Total: {} • Unificados: {} • Pendientes: {} • Conflictos: {}",
        stats.total, stats.unified, stats.pending, stats.conflict
    );
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let args = Args::parse();

    let settings = load_settings(args.config.as_deref())?;
    info!(service_url = %settings.service_url, "loaded settings");
    let (merge_service, publisher) = build_collaborators(&settings)?;
    let controller = WorkflowController::new(merge_service, publisher);

    controller.set_category_name(&args.category).await?;
    controller.advance_to_upload().await?;
    print_progress(&controller).await;

    for (slot, path) in [(SlotId::A, &args.file_a), (SlotId::B, &args.file_b)] {
        let upload = controller.select_path(slot, path).await?;
        println!(
            "{}: {} ({} • {} registros detectados)",
            slot.platform_label(),
            upload.name,
            upload.size_label,
            upload.estimated_records
        );
    }

    let state = controller.snapshot().await;
    println!(
        "Categoría \"{}\" • {} registros en total",
        state.category_name(),
        state.estimated_total_records()
    );

    controller.invoke_merge().await?;
    print_progress(&controller).await;
    print_preview(&controller.snapshot().await);

    if args.export {
        match controller.export_csv().await {
            Ok(export) => {
                let dir = args.export_dir.unwrap_or(settings.export_dir);
                tokio::fs::create_dir_all(&dir)
                    .await
                    .with_context(|| format!("failed to create export dir '{}'", dir.display()))?;
                let path = dir.join(&export.filename);
                tokio::fs::write(&path, export.content)
                    .await
                    .with_context(|| format!("failed to write '{}'", path.display()))?;
                println!("CSV exportado: {} ({} registros)", path.display(), export.rows);
            }
            Err(WorkflowError::NoRecords) => println!("Nada que exportar"),
            Err(err) => return Err(err.into()),
        }
    }

    if args.publish {
        let receipt = controller.publish_category().await?;
        println!("{}", receipt.message);
        print_progress(&controller).await;
    }

    Ok(())
}
