use std::io::{self, IsTerminal};
use std::path::PathBuf;

use anyhow::{Context, Result};
use tnm_core::download::{plan_datasets, plan_products};
use tnm_core::{
    CatalogClient, CatalogQuery, CatalogResult, DatasetGroup, DownloadEngine, DownloadTask,
    HttpClient, ProductDescriptor, RetryPolicy, SelectAll, SelectError, Selector, TerminalSelector,
    group_by_dataset, pick,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::ProcessExit;
use crate::app::{config_runtime, exit_handler, output, progress, terminal};
use crate::app_config;

pub(crate) async fn run_tnm_download() -> Result<ProcessExit> {
    let (cli, cli_sources) = match config_runtime::parse_cli_with_sources() {
        Ok(parsed) => parsed,
        Err(err) => {
            // --help / --version print to stdout and succeed; usage errors fail.
            let exit = if err.use_stderr() {
                ProcessExit::Failure
            } else {
                ProcessExit::Success
            };
            let _ = err.print();
            return Ok(exit);
        }
    };

    let loaded_config = app_config::load_default_file_config()?;
    let file_config = loaded_config.config.as_ref();
    let args = config_runtime::apply_config_defaults(cli, &cli_sources, file_config);

    let default_level = config_runtime::resolve_default_log_level(&args);
    let force_cli_log_level = config_runtime::should_force_cli_log_level(&cli_sources);
    let no_color = terminal::is_no_color_requested(&args);
    terminal::init_tracing(default_level, force_cli_log_level, no_color);

    debug!(?args, config_path = ?loaded_config.path, "CLI arguments parsed");
    info!("tnm-download starting");

    let show_progress = terminal::should_show_progress(
        io::stderr().is_terminal(),
        args.quiet,
        terminal::is_dumb_terminal(),
    );

    tokio::fs::create_dir_all(&args.output_dir)
        .await
        .with_context(|| {
            format!(
                "Failed to create output directory '{}'",
                args.output_dir.display()
            )
        })?;

    let catalog_settings = config_runtime::resolve_catalog_settings(&args, file_config);
    let catalog = CatalogClient::with_settings(catalog_settings)?;
    let query = CatalogQuery {
        datasets: args.datasets.clone(),
        formats: args.formats.clone(),
        ..CatalogQuery::new(args.extent)
    };

    let spinner = progress::query_spinner(show_progress);
    let result = catalog.search(&query).await;
    spinner.finish_and_clear();
    let result = result.context("Failed to query The National Map")?;

    output::print_api_notes(&result);
    if result.is_empty() {
        println!("{}", output::NO_PRODUCTS_MESSAGE);
        return Ok(ProcessExit::Success);
    }
    if !args.quiet {
        println!("{}", output::found_line(&result));
    }

    let tasks = select_tasks(result, args.all, args.by_dataset, args.output_dir.clone()).await?;
    if tasks.is_empty() {
        println!("{}", output::NOTHING_SELECTED_MESSAGE);
        return Ok(ProcessExit::Success);
    }
    info!(tasks = tasks.len(), "selection complete");

    let timeouts = config_runtime::resolve_http_timeouts(&args, file_config);
    let http = HttpClient::with_timeouts(timeouts.download_connect_secs, timeouts.download_read_secs)
        .context("Failed to build HTTP client")?;
    let engine = DownloadEngine::new(
        usize::from(args.threads),
        RetryPolicy::with_max_retries(u32::from(args.retries)),
    )?;

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    let signal_task = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, abandoning downloads in flight");
            interrupt.cancel();
        }
    });

    let bar = progress::download_bar(show_progress, tasks.len());
    let report = engine.run(tasks, &http, &bar, &cancel).await?;
    bar.finish_and_clear();
    signal_task.abort();

    output::print_summary(&report, &args.output_dir);
    if report.interrupted() {
        warn!(
            completed = report.completed(),
            abandoned = report.abandoned(),
            "Interrupted. Partial .part files may remain."
        );
    }

    Ok(exit_handler::determine_exit_outcome(&report))
}

/// Runs the selector off the async runtime (it blocks on key input) and plans
/// the chosen products into download tasks.
async fn select_tasks(
    result: CatalogResult,
    all: bool,
    by_dataset: bool,
    output_dir: PathBuf,
) -> Result<Vec<DownloadTask>> {
    let tasks = tokio::task::spawn_blocking(move || -> Result<Vec<DownloadTask>, SelectError> {
        let mut selector: Box<dyn Selector + Send> = if all {
            Box::new(SelectAll)
        } else {
            Box::new(TerminalSelector::new())
        };

        if by_dataset {
            let groups = group_by_dataset(&result.products);
            let chosen = pick(
                selector.as_mut(),
                "Select datasets to download",
                groups,
                DatasetGroup::label,
            )?;
            Ok(plan_datasets(chosen, &output_dir))
        } else {
            let chosen = pick(
                selector.as_mut(),
                "Select products to download",
                result.products,
                ProductDescriptor::label,
            )?;
            Ok(plan_products(chosen, &output_dir))
        }
    })
    .await
    .context("Selection task failed")??;
    Ok(tasks)
}
