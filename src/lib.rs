// src/lib.rs

pub mod cli;
pub mod clock;
pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod monitor;
pub mod parser;
pub mod store;
pub mod types;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Result, bail};
use tracing::{debug, info, warn};

use crate::cli::CliArgs;
use crate::config::{ConfigFile, load_or_default};
use crate::engine::Runtime;
use crate::store::{Expression, ExpressionStatus, SchedulerStore};
use crate::types::ExpressionId;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - scheduler store
/// - lease monitor and worker pool
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let mut cfg = load_or_default(args.config.as_deref().map(Path::new))?;

    if let Some(workers) = args.workers {
        if workers == 0 {
            bail!("--workers must be >= 1");
        }
        cfg.worker.computing_power = workers;
    }

    if args.dry_run {
        return print_dry_run(&cfg, &args.expressions);
    }

    let store = Arc::new(SchedulerStore::new(&cfg));
    let runtime = Runtime::start(&cfg, Arc::clone(&store));

    // Syntax errors are reported per expression; the rest still run.
    let mut ids: Vec<ExpressionId> = Vec::new();
    let mut rejected = 0usize;
    for raw in &args.expressions {
        match store.submit(raw) {
            Ok(id) => ids.push(id),
            Err(err) => {
                println!("-\t{raw}\t{err}");
                rejected += 1;
            }
        }
    }

    let wait = tokio::time::timeout(
        Duration::from_secs(args.timeout_secs),
        runtime.wait_for(&ids),
    );
    let settled = tokio::select! {
        res = wait => res.ok(),
        _ = tokio::signal::ctrl_c() => {
            warn!("interrupted; reporting current state");
            None
        }
    };

    let expressions = match settled {
        Some(expressions) => expressions,
        None => {
            warn!(timeout_secs = args.timeout_secs, "not all expressions settled");
            ids.iter()
                .filter_map(|id| store.get_expression(*id).ok())
                .collect()
        }
    };

    let unresolved = print_results(&expressions);
    let stats = runtime.shutdown().await?;
    info!(?stats, "workers finished");

    let failed = unresolved + rejected;
    if failed > 0 {
        bail!(
            "{failed} of {} expressions did not produce a result",
            args.expressions.len()
        );
    }
    Ok(())
}

/// Print one line per expression; returns how many have no result.
fn print_results(expressions: &[Expression]) -> usize {
    let mut unresolved = 0;
    for expr in expressions {
        match (expr.status, expr.result, expr.error_detail) {
            (ExpressionStatus::Done, Some(value), _) => {
                println!("{}\t{}\t= {}", expr.id, expr.raw, value);
            }
            (ExpressionStatus::Error, _, Some(reason)) => {
                println!("{}\t{}\t{}", expr.id, expr.raw, reason);
                unresolved += 1;
            }
            (status, _, _) => {
                println!("{}\t{}\tstill {}", expr.id, expr.raw, status);
                unresolved += 1;
            }
        }
    }
    unresolved
}

/// Dry-run output: configuration, then each expression's AST and tasks.
fn print_dry_run(cfg: &ConfigFile, expressions: &[String]) -> Result<()> {
    println!("calcdag dry-run");
    println!(
        "  timing: add={}ms subtract={}ms multiply={}ms divide={}ms",
        cfg.timing.addition_ms,
        cfg.timing.subtraction_ms,
        cfg.timing.multiplication_ms,
        cfg.timing.division_ms
    );
    println!(
        "  scheduler: max_retries={} lease_check_interval_ms={} lease_grace_ms={}",
        cfg.scheduler.max_retries,
        cfg.scheduler.lease_check_interval_ms,
        cfg.scheduler.lease_grace_ms
    );
    println!(
        "  worker: computing_power={} poll_interval_ms={}",
        cfg.worker.computing_power, cfg.worker.poll_interval_ms
    );

    let mut invalid = 0usize;
    for (n, raw) in expressions.iter().enumerate() {
        println!();
        println!("{raw}");

        let ast = match parser::parse(raw) {
            Ok(ast) => ast,
            Err(err) => {
                println!("  syntax error: {err}");
                invalid += 1;
                continue;
            }
        };
        println!("  ast: {ast}");

        let graph = dag::build(ExpressionId(n as u64 + 1), &ast, &cfg.timing);
        if let Some(value) = graph.literal() {
            println!("  literal {value}; no tasks");
            continue;
        }

        println!(
            "  tasks ({}), critical path {}ms:",
            graph.len(),
            graph.critical_path().as_millis()
        );
        for task in graph.tasks() {
            let consumer = task
                .parent
                .map(|p| format!(" -> {p}"))
                .unwrap_or_else(|| " (root)".to_string());
            println!(
                "    - {} {} {} {} [{}]{}",
                task.id, task.operation, task.left, task.right, task.status, consumer
            );
        }
    }

    debug!("dry-run complete (nothing scheduled)");

    if invalid > 0 {
        bail!("{invalid} of {} expressions failed to parse", expressions.len());
    }
    Ok(())
}
