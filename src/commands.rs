//! One-shot subcommand implementations (analyze, tree, check, config).

use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::debug;

use proctree_monitor::{
    CycleSummary, GraphNode, HierarchyView, Lifecycle, ProcessSource, PsSource,
};

use crate::cli::OutputFormat;
use crate::config::render_config;
use crate::state::SharedState;

/// Captures one snapshot and applies it to the monitor.
async fn capture_once(state: &SharedState) -> Result<CycleSummary> {
    let source = PsSource::new(state.config.capture_timeout());
    let snapshot = source
        .capture()
        .await
        .context("failed to capture process listing")?;
    Ok(state.monitor.apply_cycle(snapshot).await)
}

/// `analyze <pid>`: one capture, then a hierarchy query.
pub async fn command_analyze(state: &SharedState, pid: &str, format: &OutputFormat) -> Result<()> {
    capture_once(state).await?;

    let pid = pid.trim();
    let Some(view) = state.monitor.analyze(pid).await else {
        println!("pid {} is not tracked", pid);
        return Ok(());
    };

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&view)?),
        OutputFormat::Yaml => print!("{}", serde_yaml::to_string(&view)?),
        OutputFormat::Text => {
            let graph = state.monitor.graph().await;
            let node = graph.node(pid);
            print_view_text(&view, node);
        }
    }
    Ok(())
}

fn print_view_text(view: &HierarchyView, node: Option<&GraphNode>) {
    if let Some(node) = node {
        let r = &node.record;
        println!("PID: {}", r.pid);
        println!("PPID: {} | USER: {}", r.ppid, r.user);
        println!("CPU: {}% | MEM: {}%", r.cpu_percent, r.mem_percent);
        println!("ETIME: {} | STATE: {}", r.elapsed_time, r.state);
        println!("COMMAND: {}", r.command);
        if node.lifecycle == Lifecycle::Removed {
            println!("LIFECYCLE: removed (attributes frozen at last sighting)");
        }
        println!();
    }
    println!("HIERARCHY");
    println!(
        "  parent:      {}",
        view.parent.as_deref().unwrap_or("ROOT")
    );
    println!("  children:    {}", join_pids(&view.children));
    println!("  ancestors:   {}", join_pids(&view.ancestors));
    println!("  descendants: {}", join_pids(&view.descendants));
    println!("  depth:       {}", view.depth);
    println!("  context:     {} nodes", view.context_size);
}

fn join_pids(pids: &[String]) -> String {
    if pids.is_empty() {
        "-".to_string()
    } else {
        pids.join(" ")
    }
}

/// `tree`: one capture, then an indented pid tree.
pub async fn command_tree(state: &SharedState, max_depth: usize, from: Option<&str>) -> Result<()> {
    let summary = capture_once(state).await?;
    debug!("captured {} processes for tree", summary.total);

    let start = from.unwrap_or_else(|| state.monitor.root_pid()).trim();
    let graph = state.monitor.graph().await;
    if !graph.has_node(start) {
        println!("pid {} is not tracked", start);
        return Ok(());
    }

    print_subtree(&graph, start, 0, max_depth);
    Ok(())
}

fn print_subtree(graph: &proctree_monitor::ProcessGraph, pid: &str, depth: usize, max_depth: usize) {
    let command = graph
        .node(pid)
        .map(|n| n.record.command.as_str())
        .unwrap_or("?");
    println!("{}{} {}", "  ".repeat(depth), pid, command);
    if depth >= max_depth {
        return;
    }
    for child in graph.children(pid) {
        print_subtree(graph, child, depth + 1, max_depth);
    }
}

/// `check`: one capture, report source health.
pub async fn command_check(state: &SharedState) -> Result<()> {
    let started = std::time::Instant::now();
    let summary = capture_once(state).await?;
    let elapsed = started.elapsed();

    let graph = state.monitor.graph().await;
    println!("capture:  ok ({:.1} ms)", elapsed.as_secs_f64() * 1000.0);
    println!("records:  {}", summary.total);
    println!("edges:    {}", graph.edge_count());
    println!(
        "root:     {} ({})",
        state.monitor.root_pid(),
        if graph.has_node(state.monitor.root_pid()) {
            "present"
        } else {
            "absent, depth queries return 0"
        }
    );
    Ok(())
}

/// `config`: write or print a default configuration file.
pub fn command_config(output: Option<PathBuf>, format: &OutputFormat) -> Result<()> {
    let rendered = render_config(&crate::config::Config::default(), format)?;
    match output {
        Some(path) => {
            std::fs::write(&path, rendered)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("wrote default configuration to {}", path.display());
        }
        None => print!("{}", rendered),
    }
    Ok(())
}
