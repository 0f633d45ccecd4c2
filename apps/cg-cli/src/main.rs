use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use cg_graph::{
    BranchFilterDecorator, CommitFilterDecorator, GraphAppendBuilder, GraphBuilder,
    GraphBuilderConfig, LinearCollapseDecorator, MutableGraph, NodeKind, check_structure,
};

mod log_file;

use log_file::{CliError, CliResult, LogFile};

#[derive(Parser)]
#[command(name = "cg-cli")]
#[command(about = "Commit graph CLI - lay out VCS log history into rows and lanes", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Lay out a commit log and print its rows
    Show {
        /// Path to the log file (YAML, or JSON with a .json extension)
        log_path: PathBuf,
        #[command(flatten)]
        load: LoadArgs,
        /// Collapse linear runs of commits
        #[arg(long)]
        collapse_linear: bool,
        /// Only show history reachable from this ref (repeatable)
        #[arg(long = "branch")]
        branches: Vec<String>,
        /// Only show commits whose hash contains this text
        #[arg(long)]
        grep: Option<String>,
    },
    /// Lay out a commit log and verify the graph's structural invariants
    Check {
        /// Path to the log file (YAML, or JSON with a .json extension)
        log_path: PathBuf,
        #[command(flatten)]
        load: LoadArgs,
    },
}

#[derive(clap::Args)]
struct LoadArgs {
    /// Feed the log in pages of this many commits instead of one batch
    #[arg(long)]
    page_size: Option<usize>,
    /// Repository root recorded for lanes whose head has no ref
    #[arg(long)]
    fallback_root: Option<PathBuf>,
}

fn main() -> CliResult<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Show {
            log_path,
            load,
            collapse_linear,
            branches,
            grep,
        } => cmd_show(&log_path, &load, collapse_linear, &branches, grep.as_deref()),
        Commands::Check { log_path, load } => cmd_check(&log_path, &load),
    }
}

fn load_graph(log_path: &Path, args: &LoadArgs) -> CliResult<MutableGraph> {
    let LogFile { refs, commits } = log_file::load(log_path)?;

    let mut config = GraphBuilderConfig::default();
    if let Some(root) = &args.fallback_root {
        config.fallback_root = root.clone();
    }
    let builder = GraphBuilder::with_config(config);

    // An empty log goes through the builder so it reports the empty batch.
    let Some(page_size) = args.page_size.filter(|_| !commits.is_empty()) else {
        return Ok(builder.build(&commits, refs)?);
    };
    if page_size == 0 {
        return Err(CliError::Args {
            what: "--page-size must be at least 1".to_string(),
        });
    }

    let appender = GraphAppendBuilder::with_builder(builder);
    let mut graph = MutableGraph::new();
    let mut refs = Some(refs);
    for page in commits.chunks(page_size) {
        appender.append_to_graph(&mut graph, page, refs.take().unwrap_or_default())?;
        tracing::debug!(rows = graph.all_rows().len(), "page appended");
    }
    Ok(graph)
}

fn cmd_show(
    log_path: &Path,
    load: &LoadArgs,
    collapse_linear: bool,
    branches: &[String],
    grep: Option<&str>,
) -> CliResult<()> {
    let mut graph = load_graph(log_path, load)?;

    let views = usize::from(collapse_linear)
        + usize::from(!branches.is_empty())
        + usize::from(grep.is_some());
    if views > 1 {
        return Err(CliError::Args {
            what: "--collapse-linear, --branch and --grep are mutually exclusive".to_string(),
        });
    }
    if collapse_linear {
        graph.set_graph_decorator(Box::new(LinearCollapseDecorator));
    } else if !branches.is_empty() {
        let filter =
            BranchFilterDecorator::from_ref_names(&graph, branches.iter().map(String::as_str));
        graph.set_graph_decorator(Box::new(filter));
    } else if let Some(text) = grep {
        let filter = CommitFilterDecorator::matching(&graph, |hash| hash.as_str().contains(text));
        graph.set_graph_decorator(Box::new(filter));
    }

    println!(
        "{} rows ({} commits visible, {} structural rows)",
        graph.row_count(),
        graph.visible_commit_count(),
        graph.all_rows().len()
    );
    for row in graph.node_rows() {
        let lanes: String = row
            .nodes()
            .map(|node| match node.kind() {
                NodeKind::Commit => '*',
                NodeKind::Edge => '|',
                NodeKind::EndCommit => '~',
            })
            .collect();
        // Visible rows always show a commit or a placeholder.
        let Some(commit) = row.commit_node() else {
            continue;
        };
        let refs: Vec<&str> = graph
            .refs()
            .refs_of(commit.commit())
            .iter()
            .map(|r| r.name.as_str())
            .collect();
        let suffix = if refs.is_empty() {
            String::new()
        } else {
            format!(" ({})", refs.join(", "))
        };
        println!(
            "{:>5}  {:<8}  {}{}",
            row.index(),
            lanes,
            commit.commit().short(10),
            suffix
        );
    }
    Ok(())
}

fn cmd_check(log_path: &Path, load: &LoadArgs) -> CliResult<()> {
    println!("Checking commit graph: {}", log_path.display());
    let graph = load_graph(log_path, load)?;
    check_structure(&graph)?;
    println!(
        "✓ Graph is consistent ({} commits, {} nodes, {} edges, {} lanes)",
        graph.all_commits().len(),
        graph.nodes().len(),
        graph.edges().len(),
        graph.branches().len()
    );
    Ok(())
}
