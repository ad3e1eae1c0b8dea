use clap::{Parser, Subcommand, ValueEnum};
use convoflow::prelude::*;
use itertools::Itertools;
use serde_json::Value;
use std::fs;
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(
    name = "convoflow-cli",
    about = "Inspect, validate and convert persisted conversation-flow documents"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print a summary of a workflow document: nodes, edges, variables.
    Inspect { file: PathBuf },
    /// Check every edge of a workflow document against the connection rules.
    Validate { file: PathBuf },
    /// Convert a workflow document between the full and minimal encodings.
    Convert {
        file: PathBuf,
        /// Target encoding.
        #[arg(long, value_enum)]
        to: Target,
        /// Output path; stdout when omitted.
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Target {
    Full,
    Minimal,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Command::Inspect { file } => inspect(&file),
        Command::Validate { file } => validate(&file),
        Command::Convert { file, to, out } => convert(&file, to, out.as_deref()),
    };

    if let Err(message) = result {
        eprintln!("error: {message}");
        process::exit(1);
    }
}

fn load_graph(
    file: &PathBuf,
) -> std::result::Result<(Vec<Node>, Vec<Edge>, WorkflowFormat), String> {
    let text = fs::read_to_string(file)
        .map_err(|err| format!("could not read '{}': {err}", file.display()))?;
    let document: Value = serde_json::from_str(&text)
        .map_err(|err| format!("could not parse '{}': {err}", file.display()))?;
    let format = detect_format(&document);
    let (nodes, edges) = decode_workflow(&document).map_err(|err| err.to_string())?;
    Ok((nodes, edges, format))
}

fn inspect(file: &PathBuf) -> std::result::Result<(), String> {
    let (nodes, edges, format) = load_graph(file)?;

    let encoding = match format {
        WorkflowFormat::Full => "full",
        WorkflowFormat::Minimal => "minimal",
    };
    println!("Encoding: {encoding}");
    println!("Nodes:    {}", nodes.len());
    println!("Edges:    {}", edges.len());

    let entry = nodes
        .iter()
        .find(|node| node.data.initial_message() || node.kind() == NodeKind::Trigger);
    match entry {
        Some(node) => println!("Entry:    {} ({})", node.id, node.kind()),
        None => println!("Entry:    none"),
    }

    let variables = collect_variables(&nodes);
    if !variables.is_empty() {
        println!("Variables: {}", variables.iter().join(", "));
    }

    println!();
    for node in &nodes {
        let name = if node.name().is_empty() {
            "(unnamed)"
        } else {
            node.name()
        };
        println!("  {:<24} {:<16} {}", node.id, node.kind().to_string(), name);
    }
    Ok(())
}

fn validate(file: &PathBuf) -> std::result::Result<(), String> {
    let (nodes, edges, _) = load_graph(file)?;

    let mut problems = Vec::new();
    for edge in &edges {
        let source = nodes.iter().find(|node| node.id == edge.source);
        let target = nodes.iter().find(|node| node.id == edge.target);
        match (source, target) {
            (Some(source), Some(target)) => {
                if let Err(rejection) = validate_connection(source, target) {
                    problems.push(format!("{}: {rejection}", edge.id));
                }
            }
            _ => problems.push(format!("{}: references a missing node", edge.id)),
        }
    }

    let entries = nodes
        .iter()
        .filter(|node| node.data.initial_message())
        .count();
    if entries > 1 {
        problems.push(format!("{entries} nodes claim the initial message"));
    }

    if problems.is_empty() {
        println!("OK: {} nodes, {} edges", nodes.len(), edges.len());
        Ok(())
    } else {
        for problem in &problems {
            eprintln!("  {problem}");
        }
        Err(format!("{} problem(s) found", problems.len()))
    }
}

fn convert(
    file: &PathBuf,
    to: Target,
    out: Option<&std::path::Path>,
) -> std::result::Result<(), String> {
    let (nodes, edges, _) = load_graph(file)?;

    let document = match to {
        Target::Full => encode_full(&nodes, &edges),
        Target::Minimal => encode_minimal(&nodes, &edges),
    }
    .map_err(|err| err.to_string())?;

    let text = serde_json::to_string_pretty(&document).map_err(|err| err.to_string())?;
    match out {
        Some(path) => fs::write(path, text)
            .map_err(|err| format!("could not write '{}': {err}", path.display()))?,
        None => println!("{text}"),
    }
    Ok(())
}
