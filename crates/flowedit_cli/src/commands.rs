// SPDX-License-Identifier: MIT OR Apache-2.0
//! Command implementations.

use flowedit_graph::catalog::CatalogError;
use flowedit_graph::document::DocumentError;
use flowedit_graph::fanout::FanoutError;
use flowedit_graph::minimap::{self, MinimapConfig, Viewport};
use flowedit_graph::session::SessionError;
use flowedit_graph::{
    default_catalog, ConnectionError, FlowDocument, FlowSession, Graph, GraphError, HandleId,
    HandlePosition, ModuleCatalog, NodeId, NodeVariant,
};
use std::path::Path;

/// Error surfaced by a command
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Catalog could not be loaded
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Document could not be read, written or validated
    #[error("Document error: {0}")]
    Document(#[from] DocumentError),

    /// Session rejected a change
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Graph rejected a change
    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    /// Output count change rejected
    #[error("Fan-out error: {0}")]
    Fanout(#[from] FanoutError),

    /// Connection rejected
    #[error("Connection error: {0}")]
    Connection(#[from] ConnectionError),

    /// A demo wire could not start from its node
    #[error("Node {0} cannot start a connection")]
    DragRefused(NodeId),

    /// Output file could not be written
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON output failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Nothing to project
    #[error("Flow has no nodes")]
    EmptyFlow,
}

/// Output format for documents
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Format {
    /// Pretty JSON
    Json,
    /// Pretty RON
    Ron,
}

impl Format {
    /// Format implied by a file extension, JSON unless it is `.ron`
    pub fn from_path(path: &Path) -> Self {
        match path.extension() {
            Some(ext) if ext.eq_ignore_ascii_case("ron") => Self::Ron,
            _ => Self::Json,
        }
    }
}

/// Load the catalog file, or fall back to the built-in catalog
pub fn load_catalog(path: Option<&Path>) -> Result<ModuleCatalog, CliError> {
    match path {
        Some(path) => Ok(ModuleCatalog::load(path)?),
        None => Ok(default_catalog()),
    }
}

fn load_graph(file: &Path) -> Result<Graph, CliError> {
    let document = FlowDocument::load(file)?;
    Ok(Graph::from_document(document)?)
}

/// Verify a document and print a summary
pub fn check(file: &Path) -> Result<(), CliError> {
    let graph = load_graph(file)?;

    println!("Flow: {}", graph.name);
    for variant in NodeVariant::ALL {
        let count = graph.nodes().filter(|n| n.variant() == variant).count();
        println!("  {variant:<18} {count}");
    }
    println!("  {:<18} {}", "edges", graph.edge_count());

    for node in graph.nodes().filter(|n| n.is_branching()) {
        let bounds = node.branching_config().map(|c| c.output_count);
        println!(
            "  {} \"{}\": {} output(s), bounds {:?}",
            node.id,
            node.label,
            node.output_count().unwrap_or(0),
            bounds
        );
    }

    let open: Vec<&str> = graph
        .nodes()
        .filter(|n| n.capabilities().has_source_handles && graph.outgoing_edge(n.id).is_none())
        .map(|n| n.label.as_str())
        .collect();
    if !open.is_empty() {
        println!("  unconnected outputs: {}", open.join(", "));
    }
    println!("OK");
    Ok(())
}

/// Print the catalog
pub fn list_catalog(catalog: &ModuleCatalog) {
    for module in catalog.modules() {
        match module.output_count {
            Some(bounds) => println!(
                "{:<12} {:<12} {:<10} outputs {}..{} ({:?})",
                module.id,
                module.name,
                module.variant,
                bounds.min,
                bounds.max.map_or_else(String::new, |max| max.to_string()),
                module.child_deletion
            ),
            None => println!("{:<12} {:<12} {}", module.id, module.name, module.variant),
        }
    }
}

/// Print the minimap projection of a document
pub fn minimap(file: &Path, viewport: &Viewport, config: &MinimapConfig) -> Result<(), CliError> {
    let graph = load_graph(file)?;
    let projection = minimap::project(&graph, viewport, config).ok_or(CliError::EmptyFlow)?;
    println!("{}", serde_json::to_string_pretty(&projection)?);
    Ok(())
}

/// Build a demo flow by driving a session the way the editor does
///
/// An explicit `format` wins over the extension of `output`.
pub fn demo(
    catalog: ModuleCatalog,
    format: Option<Format>,
    output: Option<&Path>,
) -> Result<(), CliError> {
    let mut session = FlowSession::new(catalog);
    session.subscribe(|event| tracing::debug!("{event:?}"));

    let source = session.add_module_node("source", [0.0, 0.0])?;
    let transform = session.add_module_node("transform", [250.0, 0.0])?;
    let router = session.add_module_node("router", [500.0, 0.0])?;
    session.set_output_count(router, 3)?;
    let outputs: Vec<NodeId> = session
        .graph()
        .children_of(router)
        .iter()
        .map(|n| n.id)
        .collect();

    let mut sinks = Vec::new();
    for i in 0..outputs.len() {
        let sink = session.add_module_node("sink", [1000.0, i as f32 * 120.0])?;
        session.rename_node(sink, format!("Sink {}", i + 1))?;
        sinks.push(sink);
    }

    let mut wires = vec![(source, transform), (transform, router)];
    wires.extend(outputs.iter().copied().zip(sinks.iter().copied()));
    for (from, to) in wires {
        if !session.begin_drag(from, HandleId::source(HandlePosition::Right)) {
            return Err(CliError::DragRefused(from));
        }
        session.drop_on(Some(to), Some(HandleId::target(HandlePosition::Left)))?;
    }

    let document = session.export();
    tracing::info!(
        "Demo flow: {} node(s), {} edge(s)",
        document.nodes.len(),
        document.edges.len()
    );

    let format = format
        .or_else(|| output.map(Format::from_path))
        .unwrap_or(Format::Json);
    let content = match format {
        Format::Json => document.to_json()?,
        Format::Ron => document.to_ron()?,
    };
    match output {
        Some(path) => std::fs::write(path, content)?,
        None => println!("{content}"),
    }
    Ok(())
}
