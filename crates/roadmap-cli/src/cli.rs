use clap::{Args, Parser, Subcommand};
use roadmap_domain::NodeKind;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "roadmap")]
#[command(about = "Dependency-ordered planning for epics and tasks", long_about = None)]
#[command(version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("GIT_COMMIT_HASH"), ")"))]
pub struct Cli {
    /// Path to roadmap data file (or set ROADMAP_FILE env var)
    #[arg(long, short, global = true, value_name = "FILE", env = "ROADMAP_FILE")]
    pub file: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Work item operations
    Item(ItemCommand),
    /// Dependency operations
    Dep(DepCommand),
    /// Compute phases and planning waves for a project graph
    Phases(GraphArgs),
    /// Report nodes sitting on a dependency cycle in stored data
    Audit(GraphArgs),
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Args)]
pub struct ItemCommand {
    #[command(subcommand)]
    pub action: ItemAction,
}

#[derive(Subcommand)]
pub enum ItemAction {
    /// Create an epic or task
    Create {
        #[arg(long)]
        project: Uuid,
        /// epic or task (defaults to the configured kind)
        #[arg(long)]
        kind: Option<NodeKind>,
        #[arg(long)]
        key: String,
        #[arg(long)]
        title: String,
    },
    /// List items of a project
    List {
        #[arg(long)]
        project: Uuid,
        #[arg(long)]
        kind: Option<NodeKind>,
    },
    /// Delete an item and every dependency touching it
    Delete {
        #[arg(long)]
        id: Uuid,
    },
}

#[derive(Args)]
pub struct DepCommand {
    #[command(subcommand)]
    pub action: DepAction,
}

#[derive(Subcommand)]
pub enum DepAction {
    /// Record that FROM depends on TO
    Add(EdgeArgs),
    /// Remove the dependency FROM -> TO
    Remove(EdgeArgs),
    /// Direct dependencies of a node
    List(NodeArgs),
    /// Direct dependents of a node
    Dependents(NodeArgs),
}

#[derive(Args)]
pub struct EdgeArgs {
    #[arg(long)]
    pub project: Uuid,
    #[arg(long)]
    pub kind: Option<NodeKind>,
    /// The dependent item
    #[arg(long)]
    pub from: Uuid,
    /// The item depended upon
    #[arg(long)]
    pub to: Uuid,
}

#[derive(Args)]
pub struct NodeArgs {
    #[arg(long)]
    pub project: Uuid,
    #[arg(long)]
    pub kind: Option<NodeKind>,
    #[arg(long)]
    pub node: Uuid,
}

#[derive(Args)]
pub struct GraphArgs {
    #[arg(long)]
    pub project: Uuid,
    #[arg(long)]
    pub kind: Option<NodeKind>,
}
