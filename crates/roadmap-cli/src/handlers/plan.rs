use crate::cli::GraphArgs;
use crate::context::CliContext;
use crate::output;

/// Phases, waves and per-item views for one project graph
pub async fn handle_phases(ctx: &CliContext, args: GraphArgs) -> anyhow::Result<()> {
    let kind = ctx.resolve_kind(args.kind)?;
    let items = ctx.items.list_items(args.project, Some(kind)).await?;
    let plan = ctx.graph.project_plan(args.project, kind, &items).await?;
    output::output_success(&plan)
}

pub async fn handle_audit(ctx: &CliContext, args: GraphArgs) -> anyhow::Result<()> {
    let kind = ctx.resolve_kind(args.kind)?;
    let cyclic = ctx.graph.audit_cycles(args.project, kind).await?;
    output::output_success(serde_json::json!({
        "projectId": args.project,
        "kind": kind,
        "count": cyclic.len(),
        "cyclicNodes": cyclic,
    }))
}
