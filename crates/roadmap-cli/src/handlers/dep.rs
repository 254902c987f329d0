use crate::cli::{DepAction, EdgeArgs, NodeArgs};
use crate::context::CliContext;
use crate::output;

pub async fn handle(ctx: &CliContext, action: DepAction) -> anyhow::Result<()> {
    match action {
        DepAction::Add(args) => handle_add(ctx, args).await,
        DepAction::Remove(args) => {
            let kind = ctx.resolve_kind(args.kind)?;
            ctx.graph
                .remove_dependency(args.project, kind, args.from, args.to)
                .await?;
            output::output_success(serde_json::json!({
                "removed": { "from": args.from, "to": args.to },
            }))
        }
        DepAction::List(args) => handle_neighbours(ctx, args, false).await,
        DepAction::Dependents(args) => handle_neighbours(ctx, args, true).await,
    }
}

async fn handle_add(ctx: &CliContext, args: EdgeArgs) -> anyhow::Result<()> {
    let kind = ctx.resolve_kind(args.kind)?;
    ctx.require_item(args.project, kind, args.from).await?;
    ctx.require_item(args.project, kind, args.to).await?;

    ctx.graph
        .add_dependency(args.project, kind, args.from, args.to)
        .await?;
    output::output_success(serde_json::json!({
        "from": args.from,
        "to": args.to,
        "kind": kind,
    }))
}

async fn handle_neighbours(
    ctx: &CliContext,
    args: NodeArgs,
    dependents: bool,
) -> anyhow::Result<()> {
    let kind = ctx.resolve_kind(args.kind)?;
    let ids = if dependents {
        ctx.graph
            .list_dependents(args.project, kind, args.node)
            .await?
    } else {
        ctx.graph
            .list_dependencies(args.project, kind, args.node)
            .await?
    };
    output::output_list(ids.into_iter().collect())
}
