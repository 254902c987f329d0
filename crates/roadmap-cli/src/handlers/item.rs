use crate::cli::ItemAction;
use crate::context::CliContext;
use crate::output;
use roadmap_domain::WorkItem;

pub async fn handle(ctx: &CliContext, action: ItemAction) -> anyhow::Result<()> {
    match action {
        ItemAction::Create {
            project,
            kind,
            key,
            title,
        } => {
            let kind = ctx.resolve_kind(kind)?;
            let item = ctx
                .items
                .create_item(WorkItem::new(project, kind, key, title))
                .await?;
            tracing::info!("Created {} {} ({})", item.kind, item.key, item.id);
            output::output_success(&item)
        }
        ItemAction::List { project, kind } => {
            let items = ctx.items.list_items(project, kind).await?;
            output::output_list(items)
        }
        ItemAction::Delete { id } => {
            let item = ctx.items.delete_item(id).await?;
            output::output_success(serde_json::json!({
                "deleted": item.id.to_string(),
                "key": item.key,
            }))
        }
    }
}
