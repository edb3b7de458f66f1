//! Node command handlers.

use std::sync::Arc;

use tabled::Tabled;
use topomap_core::{Command as CoreCommand, CommandResult, Coordinate, EngineConfig, EntityId, Node};

use crate::cli::{GlobalOpts, NodesArgs, NodesCommand};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct NodeRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Type")]
    ntype: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Lat")]
    lat: String,
    #[tabled(rename = "Lng")]
    lng: String,
}

impl From<&Arc<Node>> for NodeRow {
    fn from(n: &Arc<Node>) -> Self {
        Self {
            id: n.id.to_string(),
            name: n.name.clone(),
            ntype: n.node_type.to_string(),
            status: n.status.to_string(),
            lat: format!("{:.6}", n.lat),
            lng: format!("{:.6}", n.lng),
        }
    }
}

fn detail(n: &Node) -> String {
    [
        format!("ID:       {}", n.id),
        format!("Name:     {}", n.name),
        format!("Type:     {}", n.node_type),
        format!("Status:   {}", n.status),
        format!("Position: {:.6}, {:.6} (lng, lat)", n.lng, n.lat),
    ]
    .join("\n")
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    engine: EngineConfig,
    args: NodesArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        NodesCommand::List(view) => {
            let (session, _) = util::open_view(engine, &view).await?;
            let snap = session.store().nodes_snapshot();
            session.shutdown().await;

            let out = output::render_list(
                &global.output,
                snap.as_slice(),
                |n| NodeRow::from(n),
                |n| n.id.to_string(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        NodesCommand::Move {
            node,
            lng,
            lat,
            view,
        } => {
            let (session, _) = util::open_view(engine, &view).await?;
            let result = session
                .on_node_dragged(&EntityId::from(node), Coordinate::new(lng, lat))
                .await;
            session.shutdown().await;

            if let CommandResult::Node(moved) = result? {
                let out = output::render_single(&global.output, &moved, detail, |n| {
                    n.id.to_string()
                })?;
                output::print_output(&out, global.quiet);
            }
            Ok(())
        }

        NodesCommand::Delete { node, view } => {
            let (session, _) = util::open_view(engine, &view).await?;
            let result = session
                .execute(CoreCommand::DeleteNode {
                    id: EntityId::from(node),
                })
                .await;
            session.shutdown().await;
            result?;

            if !global.quiet {
                eprintln!("Node deleted");
            }
            Ok(())
        }
    }
}
