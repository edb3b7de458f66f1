//! Zone command handlers.

use std::sync::Arc;

use tabled::Tabled;
use topomap_core::{EngineConfig, EntityId, Geometry, Zone, ZoneBinding};

use crate::cli::{GlobalOpts, ZonesArgs, ZonesCommand};
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Tabled)]
struct ZoneRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Type")]
    ztype: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Priority")]
    priority: u32,
    #[tabled(rename = "Shape")]
    shape: String,
}

impl From<&Arc<Zone>> for ZoneRow {
    fn from(z: &Arc<Zone>) -> Self {
        Self {
            id: z.id.to_string(),
            name: z.name.clone(),
            ztype: z.zone_type.clone(),
            status: z.status.clone(),
            priority: z.priority,
            shape: Geometry::from(z.geometry.clone()).kind().to_string(),
        }
    }
}

#[derive(Tabled)]
struct BindingRow {
    #[tabled(rename = "Node")]
    node: String,
    #[tabled(rename = "Primary")]
    primary: String,
    #[tabled(rename = "Weight")]
    weight: u32,
}

impl From<&Arc<ZoneBinding>> for BindingRow {
    fn from(b: &Arc<ZoneBinding>) -> Self {
        Self {
            node: b.node_id.to_string(),
            primary: if b.is_primary { "yes" } else { "no" }.into(),
            weight: b.weight,
        }
    }
}

pub async fn handle(
    engine: EngineConfig,
    args: ZonesArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        ZonesCommand::List(view) => {
            let (session, _) = util::open_view(engine, &view).await?;
            let snap = session.store().zones_snapshot();
            session.shutdown().await;

            let out = output::render_list(
                &global.output,
                snap.as_slice(),
                |z| ZoneRow::from(z),
                |z| z.id.to_string(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ZonesCommand::Bindings { zone, view } => {
            let zone_id = EntityId::from(zone);
            let (session, _) = util::open_view(engine, &view).await?;
            let loaded = session.load_zone_bindings(&zone_id).await;
            let bindings = session.store().bindings_for_zone(&zone_id);
            session.shutdown().await;
            let count = loaded?;
            tracing::debug!(zone = %zone_id, count, "zone bindings loaded");

            let out = output::render_list(
                &global.output,
                &bindings,
                |b| BindingRow::from(b),
                |b| b.node_id.to_string(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
