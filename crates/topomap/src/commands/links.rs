//! Link command handlers.
//!
//! `links create` runs the same drawing state machine the map uses:
//! pick the source, drop bend points, pick the target, then submit.

use std::sync::Arc;

use serde::Serialize;
use tabled::Tabled;
use topomap_core::{
    Command as CoreCommand, CommandResult, DrawMode, DrawStep, EngineConfig, EntityId, HttpBackend,
    Link, LinkHealth, LinkRequest, LinkStatus, LinkType, Session, health,
};

use crate::cli::{GlobalOpts, LinksArgs, LinksCommand};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Rows and views ──────────────────────────────────────────────────

/// A link with its health score, for structured output.
#[derive(Serialize)]
struct ScoredLink {
    #[serde(flatten)]
    link: Arc<Link>,
    health: LinkHealth,
}

#[derive(Tabled)]
struct LinkRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Type")]
    ltype: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "From")]
    from: String,
    #[tabled(rename = "To")]
    to: String,
    #[tabled(rename = "Util %")]
    util: String,
    #[tabled(rename = "Health")]
    health: String,
}

fn metric(v: Option<f64>) -> String {
    v.map_or_else(|| "-".into(), |v| format!("{v:.1}"))
}

fn row(s: &ScoredLink, color: bool) -> LinkRow {
    LinkRow {
        id: s.link.id.to_string(),
        name: s.link.name.clone(),
        ltype: s.link.link_type.to_string(),
        status: s.link.status.to_string(),
        from: s.link.from_node.to_string(),
        to: s.link.to_node.to_string(),
        util: metric(s.link.utilization_pct),
        health: output::health_pill(s.health, color),
    }
}

fn detail(l: &Link) -> String {
    let h = health::score(l);
    [
        format!("ID:        {}", l.id),
        format!("Name:      {}", l.name),
        format!("Type:      {}", l.link_type),
        format!("Status:    {}", l.status),
        format!("Endpoints: {} -> {}", l.from_node, l.to_node),
        format!("Priority:  {}", l.priority),
        format!("Capacity:  {} Mbps", metric(l.capacity_mbps)),
        format!("Path:      {} positions", l.geometry.len()),
        format!("Health:    {} {}", h.value, h.tone),
    ]
    .join("\n")
}

// ── Drawing ─────────────────────────────────────────────────────────

struct DrawPlan {
    from: EntityId,
    to: EntityId,
    via: Vec<String>,
    attributes: Attributes,
}

struct Attributes {
    name: Option<String>,
    link_type: LinkType,
    status: LinkStatus,
    priority: u32,
    capacity_mbps: Option<f64>,
}

fn parse_attr<T: std::str::FromStr>(field: &str, raw: &str) -> Result<T, CliError> {
    raw.parse().map_err(|_| CliError::Validation {
        field: field.into(),
        reason: format!("unknown value '{raw}'"),
    })
}

/// Click through the drawing state machine and submit the committed draft.
async fn draw(session: &Session<HttpBackend>, plan: DrawPlan) -> Result<Link, CliError> {
    let bends = plan
        .via
        .iter()
        .map(|raw| util::parse_coordinate(raw))
        .collect::<Result<Vec<_>, _>>()?;
    let mode = if bends.is_empty() {
        DrawMode::Quick
    } else {
        DrawMode::Path
    };

    session.start_drawing(mode);
    session.on_node_clicked(&plan.from)?;
    for at in bends {
        session.on_map_clicked(at);
    }
    let DrawStep::Committed(draft) = session.on_node_clicked(&plan.to)? else {
        return Err(CliError::Internal("link draft did not commit".into()));
    };
    tracing::debug!(geometry = %draft.geometry_text, "draft committed");

    let a = plan.attributes;
    let base = LinkRequest::drawn(
        draft.from_node.clone(),
        draft.to_node.clone(),
        draft.geometry.clone(),
    );
    let attributes = LinkRequest {
        name: a.name.unwrap_or_else(|| base.name.clone()),
        link_type: a.link_type,
        status: a.status,
        priority: a.priority,
        capacity_mbps: a.capacity_mbps,
        ..base
    };

    match session.submit_link(draft, attributes).await? {
        CommandResult::Link(link) => Ok(link),
        other => Err(CliError::Internal(format!(
            "unexpected result for link creation: {other:?}"
        ))),
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    engine: EngineConfig,
    args: LinksArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        LinksCommand::List(view) => {
            let (session, _) = util::open_view(engine, &view).await?;
            let scored: Vec<ScoredLink> = session
                .store()
                .links_with_health()
                .into_iter()
                .map(|(link, health)| ScoredLink { link, health })
                .collect();
            session.shutdown().await;

            let color = output::should_color(&global.color);
            let out = output::render_list(
                &global.output,
                &scored,
                |s| row(s, color),
                |s| s.link.id.to_string(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        LinksCommand::Create {
            from,
            to,
            via,
            name,
            link_type,
            link_status,
            priority,
            capacity,
            view,
        } => {
            let plan = DrawPlan {
                from: EntityId::from(from),
                to: EntityId::from(to),
                via,
                attributes: Attributes {
                    name,
                    link_type: parse_attr("type", &link_type)?,
                    status: parse_attr("link-status", &link_status)?,
                    priority,
                    capacity_mbps: capacity,
                },
            };

            let (session, _) = util::open_view(engine, &view).await?;
            let result = draw(&session, plan).await;
            session.shutdown().await;
            let link = result?;

            let out = output::render_single(&global.output, &link, detail, |l| l.id.to_string())?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        LinksCommand::Delete { link, view } => {
            let (session, _) = util::open_view(engine, &view).await?;
            let result = session
                .execute(CoreCommand::DeleteLink {
                    id: EntityId::from(link),
                })
                .await;
            session.shutdown().await;
            result?;

            if !global.quiet {
                eprintln!("Link deleted");
            }
            Ok(())
        }
    }
}
