//! Offline link-health scoring.

use serde::Serialize;
use topomap_core::{LinkHealth, LinkStatus, health};

use crate::cli::{GlobalOpts, HealthArgs};
use crate::error::CliError;
use crate::output;

#[derive(Serialize)]
struct HealthReport {
    status: LinkStatus,
    utilization_pct: Option<f64>,
    latency_ms: Option<f64>,
    loss_db: Option<f64>,
    #[serde(flatten)]
    health: LinkHealth,
}

pub fn handle(args: &HealthArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let status: LinkStatus = args.status.parse().map_err(|_| CliError::Validation {
        field: "status".into(),
        reason: format!("unknown link status '{}'", args.status),
    })?;
    let report = HealthReport {
        status,
        utilization_pct: args.utilization,
        latency_ms: args.latency,
        loss_db: args.loss,
        health: health::score_parts(status, args.utilization, args.latency, args.loss),
    };

    let color = output::should_color(&global.color);
    let out = output::render_single(
        &global.output,
        &report,
        |r| format!("Health: {}", output::health_pill(r.health, color)),
        |r| r.health.value.to_string(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}
