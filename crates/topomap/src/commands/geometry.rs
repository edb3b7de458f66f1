//! Offline GeoJSON validation.

use std::io::Read;

use serde::Serialize;
use topomap_core::{Geometry, geometry};

use crate::cli::{GeometryArgs, GeometryCommand, GeometryShape, GlobalOpts};
use crate::error::CliError;
use crate::output;

#[derive(Serialize)]
struct GeometryReport {
    kind: String,
    positions: usize,
    geometry: Geometry,
}

fn position_count(g: &Geometry) -> usize {
    match g {
        Geometry::Point(_) => 1,
        Geometry::LineString(line) => line.len(),
        Geometry::Polygon(p) => p.rings().iter().map(Vec::len).sum(),
        Geometry::MultiPolygon(ps) => ps
            .iter()
            .flat_map(|p| p.rings())
            .map(Vec::len)
            .sum(),
    }
}

fn read_input(input: &str) -> Result<String, CliError> {
    if input != "-" {
        return Ok(input.to_owned());
    }
    let mut buf = String::new();
    std::io::stdin().read_to_string(&mut buf)?;
    Ok(buf)
}

pub fn handle(args: GeometryArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        GeometryCommand::Validate { input, expect } => {
            let text = read_input(&input)?;
            let parsed = match expect {
                None => geometry::parse(&text)?,
                Some(GeometryShape::Line) => geometry::parse_line_string(&text)?.into(),
                Some(GeometryShape::Area) => geometry::parse_area(&text)?.into(),
            };
            let report = GeometryReport {
                kind: parsed.kind().to_string(),
                positions: position_count(&parsed),
                geometry: parsed,
            };

            let out = output::render_single(
                &global.output,
                &report,
                |r| format!("Valid {} with {} positions", r.kind, r.positions),
                |r| geometry::to_text(&r.geometry),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
