//! `tessel build` and `tessel estimate`.
//!
//! `build` loads the fabric, runs the full graph construction and prints the
//! graph statistics; with `--lookahead` it also computes (or reads from the
//! configured cache) the router lookahead. `estimate` stops after the node
//! count prediction.

use serde_json::json;
use tessel_arch::{Architecture, DeviceGrid};
use tessel_config::ResolvedBuild;
use tessel_diagnostics::DiagnosticSink;
use tessel_lookahead::{architecture_fingerprint, compute_cost_map, load_or_compute, CostMap, MapSource};
use tessel_rr::{build_rr_graph, estimate_rr_nodes, Fabric, NodeCounts, RrGraph};

use crate::pipeline::{load_fabric, render_diagnostics, resolve_with_overrides};
use crate::{BuildArgs, EstimateArgs, GlobalArgs, ReportFormat};

/// Runs the `tessel build` command.
pub fn run(args: &BuildArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let resolved = resolve_with_overrides(global, &args.fabric)?;
    let sink = DiagnosticSink::new();
    let (arch, grid) = load_fabric(&resolved, &sink)?;

    if !global.quiet && args.format == ReportFormat::Text {
        print_banner(&arch, &grid, &resolved);
    }

    let built = match build_rr_graph(&arch, &grid, &resolved.rr_options, &sink) {
        Ok(built) => built,
        Err(e) => {
            render_diagnostics(&sink, args.format, global);
            return Err(e.into());
        }
    };
    let stats = built.graph.stats();

    let lookahead = if args.lookahead {
        Some(lookahead_summary(&arch, &grid, &built.graph, &resolved)?)
    } else {
        None
    };

    match args.format {
        ReportFormat::Text => {
            println!("{stats}");
            println!(
                "sinks compacted: {} ({} from memo, {} left multi-cell)",
                built.compaction.relocated, built.compaction.memo_hits, built.compaction.skipped
            );
            if let Some(ref la) = lookahead {
                println!(
                    "lookahead: {} ({} valid entries, {:.4} ns/tile)",
                    la["source"].as_str().unwrap_or("computed"),
                    la["valid_entries"],
                    la["delay_per_tile"].as_f64().unwrap_or(0.0)
                );
            }
        }
        ReportFormat::Json => {
            let report = json!({
                "architecture": arch.name,
                "grid": {
                    "name": grid.name(),
                    "width": grid.width(),
                    "height": grid.height(),
                    "layers": grid.num_layers(),
                },
                "channels": resolved.rr_options.channels,
                "estimate": built.estimate,
                "stats": stats,
                "compaction": {
                    "relocated": built.compaction.relocated,
                    "memo_hits": built.compaction.memo_hits,
                    "skipped": built.compaction.skipped,
                },
                "lookahead": lookahead,
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    render_diagnostics(&sink, args.format, global);
    Ok(if sink.has_errors() { 1 } else { 0 })
}

/// Runs the `tessel estimate` command.
pub fn run_estimate(args: &EstimateArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let resolved = resolve_with_overrides(global, &args.fabric)?;
    let sink = DiagnosticSink::new();
    let (arch, grid) = load_fabric(&resolved, &sink)?;
    let fabric = Fabric::new(&arch, &grid);

    let per_layer: Vec<NodeCounts> = (0..grid.num_layers())
        .map(|layer| estimate_rr_nodes(fabric, layer, &resolved.rr_options.channels))
        .collect();
    let mut total = NodeCounts::default();
    for counts in &per_layer {
        total.merge(counts);
    }

    match args.format {
        ReportFormat::Text => {
            if !global.quiet {
                print_banner(&arch, &grid, &resolved);
            }
            for (layer, counts) in per_layer.iter().enumerate() {
                println!("layer {layer}: {counts}");
            }
            if per_layer.len() > 1 {
                println!("all layers: {total}");
            }
        }
        ReportFormat::Json => {
            let report = json!({
                "architecture": arch.name,
                "grid": grid.name(),
                "layers": per_layer,
                "total": total,
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    render_diagnostics(&sink, args.format, global);
    Ok(if sink.has_errors() { 1 } else { 0 })
}

fn print_banner(arch: &Architecture, grid: &DeviceGrid, resolved: &ResolvedBuild) {
    let channels = &resolved.rr_options.channels;
    eprintln!(
        "   Building {} on '{}' ({}x{}, {} layer(s)), channels {}x{}",
        arch.name,
        grid.name(),
        grid.width(),
        grid.height(),
        grid.num_layers(),
        channels.chan_width_x,
        channels.chan_width_y
    );
}

/// Computes the lookahead, through the cache when one is configured.
fn lookahead_summary(
    arch: &Architecture,
    grid: &DeviceGrid,
    graph: &RrGraph,
    resolved: &ResolvedBuild,
) -> Result<serde_json::Value, Box<dyn std::error::Error>> {
    let (map, source): (CostMap, &str) = match resolved.cache_path {
        Some(ref path) => {
            let fingerprint = architecture_fingerprint(arch, grid, &resolved.rr_options, &resolved.lookahead)?;
            let (map, source) = load_or_compute(arch, graph, &resolved.lookahead, path, fingerprint)?;
            let source = match source {
                MapSource::Cached => "cached",
                MapSource::Computed => "computed",
            };
            (map, source)
        }
        None => (compute_cost_map(arch, graph, &resolved.lookahead), "computed"),
    };
    let per_tile = map.per_tile();
    Ok(json!({
        "source": source,
        "cache": resolved.cache_path.as_ref().map(|p| p.display().to_string()),
        "valid_entries": map.num_valid(),
        "delay_per_tile": per_tile.delay,
        "congestion_per_tile": per_tile.congestion,
    }))
}
