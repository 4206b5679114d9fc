//! `tessel lookahead` — compute or refresh the router lookahead cache.

use tessel_diagnostics::DiagnosticSink;
use tessel_lookahead::{architecture_fingerprint, compute_cost_map, CostMap};
use tessel_rr::build_rr_graph;

use crate::pipeline::{load_fabric, render_diagnostics, resolve_with_overrides};
use crate::{GlobalArgs, LookaheadArgs, ReportFormat};

/// Runs the `tessel lookahead` command.
///
/// An existing cache file that matches the fabric is kept unless `--force`
/// is given; anything else is recomputed and written.
pub fn run(args: &LookaheadArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let resolved = resolve_with_overrides(global, &args.fabric)?;
    let path = match args.output.as_ref().map(std::path::PathBuf::from).or(resolved.cache_path.clone()) {
        Some(path) => path,
        None => return Err("no lookahead file: pass --output or set [lookahead] cache".into()),
    };

    let sink = DiagnosticSink::new();
    let (arch, grid) = load_fabric(&resolved, &sink)?;
    let fingerprint = architecture_fingerprint(&arch, &grid, &resolved.rr_options, &resolved.lookahead)?;

    if !args.force {
        if let Some(map) = CostMap::read(&path, fingerprint) {
            if !global.quiet {
                eprintln!(
                    "   Up to date {} ({} valid entries)",
                    path.display(),
                    map.num_valid()
                );
            }
            render_diagnostics(&sink, ReportFormat::Text, global);
            return Ok(0);
        }
    }

    let graph = build_rr_graph(&arch, &grid, &resolved.rr_options, &sink)?.graph;
    let map = compute_cost_map(&arch, &graph, &resolved.lookahead);
    map.write(&path, fingerprint)?;
    if !global.quiet {
        let per_tile = map.per_tile();
        eprintln!(
            "   Wrote {} ({} valid entries, {:.4} ns and {:.2} congestion per tile)",
            path.display(),
            map.num_valid(),
            per_tile.delay,
            per_tile.congestion
        );
    }

    render_diagnostics(&sink, ReportFormat::Text, global);
    Ok(if sink.has_errors() { 1 } else { 0 })
}
