//! `tessel noc-route` — route one flow over a mesh NoC.

use serde_json::json;
use tessel_noc::{NocStorage, RoutingAlgorithm};

use crate::pipeline::load_flow_config;
use crate::{GlobalArgs, NocRouteArgs, ReportFormat};

/// Runs the `tessel noc-route` command.
///
/// Mesh size and algorithm come from the `[noc]` section unless given on
/// the command line. Prints the routers visited, source first.
pub fn run(args: &NocRouteArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let (config, _) = load_flow_config(global)?;
    let algorithm = RoutingAlgorithm::from_name(args.algorithm.as_deref().unwrap_or(&config.noc.algorithm))?;
    let width = args.width.unwrap_or(config.noc.mesh_width);
    let height = args.height.unwrap_or(config.noc.mesh_height);
    if width == 0 || height == 0 {
        return Err("mesh dimensions must be positive".into());
    }

    let noc = NocStorage::mesh(width, height, config.noc.link_bandwidth);
    let src = noc.router_by_user_id(args.src)?;
    let dst = noc.router_by_user_id(args.dst)?;
    let route = algorithm.route_flow(&noc, src, dst, args.flow)?;

    let mut hops = vec![noc.router(src).user_id];
    for &link in &route {
        if let Some((_, sink)) = noc.link_ends(link) {
            hops.push(noc.router(sink).user_id);
        }
    }

    match args.format {
        ReportFormat::Text => {
            if !global.quiet {
                eprintln!("   Routing flow {} on a {width}x{height} mesh with {algorithm}", args.flow);
            }
            let path: Vec<String> = hops.iter().map(|h| h.to_string()).collect();
            println!("{}", path.join(" -> "));
            println!("{} hop(s)", route.len());
        }
        ReportFormat::Json => {
            let report = json!({
                "algorithm": algorithm.name(),
                "mesh": [width, height],
                "flow": args.flow,
                "routers": hops,
                "links": route.iter().map(|l| l.index()).collect::<Vec<_>>(),
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }
    Ok(0)
}
