//! Shared helpers for CLI commands.
//!
//! Project root discovery, configuration loading with command-line
//! overrides, fabric setup, and diagnostic rendering.

use std::path::{Path, PathBuf};

use tessel_arch::{Architecture, DeviceGrid};
use tessel_config::{resolve_build, ArchSource, FlowConfig, ResolvedBuild, CONFIG_FILE_NAME};
use tessel_diagnostics::{DiagnosticRenderer, DiagnosticSink, JsonRenderer, TerminalRenderer};

use crate::{FabricArgs, GlobalArgs, ReportFormat};

/// Walks up from `start` looking for the nearest directory containing `tessel.toml`.
pub fn find_project_root(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();
    loop {
        if current.join(CONFIG_FILE_NAME).exists() {
            return Some(current);
        }
        if !current.pop() {
            return None;
        }
    }
}

/// Loads the flow configuration selected by the global flags.
///
/// `--config` may name the file or its directory and must exist. Without it
/// the nearest `tessel.toml` above the current directory is used, falling
/// back to the defaults when there is none. Returns the configuration and
/// the directory relative paths are resolved against.
pub fn load_flow_config(
    global: &GlobalArgs,
) -> Result<(FlowConfig, PathBuf), Box<dyn std::error::Error>> {
    if let Some(ref config_path) = global.config {
        let p = PathBuf::from(config_path);
        if p.is_file() {
            let dir = p
                .parent()
                .map(|p| p.to_path_buf())
                .unwrap_or_else(|| PathBuf::from("."));
            return Ok((tessel_config::load_config_file(&p)?, dir));
        }
        return Ok((tessel_config::load_config(&p)?, p));
    }

    let cwd = std::env::current_dir()?;
    match find_project_root(&cwd) {
        Some(root) => {
            log::debug!("using {}", root.join(CONFIG_FILE_NAME).display());
            Ok((tessel_config::load_config(&root)?, root))
        }
        None => {
            log::debug!("no {CONFIG_FILE_NAME} found, using defaults");
            Ok((FlowConfig::default(), cwd))
        }
    }
}

/// Resolves the configuration and applies the fabric overrides of `args`.
pub fn resolve_with_overrides(
    global: &GlobalArgs,
    args: &FabricArgs,
) -> Result<ResolvedBuild, Box<dyn std::error::Error>> {
    let (config, dir) = load_flow_config(global)?;
    let mut resolved = resolve_build(&config, &dir)?;
    if let Some(ref arch) = args.arch {
        resolved.arch = arch_source(arch);
    }
    if let Some(ref layout) = args.layout {
        resolved.layout = layout.clone();
    }
    if let Some(width) = args.chan_width {
        if width == 0 {
            return Err("--chan-width must be positive".into());
        }
        resolved.rr_options.channels.chan_width_x = width;
        resolved.rr_options.channels.chan_width_y = width;
    }
    Ok(resolved)
}

/// A `.toml` or `.json` argument names a file, anything else a built-in.
pub fn arch_source(arg: &str) -> ArchSource {
    let path = Path::new(arg);
    match path.extension().and_then(|e| e.to_str()) {
        Some("toml") | Some("json") => ArchSource::File(path.to_path_buf()),
        _ => ArchSource::Builtin(arg.to_string()),
    }
}

/// Loads the architecture and builds the device grid.
pub fn load_fabric(
    resolved: &ResolvedBuild,
    sink: &DiagnosticSink,
) -> Result<(Architecture, DeviceGrid), Box<dyn std::error::Error>> {
    let arch = resolved.arch.load()?;
    let grid = resolved.device_grid(&arch, sink)?;
    Ok((arch, grid))
}

/// Prints the collected diagnostics to stderr, followed by a summary line.
pub fn render_diagnostics(sink: &DiagnosticSink, format: ReportFormat, global: &GlobalArgs) {
    let diagnostics = sink.diagnostics();
    if diagnostics.is_empty() {
        return;
    }

    match format {
        ReportFormat::Text => {
            let renderer = TerminalRenderer::new(global.color);
            eprint!("{}", renderer.render_all(&diagnostics));
        }
        ReportFormat::Json => {
            eprint!("{}", JsonRenderer.render_all(&diagnostics));
        }
    }

    if !global.quiet && format == ReportFormat::Text {
        let errors = sink.error_count();
        let warnings = sink.warning_count();
        if errors > 0 {
            eprintln!("error: {errors} error(s), {warnings} warning(s) emitted");
        } else {
            eprintln!("warning: {warnings} warning(s) emitted");
        }
    }
}
