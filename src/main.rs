use anyhow::Result;
use clap::Parser;
use huella::{cli::Cli, config, filter, formatter, replay, resolver, session};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber for debug output
fn init_tracing(debug: bool) {
    if debug {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive(tracing::Level::TRACE.into()),
            )
            .with_writer(std::io::stderr)
            .init();
    }
}

/// Combine the -e flag, config default, and --lines/--raises into one filter
/// expression; None means the built-in call/return default
fn effective_filter_expr(args: &Cli, config: &config::TraceConfig) -> Option<String> {
    let base = args
        .filter
        .clone()
        .or_else(|| config.filter.clone())
        .unwrap_or_else(|| "kinds=calls".to_string());

    let mut expr = base;
    if args.lines {
        expr.push_str(",line");
    }
    if args.raises {
        expr.push_str(",raise");
    }

    if expr == "kinds=calls" {
        None
    } else {
        Some(expr)
    }
}

fn main() -> Result<()> {
    let args = Cli::parse();

    init_tracing(args.debug);

    // Config file is optional; flags take precedence over its defaults
    let config = if let Some(path) = &args.config {
        config::TraceConfig::from_file(path)?
    } else {
        config::TraceConfig::default()
    };

    if !config.targets.is_empty() {
        tracing::debug!(
            "config declares {} instrumentation targets; not applicable to replay",
            config.targets.len()
        );
    }

    let event_filter = match effective_filter_expr(&args, &config) {
        Some(expr) => filter::EventFilter::from_expr(&expr)?,
        None => filter::EventFilter::default_kinds(),
    };

    let script_map_path = args
        .script_map
        .clone()
        .or_else(|| config.script_map.as_deref().map(PathBuf::from));
    let mut trace_formatter = formatter::TraceFormatter::new()
        .show_lines(args.lines)
        .show_raises(args.raises);
    if let Some(path) = script_map_path {
        let map = resolver::ScriptMap::from_file(&path)?;
        trace_formatter = trace_formatter.with_script_map(Arc::new(map));
    }

    let events = replay::load_trace(&args.trace_file)?;

    let slot = session::SubscriberSlot::new();
    let mut trace_session = session::TraceSession::new()
        .with_filter(event_filter)
        .with_formatter(trace_formatter);

    if !trace_session.start(&slot) {
        anyhow::bail!("Failed to start trace session");
    }

    replay::replay(&events, &slot);

    trace_session.stop(&slot);

    Ok(())
}
