// lexfst-cli: shared utilities for the command-line tools.

use std::path::Path;
use std::process;

use lexfst_core::Direction;
use lexfst_fst::CompiledTransducer;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the default compile direction.
pub const DIRECTION_ENV: &str = "LEXFST_DIRECTION";

/// Install the stderr log subscriber.
///
/// `RUST_LOG` wins when set; otherwise the level is `warn`, or `debug` when
/// `verbose` is true.
pub fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Print an error message and exit with code 1.
pub fn fatal(msg: &str) -> ! {
    eprintln!("error: {msg}");
    process::exit(1);
}

/// Check if `--help` or `-h` is in the args.
pub fn wants_help(args: &[String]) -> bool {
    args.iter().any(|a| a == "--help" || a == "-h")
}

/// Remove `-v`/`--verbose` from `args`, returning whether it was present.
pub fn take_verbose(args: &mut Vec<String>) -> bool {
    let before = args.len();
    args.retain(|a| a != "-v" && a != "--verbose");
    args.len() != before
}

/// Remove a valued option (`-a VALUE`, `--alt VALUE` or `--alt=VALUE`) from
/// `args`. The last occurrence wins.
pub fn take_option(
    args: &mut Vec<String>,
    short: &str,
    long: &str,
) -> Result<Option<String>, String> {
    let mut value = None;
    let mut remaining = Vec::with_capacity(args.len());
    let mut iter = std::mem::take(args).into_iter();
    let prefixed = format!("{long}=");
    while let Some(arg) = iter.next() {
        if let Some(v) = arg.strip_prefix(&prefixed) {
            value = Some(v.to_string());
        } else if arg == short || arg == long {
            match iter.next() {
                Some(v) => value = Some(v),
                None => return Err(format!("{arg} requires a value")),
            }
        } else {
            remaining.push(arg);
        }
    }
    *args = remaining;
    Ok(value)
}

/// Resolve the compile direction: an explicit `lr`/`rl` argument first, then
/// `LEXFST_DIRECTION`, then `lr`.
pub fn resolve_direction(explicit: Option<&str>) -> Result<Direction, String> {
    let from_env = std::env::var(DIRECTION_ENV).ok();
    match explicit.or(from_env.as_deref()) {
        Some(text) => text.parse().map_err(|e| format!("{e}")),
        None => Ok(Direction::default()),
    }
}

/// Read and load a compiled transducer.
pub fn load_transducer(path: &Path) -> Result<CompiledTransducer, String> {
    let data =
        std::fs::read(path).map_err(|e| format!("failed to read {}: {e}", path.display()))?;
    CompiledTransducer::from_bytes(&data)
        .map_err(|e| format!("failed to load {}: {e}", path.display()))
}

/// Frame one lookup result as `^input/out1/out2$`, or `^input/*input$` when
/// nothing matched.
pub fn format_lookup(input: &str, outputs: &[String]) -> String {
    if outputs.is_empty() {
        format!("^{input}/*{input}$")
    } else {
        format!("^{input}/{}$", outputs.join("/"))
    }
}
