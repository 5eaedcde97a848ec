// lexfst-comp: Compile a dictionary into a binary transducer.
//
// Usage:
//   lexfst-comp [lr|rl] [-a ALT] [-V VARIANT] [-v] INPUT OUTPUT
//
// INPUT is dictionary markup (.dix) or tab-separated automaton text (.att).
// The output file is only created when compilation succeeds.

use std::io::Write;
use std::path::{Path, PathBuf};

use lexfst_compile::{CompileOptions, compile_file};

fn main() {
    let mut args: Vec<String> = std::env::args().skip(1).collect();

    if lexfst_cli::wants_help(&args) {
        println!("lexfst-comp: Compile a dictionary into a binary transducer.");
        println!();
        println!("Usage: lexfst-comp [lr|rl] [-a ALT] [-V VARIANT] [-v] INPUT OUTPUT");
        println!();
        println!("  lr                     Read left sides, write right sides (default)");
        println!("  rl                     Read right sides, write left sides");
        println!();
        println!("Options:");
        println!("  -a, --alt ALT          Include entries with alt=\"ALT\"");
        println!("  -V, --var VARIANT      Include entries with v=\"VARIANT\"");
        println!("  -v, --verbose          Log compilation stages");
        println!("  -h, --help             Print this help");
        println!();
        println!("Without a direction argument, {} is consulted.", lexfst_cli::DIRECTION_ENV);
        return;
    }

    let verbose = lexfst_cli::take_verbose(&mut args);
    lexfst_cli::init_logging(verbose);

    let alt = lexfst_cli::take_option(&mut args, "-a", "--alt")
        .unwrap_or_else(|e| lexfst_cli::fatal(&e));
    let variant = lexfst_cli::take_option(&mut args, "-V", "--var")
        .unwrap_or_else(|e| lexfst_cli::fatal(&e));

    let (direction, input, output) = match args.as_slice() {
        [direction, input, output] => (Some(direction.as_str()), input, output),
        [input, output] => (None, input, output),
        _ => lexfst_cli::fatal("expected [lr|rl] INPUT OUTPUT (see --help)"),
    };
    let direction =
        lexfst_cli::resolve_direction(direction).unwrap_or_else(|e| lexfst_cli::fatal(&e));

    let options = CompileOptions::new(direction)
        .with_alt(alt)
        .with_variant(variant);
    let compiled = compile_file(Path::new(input), &options)
        .unwrap_or_else(|e| lexfst_cli::fatal(&format!("{input}: {e}")));
    let bytes = compiled
        .to_bytes()
        .unwrap_or_else(|e| lexfst_cli::fatal(&format!("{input}: {e}")));

    write_atomically(Path::new(output), &bytes).unwrap_or_else(|e| lexfst_cli::fatal(&e));

    let stdout = std::io::stdout();
    let mut out = std::io::BufWriter::new(stdout.lock());
    for section in &compiled.sections {
        let _ = writeln!(
            out,
            "{} {} {}",
            section.name,
            section.automaton.state_count(),
            section.automaton.transition_count()
        );
    }
}

/// Write to a sibling temporary file, then rename it over `path`.
fn write_atomically(path: &Path, bytes: &[u8]) -> Result<(), String> {
    let file_name = path
        .file_name()
        .ok_or_else(|| format!("invalid output path {}", path.display()))?;
    let mut tmp_name = std::ffi::OsString::from(".");
    tmp_name.push(file_name);
    tmp_name.push(".tmp");
    let tmp: PathBuf = path.with_file_name(tmp_name);

    std::fs::write(&tmp, bytes).map_err(|e| format!("failed to write {}: {e}", tmp.display()))?;
    std::fs::rename(&tmp, path).map_err(|e| {
        let _ = std::fs::remove_file(&tmp);
        format!("failed to write {}: {e}", path.display())
    })
}
