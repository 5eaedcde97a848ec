// lexfst-print: Print a compiled transducer as tab-separated automaton text.
//
// The output can be compiled again with lexfst-comp.
//
// Usage:
//   lexfst-print [-v] TRANSDUCER

use std::io::Write;
use std::path::Path;

fn main() {
    let mut args: Vec<String> = std::env::args().skip(1).collect();

    if lexfst_cli::wants_help(&args) {
        println!("lexfst-print: Print a compiled transducer as automaton text.");
        println!();
        println!("Usage: lexfst-print [-v] TRANSDUCER");
        println!();
        println!("Sections are separated by a line containing --.");
        return;
    }

    let verbose = lexfst_cli::take_verbose(&mut args);
    lexfst_cli::init_logging(verbose);

    let [path] = args.as_slice() else {
        lexfst_cli::fatal("expected TRANSDUCER (see --help)");
    };
    let transducer =
        lexfst_cli::load_transducer(Path::new(path)).unwrap_or_else(|e| lexfst_cli::fatal(&e));
    for name in transducer.section_names() {
        tracing::debug!(section = name, "printing section");
    }

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    if let Err(e) = out.write_all(transducer.to_att().as_bytes()) {
        lexfst_cli::fatal(&format!("failed to write output: {e}"));
    }
}
