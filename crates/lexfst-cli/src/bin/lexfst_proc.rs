// lexfst-proc: Look up words in a compiled transducer.
//
// Reads words from stdin (one per line) unless WORD arguments are given, and
// prints each result as ^word/output1/output2$ (^word/*word$ when unknown).
//
// Usage:
//   lexfst-proc [-v] TRANSDUCER [WORD...]

use std::io::{self, BufRead, Write};
use std::path::Path;

use lexfst_fst::DEFAULT_BUFFER_SIZE;

fn main() {
    let mut args: Vec<String> = std::env::args().skip(1).collect();

    if lexfst_cli::wants_help(&args) {
        println!("lexfst-proc: Look up words in a compiled transducer.");
        println!();
        println!("Usage: lexfst-proc [-v] TRANSDUCER [WORD...]");
        println!();
        println!("If WORD arguments are given, looks up each word.");
        println!("Otherwise reads words from stdin (one per line).");
        println!();
        println!("Options:");
        println!("  -v, --verbose          Log loading details");
        println!("  -h, --help             Print this help");
        return;
    }

    let verbose = lexfst_cli::take_verbose(&mut args);
    lexfst_cli::init_logging(verbose);

    let Some((path, words)) = args.split_first() else {
        lexfst_cli::fatal("expected TRANSDUCER [WORD...] (see --help)");
    };
    let transducer =
        lexfst_cli::load_transducer(Path::new(path)).unwrap_or_else(|e| lexfst_cli::fatal(&e));
    tracing::debug!(
        sections = transducer.sections().len(),
        direction = %transducer.direction(),
        "loaded transducer"
    );

    let mut config = transducer.new_config(DEFAULT_BUFFER_SIZE);
    let stdout = io::stdout();
    let mut out = io::BufWriter::new(stdout.lock());
    let mut lookup = |word: &str, out: &mut io::BufWriter<io::StdoutLock<'_>>| {
        let outputs = transducer.lookup_with(&mut config, word);
        let _ = writeln!(out, "{}", lexfst_cli::format_lookup(word, &outputs));
    };

    if words.is_empty() {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let line = match line {
                Ok(l) => l,
                Err(e) => {
                    eprintln!("error reading stdin: {e}");
                    break;
                }
            };
            let word = line.trim_end_matches('\r');
            if word.is_empty() {
                continue;
            }
            lookup(word, &mut out);
        }
    } else {
        for word in words {
            lookup(word, &mut out);
        }
    }
}
