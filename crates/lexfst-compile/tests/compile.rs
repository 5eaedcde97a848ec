//! End-to-end tests: compile the fixtures under tests/data and check lookups
//! against the golden file lookups.json.
//!
//! Run: cargo test -p lexfst-compile --test compile

use std::path::{Path, PathBuf};

use lexfst_compile::{CompileError, CompileOptions, compile_file};
use lexfst_core::Direction;
use lexfst_fst::CompiledTransducer;
use lexfst_fst::validate::ValidationError;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct LookupCase {
    source: String,
    direction: String,
    inputs: Vec<String>,
    expected: Vec<String>,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn data(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
        .join(name)
}

/// 1-based number of the first line of fixture `name` containing `needle`.
fn line_of(name: &str, needle: &str) -> usize {
    let text = std::fs::read_to_string(data(name)).unwrap();
    text.lines()
        .position(|l| l.contains(needle))
        .map(|i| i + 1)
        .unwrap_or_else(|| panic!("{needle:?} not found in {name}"))
}

fn options(direction: Direction) -> CompileOptions {
    CompileOptions::new(direction)
}

fn load(name: &str, direction: Direction) -> CompiledTransducer {
    let compiled = compile_file(&data(name), &options(direction)).unwrap();
    CompiledTransducer::from_bytes(&compiled.to_bytes().unwrap()).unwrap()
}

fn framed(t: &CompiledTransducer, input: &str) -> String {
    let outputs = t.lookup(input);
    if outputs.is_empty() {
        format!("^{input}/*{input}$")
    } else {
        format!("^{input}/{}$", outputs.join("/"))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[test]
fn golden_lookups() {
    let path = data("lookups.json");
    let text = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("failed to read golden file {}: {}", path.display(), e));
    let cases: Vec<LookupCase> = serde_json::from_str(&text)
        .unwrap_or_else(|e| panic!("failed to parse golden file {}: {}", path.display(), e));
    assert!(!cases.is_empty());
    for case in cases {
        let direction: Direction = case.direction.parse().unwrap();
        let t = load(&case.source, direction);
        let got: Vec<String> = case.inputs.iter().map(|i| framed(&t, i)).collect();
        assert_eq!(got, case.expected, "{} ({})", case.source, case.direction);
    }
}

#[test]
fn empty_side_depends_on_direction() {
    let line = line_of("lhs-empty-mono.dix", "<l></l><r>a");
    let err = compile_file(&data("lhs-empty-mono.dix"), &options(Direction::Lr)).unwrap_err();
    match err {
        CompileError::EmptySide { line: got, side } => assert_eq!((got, side), (line, "left")),
        other => panic!("unexpected {other:?}"),
    }
    assert!(compile_file(&data("lhs-empty-mono.dix"), &options(Direction::Rl)).is_ok());

    let line = line_of("rhs-empty-mono.dix", "<r></r>");
    let err = compile_file(&data("rhs-empty-mono.dix"), &options(Direction::Rl)).unwrap_err();
    match err {
        CompileError::EmptySide { line: got, side } => assert_eq!((got, side), (line, "right")),
        other => panic!("unexpected {other:?}"),
    }
    assert!(compile_file(&data("rhs-empty-mono.dix"), &options(Direction::Lr)).is_ok());
}

#[test]
fn leading_whitespace_depends_on_direction() {
    let line = line_of("lhs-ws-mono.dix", "<b/>a");
    let err = compile_file(&data("lhs-ws-mono.dix"), &options(Direction::Lr)).unwrap_err();
    match err {
        CompileError::LeadingWhitespace { line: got, side } => {
            assert_eq!((got, side), (line, "left"))
        }
        other => panic!("unexpected {other:?}"),
    }
    assert!(compile_file(&data("lhs-ws-mono.dix"), &options(Direction::Rl)).is_ok());

    let line = line_of("rhs-ws-mono.dix", "<r> a");
    let err = compile_file(&data("rhs-ws-mono.dix"), &options(Direction::Rl)).unwrap_err();
    match err {
        CompileError::LeadingWhitespace { line: got, side } => {
            assert_eq!((got, side), (line, "right"))
        }
        other => panic!("unexpected {other:?}"),
    }
    assert!(compile_file(&data("rhs-ws-mono.dix"), &options(Direction::Lr)).is_ok());
}

#[test]
fn fixture_error_lines_follow_the_declaration() {
    // Line 1 is the XML declaration, so the bad entry of each fixture sits
    // on line 9.
    for name in ["lhs-empty-mono.dix", "rhs-empty-mono.dix", "lhs-ws-mono.dix", "rhs-ws-mono.dix"] {
        assert_eq!(line_of(name, "<?xml"), 1, "{name}");
    }
    assert_eq!(line_of("lhs-empty-mono.dix", "<l></l><r>a"), 9);
}

#[test]
fn epsilon_loop_is_rejected() {
    let err = compile_file(&data("cat-epsilon-loop.att"), &options(Direction::Lr)).unwrap_err();
    match err {
        CompileError::Validation { section, source } => {
            assert_eq!(section, "main@standard");
            assert!(matches!(source, ValidationError::EpsilonCycle { .. }));
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn epsilon_to_final_is_rejected() {
    for direction in [Direction::Lr, Direction::Rl] {
        let err = compile_file(&data("cat-epsilon-to-final.att"), &options(direction)).unwrap_err();
        assert!(matches!(
            err,
            CompileError::Validation { source: ValidationError::EpsilonToFinal { .. }, .. }
        ));
    }
}

#[test]
fn punctuation_paths_get_their_own_section() {
    let compiled = compile_file(&data("cat-full-stop.att"), &options(Direction::Lr)).unwrap();
    let names: Vec<&str> = compiled.sections.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["main@standard", "final@inconditional"]);
}

#[test]
fn output_is_deterministic() {
    for name in ["normal-and-join.dix", "cat-dog.att", "cat-full-stop.att"] {
        let first = compile_file(&data(name), &options(Direction::Lr))
            .unwrap()
            .to_bytes()
            .unwrap();
        let second = compile_file(&data(name), &options(Direction::Lr))
            .unwrap()
            .to_bytes()
            .unwrap();
        assert_eq!(first, second, "{name}");
    }
}

#[test]
fn empty_dictionary_has_no_sections() {
    let compiled = compile_file(&data("entirely-empty.dix"), &options(Direction::Lr)).unwrap();
    assert!(compiled.sections.is_empty());
    let t = CompiledTransducer::from_bytes(&compiled.to_bytes().unwrap()).unwrap();
    assert_eq!(t.section_names().count(), 0);
    assert!(t.to_att().is_empty());
}

#[test]
fn printed_automaton_compiles_back() {
    let original = load("normal-and-join.dix", Direction::Lr);
    let text = original.to_att();
    let bytes = lexfst_compile::compile_to_bytes(
        lexfst_compile::AttSource::new(text),
        &options(Direction::Lr),
    )
    .unwrap();
    let reread = CompiledTransducer::from_bytes(&bytes).unwrap();
    for input in ["abc", "ab", "y", "n", "jg", "jh", "kg", "zz"] {
        assert_eq!(reread.lookup(input), original.lookup(input), "{input}");
    }
}

#[test]
fn header_records_direction_and_letters() {
    let t = load("normal-and-join.dix", Direction::Rl);
    assert_eq!(t.direction(), Direction::Rl);
    assert!(t.letters().starts_with("ABC"));
    assert_eq!(t.section_names().collect::<Vec<_>>(), vec!["main@standard"]);
}
