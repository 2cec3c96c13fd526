//! `jscn` — a command-line filter that compiles JSCN source into a JSON
//! Schema draft-07 document.

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;

/// Compile JSON Schema Compact Notation (JSCN) into JSON Schema draft-07.
#[derive(Parser, Debug)]
#[command(name = "jscn", author, version, about, long_about = None)]
struct Cli {
    /// JSCN source file to compile, or `-` to read from stdin.
    #[arg(default_value = "-")]
    input: PathBuf,

    /// Write the compiled document here instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Emit single-line JSON instead of pretty-printed.
    #[arg(long)]
    compact: bool,

    /// Emit only the `where`-clause definitions as a plain JSON object,
    /// ignoring the root type and reachability pruning.
    #[arg(long)]
    definitions_only: bool,

    /// Increase log verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Wraps a [`jscn::Error`] together with the source text and a display
/// label for the input, so it can render a `-->`/`|`/`^` diagnostic the
/// way the offset alone cannot. The library stays free of any notion of
/// "where did this text come from"; only the CLI needs one.
#[derive(Debug)]
struct CompileError {
    src: String,
    path: String,
    err: jscn::Error,
}

impl std::fmt::Display for CompileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match offset_of(&self.err) {
            Some(offset) => write!(f, "{}", render_diagnostic(&self.src, &self.path, offset, &self.err)),
            None => write!(f, "error: {}", self.err),
        }
    }
}

impl std::error::Error for CompileError {}

fn offset_of(err: &jscn::Error) -> Option<usize> {
    match err {
        jscn::Error::Lex { offset, .. }
        | jscn::Error::Parse { offset, .. }
        | jscn::Error::InvalidCardinal { offset, .. }
        | jscn::Error::DuplicateProperty { offset, .. } => Some(*offset),
        jscn::Error::UnresolvedReference { .. } | jscn::Error::DefinitionConflict { .. } => None,
    }
}

/// Converts a byte offset into a 1-based (line, column) pair.
fn locate(src: &str, offset: usize) -> (usize, usize) {
    let mut line = 1;
    let mut col = 1;
    for (i, c) in src.char_indices() {
        if i >= offset {
            break;
        }
        if c == '\n' {
            line += 1;
            col = 1;
        } else {
            col += 1;
        }
    }
    (line, col)
}

fn render_diagnostic(src: &str, path: &str, offset: usize, err: &jscn::Error) -> String {
    let (line, col) = locate(src, offset);
    let line_text = src.lines().nth(line.saturating_sub(1)).unwrap_or("");
    let gutter = format!("{line}");
    let pad = " ".repeat(gutter.len());
    let caret = " ".repeat(col.saturating_sub(1));
    format!(
        "error: {err}\n{pad} --> {path}:{line}:{col}\n{pad} |\n{gutter} | {line_text}\n{pad} | {caret}^"
    )
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logger(cli.verbose);

    match try_run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn init_logger(verbose: u8) {
    let level = match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::new().filter_level(level).init();
}

fn try_run(cli: &Cli) -> anyhow::Result<()> {
    let src = read_input(&cli.input)?;
    let path = path_label(&cli.input);
    log::info!("compiling {path} ({} bytes)", src.len());

    let schema = jscn::Schema::new(&src).map_err(|err| CompileError {
        src: src.clone(),
        path: path.clone(),
        err,
    })?;

    let value = if cli.definitions_only {
        log::debug!("lowering definitions only, {} declared", schema.definitions().len());
        jscn::lower_all_definitions(schema.definitions())
    } else {
        schema.jsonschema()
    }
    .map_err(|err| CompileError { src, path, err })?;

    let rendered = if cli.compact {
        serde_json::to_string(&value)?
    } else {
        serde_json::to_string_pretty(&value)?
    };
    write_output(&cli.output, &rendered)
}

fn read_input(path: &Path) -> anyhow::Result<String> {
    if path.as_os_str() == "-" {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        Ok(buf)
    } else {
        Ok(fs::read_to_string(path)?)
    }
}

fn path_label(path: &Path) -> String {
    if path.as_os_str() == "-" {
        "<stdin>".to_string()
    } else {
        path.display().to_string()
    }
}

fn write_output(output: &Option<PathBuf>, rendered: &str) -> anyhow::Result<()> {
    match output {
        Some(path) => {
            fs::write(path, rendered)?;
        }
        None => println!("{rendered}"),
    }
    Ok(())
}
