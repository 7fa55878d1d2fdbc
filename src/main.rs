//! `pdf-forge` command-line driver.
//!
//! A thin wrapper around the core: parse a PDF, optionally apply one
//! modification, and write the result. The core does not know this binary
//! exists; everything here is argument handling and I/O.

use pdf_forge::incremental;
use pdf_forge::PDFDocument;
use std::env;
use std::fs;
use std::process::ExitCode;

const USAGE: &str = "\
Usage: pdf-forge <input.pdf> [options]

Options:
  --modify <page>:rotate:<degrees>  Apply a modification and write an
                                     incremental update (degrees not a
                                     multiple of 90 is clamped to 0)
  --output <path>                   Where to write the result (required
                                     with --modify; defaults to stdout
                                     otherwise)
  --password <password>             User password for encrypted input
  --version                         Print the crate version and exit
";

struct Args {
    input: String,
    modify: Option<(usize, i64)>,
    output: Option<String>,
    password: Vec<u8>,
}

fn parse_args(raw: &[String]) -> Result<Args, String> {
    let mut input = None;
    let mut modify = None;
    let mut output = None;
    let mut password = Vec::new();

    let mut i = 0;
    while i < raw.len() {
        match raw[i].as_str() {
            "--modify" => {
                let spec = raw.get(i + 1).ok_or("--modify requires a value")?;
                modify = Some(parse_modify_spec(spec)?);
                i += 2;
            }
            "--output" => {
                output = Some(raw.get(i + 1).ok_or("--output requires a value")?.clone());
                i += 2;
            }
            "--password" => {
                password = raw.get(i + 1).ok_or("--password requires a value")?.clone().into_bytes();
                i += 2;
            }
            other if input.is_none() && !other.starts_with("--") => {
                input = Some(other.to_string());
                i += 1;
            }
            other => return Err(format!("unrecognized argument: {other}")),
        }
    }

    Ok(Args {
        input: input.ok_or("missing input PDF path")?,
        modify,
        output,
        password,
    })
}

/// Parses `<page>:rotate:<degrees>`, the only modification this driver
/// exposes today.
fn parse_modify_spec(spec: &str) -> Result<(usize, i64), String> {
    let parts: Vec<&str> = spec.split(':').collect();
    match parts.as_slice() {
        [page, "rotate", degrees] => {
            let page: usize = page.parse().map_err(|_| format!("invalid page index: {page}"))?;
            let degrees: i64 = degrees.parse().map_err(|_| format!("invalid degrees: {degrees}"))?;
            Ok((page, degrees))
        }
        _ => Err(format!("unrecognized --modify spec: {spec} (expected <page>:rotate:<degrees>)")),
    }
}

fn run() -> Result<(), String> {
    let raw: Vec<String> = env::args().skip(1).collect();

    if raw.iter().any(|a| a == "--version") {
        println!("pdf-forge {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    if raw.is_empty() {
        return Err(USAGE.to_string());
    }

    let args = parse_args(&raw)?;
    let original = fs::read(&args.input).map_err(|e| format!("reading {}: {e}", args.input))?;

    let mut doc = if args.password.is_empty() {
        PDFDocument::open(original.clone())
    } else {
        PDFDocument::open_with_password(original.clone(), &args.password)
    }
    .map_err(|e| format!("parsing {}: {e:?}", args.input))?;

    match args.modify {
        Some((page_index, degrees)) => {
            let output_path = args.output.ok_or("--modify requires --output")?;
            let updated = incremental::rotate_page(&mut doc, &original, page_index, degrees)
                .map_err(|e| format!("applying modification: {e:?}"))?;
            fs::write(&output_path, updated).map_err(|e| format!("writing {output_path}: {e}"))?;
            log::info!("wrote incremental update to {output_path}");
        }
        None => {
            let page_count = doc.page_count().map_err(|e| format!("reading page count: {e:?}"))?;
            let report = format!(
                "{}: {} page(s), {} xref entr{}\n",
                args.input,
                page_count,
                doc.xref().len(),
                if doc.xref().len() == 1 { "y" } else { "ies" }
            );
            match args.output {
                Some(path) => fs::write(&path, report).map_err(|e| format!("writing {path}: {e}"))?,
                None => print!("{report}"),
            }
        }
    }

    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("{message}");
            ExitCode::FAILURE
        }
    }
}
