mod cli;
mod error;
mod generators;
mod header;

use std::{fs, path::Path, process::ExitCode};

use clap::Parser;
use tracing::Level;

use error::GeneratorError;
use header::Header;
use uxsd::ContentLayout;

fn read(path: &Path) -> Result<Vec<u8>, GeneratorError> {
    fs::read(path).map_err(|source| GeneratorError::Read {
        path: path.to_owned(),
        source,
    })
}

fn write(path: &Path, contents: &str) -> Result<(), GeneratorError> {
    fs::write(path, contents).map_err(|source| GeneratorError::Write {
        path: path.to_owned(),
        source,
    })
}

/// The header of an existing generated file, if there is one.
fn existing_header(path: &Path) -> Option<Header> {
    let text = fs::read_to_string(path).ok()?;
    Header::parse(&text)
}

fn is_up_to_date(output: &Path, header: &Header) -> bool {
    existing_header(output).is_some_and(|existing| !existing.is_stale(header))
}

fn write_dot_files(dir: &Path, schema: &uxsd::CompiledSchema) -> Result<(), GeneratorError> {
    fs::create_dir_all(dir).map_err(|source| GeneratorError::Write {
        path: dir.to_owned(),
        source,
    })?;
    for ty in &schema.types {
        if let ContentLayout::Group(dfa) = &ty.content {
            let path = dir.join(format!("{}.dot", ty.name));
            tracing::debug!(path = %path.display(), "writing automaton");
            write(&path, &dfa.to_dot(&ty.name))?;
        }
    }
    Ok(())
}

fn run(cli: &cli::Cli) -> Result<(), GeneratorError> {
    let input = read(&cli.input)?;
    let cmdline = std::env::args().collect::<Vec<_>>().join(" ");
    let header = Header::new(cmdline, cli.input.display().to_string(), &input);

    if cli.check {
        // clap makes --check require --output
        if let Some(output) = &cli.output {
            if !is_up_to_date(output, &header) {
                return Err(GeneratorError::Stale(output.clone()));
            }
            tracing::info!(output = %output.display(), "up to date");
        }
        return Ok(());
    }
    if let Some(output) = &cli.output {
        if is_up_to_date(output, &header) {
            tracing::info!(output = %output.display(), "up to date, not regenerating");
            return Ok(());
        }
    }

    let text = String::from_utf8_lossy(&input);
    let schema = uxsd::parse_schema(&text, cli.allow_dtd)?;
    let compiled = uxsd::compile_schema(&schema, &cli.compile_options())?;
    tracing::info!(
        elements = compiled.elements.len(),
        types = compiled.types.len(),
        "compiled schema"
    );
    if let Some(dir) = &cli.dot {
        write_dot_files(dir, &compiled)?;
    }

    let code = format!("{header}\n{}", generators::generate(&compiled)?);
    match &cli.output {
        Some(output) => write(output, &code),
        None => {
            print!("{code}");
            Ok(())
        }
    }
}

fn main() -> ExitCode {
    let cli = cli::Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            tracing::error!("{error}");
            ExitCode::FAILURE
        }
    }
}
