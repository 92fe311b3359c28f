use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use imitation_scss::{compile_file, CompileOptions, FileSystem};

/// Compile a page into an HTML document and a stylesheet
#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    /// Source document
    input: PathBuf,

    /// Where to write the HTML document
    output_html: PathBuf,

    /// Where to write the stylesheet
    output_css: PathBuf,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let compiled = compile_file(&cli.input, &FileSystem, &CompileOptions::new())
        .with_context(|| format!("failed to compile {}", cli.input.display()))?;

    fs::write(&cli.output_html, compiled.html_document(&cli.input))
        .with_context(|| format!("failed to write {}", cli.output_html.display()))?;
    fs::write(&cli.output_css, compiled.css_document(&cli.input))
        .with_context(|| format!("failed to write {}", cli.output_css.display()))?;

    info!(
        html = %cli.output_html.display(),
        css = %cli.output_css.display(),
        "wrote output"
    );
    Ok(())
}
