use anyhow::Context as _;
use clap::Parser;
use lrspec::{compiler::Config, export::export, grammar::Grammar};
use std::{fs, path::PathBuf, time::Instant};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Specify the path of exported table file.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Write a human-readable trace of the automaton.
    #[arg(short, long)]
    verbose: bool,

    /// Omit the kernel items from the compiled automaton.
    #[arg(long)]
    skinny: bool,

    /// The path of the trace file written in verbose mode.
    #[arg(long)]
    log: Option<PathBuf>,

    /// Reuse the compiled automaton cached in this file.
    #[arg(long)]
    cache: Option<PathBuf>,

    /// Pretty-print the exported table.
    #[arg(long)]
    pretty: bool,

    /// The path of grammar definition file.
    input: PathBuf,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    tracing::debug!("parsed CLI args = {:?}", args);

    process_file(&args)
        .with_context(|| anyhow::anyhow!("errored during processing {}", args.input.display()))?;

    Ok(())
}

fn process_file(args: &Args) -> anyhow::Result<()> {
    let in_file = fs::canonicalize(&args.input) //
        .context("failed to canonicalize the input file name")?;

    let out_file = args
        .output
        .clone()
        .unwrap_or_else(|| in_file.with_extension("table.json"));
    let backup_file = out_file.with_extension("json.bak");

    let s = Instant::now();
    let grammar = Grammar::from_file(&in_file)?;
    tracing::info!("parse_file: {:?} elapsed", s.elapsed());

    let mut config = Config::new();
    config.verbose(args.verbose).skinny(args.skinny);
    if let Some(log) = &args.log {
        config.log_path(log);
    } else if args.verbose {
        config.log_path(in_file.with_extension("log"));
    }
    if let Some(cache) = &args.cache {
        config.cache_path(cache);
    }

    let s = Instant::now();
    let spec = config.compile_cached(&grammar)?;
    tracing::info!("compile: {:?} elapsed", s.elapsed());

    let conflicts: Vec<_> = spec.conflicts().collect();
    if !conflicts.is_empty() {
        for (state, t, action) in &conflicts {
            eprintln!(
                "[error] conflict in state {} on `{}': {:?}",
                state, grammar.terminals[t].name, action
            );
        }
        anyhow::bail!("the grammar has {} unresolved conflict(s)", conflicts.len());
    }

    let table = export(&spec);
    let content = if args.pretty {
        table.to_json_pretty()?
    } else {
        table.to_json()?
    };

    // dump results.
    if out_file.exists() {
        fs::copy(&out_file, &backup_file).with_context(|| {
            anyhow::anyhow!(
                "failed to backup the output file to {}",
                backup_file.display()
            )
        })?;
    }
    fs::write(&out_file, content).with_context(|| {
        anyhow::anyhow!("failed to write exported table to {}", out_file.display())
    })?;

    Ok(())
}
