use std::fs;
use std::io::{self, Write};

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use qbf_preprocess::Preprocessor;

/// A preprocessor for Quantified Boolean Formulas in prenex CNF.
#[derive(Parser, Debug)]
#[command(name = "qbf-preprocess", version)]
struct Cli {
    /// The input QDIMACS file to use (stdin if omitted)
    input: Option<String>,

    /// Write the preprocessed formula here instead of stdout
    #[arg(short, long)]
    output: Option<String>,

    /// Read configuration options from a TOML file (flat `key = value` table)
    #[arg(short = 'c', long = "config")]
    config_file: Option<String>,

    /// Set a single configuration option as `key=value` (or bare `key` for a flag); see
    /// `qbf-preprocess -C help` for the option list. May be repeated.
    #[arg(short = 'C', long = "config-option", value_name = "KEY[=VALUE]")]
    config_option: Vec<String>,

    /// Print preprocessing statistics to stderr after running
    #[arg(long)]
    stats: bool,
}

fn main() {
    let exit_code = match main_with_err() {
        Err(err) => {
            log::error!("{:#}", err);
            1
        }
        Ok(code) => code,
    };
    std::process::exit(exit_code);
}

fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
}

fn apply_config_option(pp: &mut Preprocessor, option: &str) -> Result<()> {
    match option.split_once('=') {
        Some((key, value)) => pp
            .configure(key, Some(value))
            .with_context(|| format!("invalid config option '{}'", option)),
        None => pp
            .configure(option, None)
            .with_context(|| format!("invalid config option '{}'", option)),
    }
}

fn apply_config_file(pp: &mut Preprocessor, path: &str) -> Result<()> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("reading configuration file '{}'", path))?;
    let table: toml::Value =
        toml::from_str(&contents).with_context(|| format!("parsing configuration file '{}'", path))?;

    let table = table
        .as_table()
        .ok_or_else(|| anyhow::anyhow!("configuration file '{}' is not a TOML table", path))?;

    for (key, value) in table {
        match value {
            toml::Value::Boolean(true) => pp.configure(key, None)?,
            toml::Value::Boolean(false) => continue,
            toml::Value::String(s) => pp.configure(key, Some(s))?,
            toml::Value::Integer(i) => pp.configure(key, Some(&i.to_string()))?,
            other => anyhow::bail!("option '{}' has unsupported value {:?}", key, other),
        }
    }
    Ok(())
}

fn main_with_err() -> Result<i32> {
    let cli = Cli::parse();
    init_logging();

    let mut pp = Preprocessor::new();

    if let Some(path) = &cli.config_file {
        apply_config_file(&mut pp, path)?;
    }
    for option in &cli.config_option {
        apply_config_option(&mut pp, option)?;
    }

    match &cli.input {
        Some(path) => {
            info!("reading formula from '{}'", path);
            pp.add_formula(path)
                .with_context(|| format!("reading input file '{}'", path))?;
        }
        None => {
            info!("reading formula from stdin");
            pp.add_qdimacs(io::stdin().lock())
                .context("reading formula from stdin")?;
        }
    }

    let iterations = pp.preprocess();
    info!("preprocessing finished after {} driver iterations", iterations);

    match &cli.output {
        Some(path) => {
            let mut file = fs::File::create(path)
                .with_context(|| format!("creating output file '{}'", path))?;
            pp.print_formula(&mut file)
                .with_context(|| format!("writing output file '{}'", path))?;
        }
        None => {
            let stdout = io::stdout();
            let mut lock = stdout.lock();
            pp.print_formula(&mut lock).context("writing output to stdout")?;
        }
    }

    if cli.stats {
        let mut buf = String::new();
        pp.print_stats(&mut buf).context("formatting statistics")?;
        eprint!("{}", buf);
        io::stderr().flush().ok();
    }

    Ok(0)
}
