//! logpipe CLI: compile and inspect logging-pipeline configurations.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use logpipe::compile::{CompileOptions, ConfigCompiler};

#[derive(Parser)]
#[command(name = "logpipe", version, about = "Logging pipeline configuration compiler")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compile a configuration and report diagnostics.
    Check {
        /// Configuration file to compile.
        config: PathBuf,

        /// Promote soft diagnostics to fatal errors.
        #[arg(long)]
        strict: bool,
    },
    /// Compile a configuration and print a JSON summary of the pipeline.
    Inspect {
        /// Configuration file to compile.
        config: PathBuf,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "logpipe=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Check { config, strict } => check(&config, strict),
        Command::Inspect { config } => inspect(&config),
    }
}

fn check(path: &PathBuf, strict: bool) -> ExitCode {
    let options = CompileOptions {
        throw_config_exceptions: strict.then_some(true),
        ..CompileOptions::default()
    };
    match ConfigCompiler::new().with_options(options).compile_file(path) {
        Ok(configuration) => {
            println!(
                "ok: {} target(s), {} rule(s), {} source file(s)",
                configuration.targets().len(),
                configuration.rules().len(),
                configuration.sources().count()
            );
            for unused in configuration.unused_targets() {
                println!("warning: target '{unused}' is never referenced");
            }
            ExitCode::SUCCESS
        }
        Err(error) => {
            eprintln!("error: {error}");
            ExitCode::FAILURE
        }
    }
}

fn inspect(path: &PathBuf) -> ExitCode {
    match ConfigCompiler::new().compile_file(path) {
        Ok(configuration) => match serde_json::to_string_pretty(&configuration.summary()) {
            Ok(json) => {
                println!("{json}");
                ExitCode::SUCCESS
            }
            Err(error) => {
                eprintln!("error: {error}");
                ExitCode::FAILURE
            }
        },
        Err(error) => {
            eprintln!("error: {error}");
            ExitCode::FAILURE
        }
    }
}
