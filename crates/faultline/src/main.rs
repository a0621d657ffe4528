/*
 * main.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * faultline CLI entry point
 */

//! faultline CLI - Main entry point

use std::path::PathBuf;

use clap::Parser;
use faultline_core::{ColorChoice, ModeFlags};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "faultline")]
#[command(about = "Run a Python script and explain how it failed", long_about = None)]
#[command(disable_version_flag = true)]
struct Cli {
    /// Only check the script's syntax
    #[arg(short = 'x', long)]
    syntax: bool,

    /// Show the exception type
    #[arg(short = 't', long = "type")]
    kind: bool,

    /// Show the exception message
    #[arg(short = 'm', long)]
    message: bool,

    /// Show the script's path
    #[arg(short = 'f', long)]
    file: bool,

    /// Show the function the fault happened in
    #[arg(short = 's', long)]
    scope: bool,

    /// Show the line number
    #[arg(short = 'l', long)]
    line: bool,

    /// Show the offending line of code
    #[arg(short = 'c', long)]
    code: bool,

    /// Show every frame of the traceback
    #[arg(short = 'T', long)]
    trace: bool,

    /// Show only the frames from the script itself
    #[arg(short = 'i', long)]
    inner: bool,

    /// Show local variables
    #[arg(short = 'L', long)]
    locals: bool,

    /// Look up related questions online
    #[arg(short = 'S', long)]
    search: bool,

    /// Write the script's output and the report to FILE (must end in .txt)
    #[arg(short = 'o', long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Re-run the most recent script with the same options
    #[arg(short = 'r', long, conflicts_with = "script")]
    recent: bool,

    /// Print version
    #[arg(short = 'v', long, conflicts_with_all = ["script", "recent"])]
    version: bool,

    /// Python interpreter to run the script with
    #[arg(long, value_name = "PATH")]
    python: Option<PathBuf>,

    /// When to colour the report
    #[arg(long, value_name = "WHEN")]
    color: Option<ColorChoice>,

    /// Python script to run
    #[arg(required_unless_present_any = ["version", "recent"])]
    script: Option<PathBuf>,

    /// Arguments passed to the script
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

impl Cli {
    fn mode_flags(&self) -> ModeFlags {
        ModeFlags {
            r#type: self.kind,
            message: self.message,
            file: self.file,
            scope: self.scope,
            line: self.line,
            code: self.code,
            trace: self.trace,
            inner: self.inner,
            locals: self.locals,
            search: self.search,
        }
    }
}

fn main() {
    // Logs go to stderr; stdout carries the script's output and the report
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "faultline=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Ctrl-C reaches the script too; faultline waits for it and reports
    // the KeyboardInterrupt like any other fault.
    if let Err(e) = ctrlc::set_handler(|| {}) {
        tracing::warn!("Failed to install interrupt handler: {}", e);
    }

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            std::process::exit(if e.use_stderr() { 1 } else { 0 });
        }
    };

    let code = match dispatch(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            1
        }
    };
    std::process::exit(code);
}

fn dispatch(cli: Cli) -> anyhow::Result<i32> {
    if cli.version {
        println!("faultline {}", env!("CARGO_PKG_VERSION"));
        return Ok(0);
    }

    let settings = commands::Settings::resolve(cli.python.clone(), cli.color)?;

    if cli.recent {
        return commands::recent::execute(&settings, cli.output.as_deref());
    }

    let Some(script) = cli.script.clone() else {
        anyhow::bail!("No script given");
    };

    if cli.syntax {
        return commands::syntax::execute(&settings, &script);
    }

    commands::run::execute(commands::run::RunArgs {
        flags: cli.mode_flags(),
        script,
        args: cli.args,
        output: cli.output,
        settings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_map_onto_modes() {
        let cli = Cli::try_parse_from(["faultline", "-t", "-L", "-T", "job.py"]).unwrap();
        let flags = cli.mode_flags();
        assert!(flags.r#type && flags.locals && flags.trace);
        assert!(!flags.inner && !flags.search);
    }

    #[test]
    fn test_script_args_are_passed_through() {
        let cli = Cli::try_parse_from(["faultline", "-i", "job.py", "in.csv", "-x", "--n"]).unwrap();
        assert_eq!(cli.script, Some(PathBuf::from("job.py")));
        assert_eq!(cli.args, vec!["in.csv", "-x", "--n"]);
        assert!(!cli.syntax);
    }

    #[test]
    fn test_script_is_required() {
        assert!(Cli::try_parse_from(["faultline", "-t"]).is_err());
    }

    #[test]
    fn test_version_and_recent_stand_alone() {
        assert!(Cli::try_parse_from(["faultline", "-v"]).is_ok());
        assert!(Cli::try_parse_from(["faultline", "-r"]).is_ok());
        assert!(Cli::try_parse_from(["faultline", "-v", "job.py"]).is_err());
        assert!(Cli::try_parse_from(["faultline", "-r", "job.py"]).is_err());
        assert!(Cli::try_parse_from(["faultline", "-v", "-r"]).is_err());
    }

    #[test]
    fn test_color_choice_parses() {
        let cli = Cli::try_parse_from(["faultline", "--color", "never", "job.py"]).unwrap();
        assert_eq!(cli.color, Some(ColorChoice::Never));
    }
}
