//! Binary entry point for the sharpdom CLI.
//!
//! Every command prints one JSON response on stdout; logs go to stderr.
//!
//! ## Usage
//!
//! ```bash
//! # Do two files say the same thing?
//! sharpdom compare Before.cs After.cs --annotations
//!
//! # Rebuild a file and check the result against the original model
//! sharpdom roundtrip Widget.cs
//!
//! # Declarations as a tree
//! sharpdom outline Widget.cs
//!
//! # Regenerate with two-space indentation
//! sharpdom --indent-width 2 format Widget.cs
//! ```

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;

use sharpdom::cli::{run_compare, run_format, run_outline, run_roundtrip};
use sharpdom::config::{CliOverrides, DomConfig, Newline};
use sharpdom::output::{emit_response, ErrorResponse};
use sharpdom::{DomError, OutputErrorCode};

// ============================================================================
// CLI Structure
// ============================================================================

/// Editable object model over C# source.
///
/// All output is JSON on stdout.
#[derive(Parser, Debug)]
#[command(name = "sharpdom", version, about = "Editable object model over C# source")]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,
    #[command(subcommand)]
    command: Command,
}

/// Global arguments shared by all subcommands.
#[derive(Parser, Debug)]
struct GlobalArgs {
    /// Configuration file (default: ./sharpdom.json if present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level for tracing output.
    #[arg(long, global = true, value_enum, default_value = "warn")]
    log_level: LogLevel,

    /// Write logs as JSON lines.
    #[arg(long, global = true)]
    log_json: bool,

    /// Spaces per indentation level in rebuilt text.
    #[arg(long, global = true)]
    indent_width: Option<usize>,

    /// Indent rebuilt text with tabs.
    #[arg(long, global = true)]
    use_tabs: bool,

    /// Line terminator for rebuilt text.
    #[arg(long, global = true, value_enum)]
    newline: Option<NewlineArg>,
}

/// Log level for tracing output.
#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    fn to_tracing_level(self) -> tracing::Level {
        match self {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum NewlineArg {
    Lf,
    Crlf,
}

impl From<NewlineArg> for Newline {
    fn from(arg: NewlineArg) -> Self {
        match arg {
            NewlineArg::Lf => Newline::Lf,
            NewlineArg::Crlf => Newline::Crlf,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Report whether two files have the same intent.
    Compare {
        left: PathBuf,
        right: PathBuf,
        /// Treat annotation differences as differences.
        #[arg(long)]
        annotations: bool,
    },
    /// Rebuild a file and compare the result with the original.
    Roundtrip { file: PathBuf },
    /// List the declarations of a file.
    Outline { file: PathBuf },
    /// Print a file regenerated from its model.
    Format { file: PathBuf },
}

// ============================================================================
// Main Entry Point
// ============================================================================

fn main() -> ExitCode {
    let cli = Cli::parse();

    init_tracing(cli.global.log_level, cli.global.log_json);

    match execute(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let error_code = OutputErrorCode::from(&err);
            let response = ErrorResponse::from_error(&err);

            // errors go to stdout as JSON too
            let _ = emit_response(&response, &mut io::stdout());
            let _ = io::stdout().flush();

            ExitCode::from(error_code.code())
        }
    }
}

/// Initialize tracing subscriber. `RUST_LOG` wins over `--log-level`.
fn init_tracing(level: LogLevel, json: bool) {
    use tracing_subscriber::fmt::format::FmtSpan;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_tracing_level().to_string()));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_span_events(FmtSpan::CLOSE)
        .with_target(false)
        .with_writer(io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn overrides(global: &GlobalArgs, include_annotations: Option<bool>) -> CliOverrides {
    CliOverrides {
        config_path: global.config.clone(),
        indent_width: global.indent_width,
        use_tabs: global.use_tabs.then_some(true),
        newline: global.newline.map(Newline::from),
        include_annotations,
    }
}

fn print<T: Serialize>(response: &T) -> Result<(), DomError> {
    let mut stdout = io::stdout();
    emit_response(response, &mut stdout)?;
    stdout.flush()?;
    Ok(())
}

/// Execute the CLI command.
fn execute(cli: Cli) -> Result<(), DomError> {
    match cli.command {
        Command::Compare {
            left,
            right,
            annotations,
        } => {
            let config = DomConfig::load(&overrides(&cli.global, annotations.then_some(true)))?;
            print(&run_compare(&left, &right, config.include_annotations.value)?)
        }
        Command::Roundtrip { file } => {
            let config = DomConfig::load(&overrides(&cli.global, None))?;
            print(&run_roundtrip(&file, &config)?)
        }
        Command::Outline { file } => {
            DomConfig::load(&overrides(&cli.global, None))?;
            print(&run_outline(&file)?)
        }
        Command::Format { file } => {
            let config = DomConfig::load(&overrides(&cli.global, None))?;
            print(&run_format(&file, &config)?)
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    mod cli_parsing {
        use super::*;

        #[test]
        fn compare_with_annotations() {
            let cli = Cli::try_parse_from(["sharpdom", "compare", "a.cs", "b.cs", "--annotations"]).unwrap();
            match cli.command {
                Command::Compare {
                    left,
                    right,
                    annotations,
                } => {
                    assert_eq!(left, PathBuf::from("a.cs"));
                    assert_eq!(right, PathBuf::from("b.cs"));
                    assert!(annotations);
                }
                _ => panic!("expected Compare"),
            }
        }

        #[test]
        fn global_flags_after_the_subcommand() {
            let cli = Cli::try_parse_from([
                "sharpdom",
                "format",
                "a.cs",
                "--indent-width",
                "2",
                "--use-tabs",
                "--newline",
                "crlf",
                "--log-level",
                "debug",
            ])
            .unwrap();
            assert_eq!(cli.global.indent_width, Some(2));
            assert!(cli.global.use_tabs);
            assert!(matches!(cli.global.log_level, LogLevel::Debug));
            let overrides = overrides(&cli.global, None);
            assert_eq!(overrides.newline, Some(Newline::Crlf));
            assert_eq!(overrides.use_tabs, Some(true));
        }

        #[test]
        fn unset_flags_do_not_override() {
            let cli = Cli::try_parse_from(["sharpdom", "outline", "a.cs"]).unwrap();
            let overrides = overrides(&cli.global, None);
            assert_eq!(overrides.indent_width, None);
            assert_eq!(overrides.use_tabs, None);
            assert!(matches!(cli.global.log_level, LogLevel::Warn));
        }

        #[test]
        fn missing_file_argument_is_an_error() {
            assert!(Cli::try_parse_from(["sharpdom", "roundtrip"]).is_err());
        }
    }
}
