use clap::{ArgAction, Parser};
use json2pg::runner::{
    ConnectArgsBuilder, DEFAULT_HOST, DEFAULT_PORT, DEFAULT_USER, LoadArgs, run_load,
};
use std::io::Write;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Insert a JSON array of records into a PostgreSQL table",
    disable_help_flag = true
)]
struct Args {
    /// Postgres user
    #[arg(short = 'U', long = "user", default_value = DEFAULT_USER)]
    user: String,

    /// Postgres password
    #[arg(short = 'P', long, default_value = "")]
    password: String,

    /// Postgres host
    #[arg(short = 'h', long, default_value = DEFAULT_HOST)]
    host: String,

    /// Postgres port
    #[arg(short = 'p', long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Database name
    #[arg(short = 'd', long)]
    database: String,

    /// Table name
    #[arg(short = 't', long)]
    table: String,

    /// Input file name
    #[arg(short = 'f', long)]
    file: PathBuf,

    /// Ignore insert errors
    #[arg(
        long = "ignore-errors",
        num_args = 0..=1,
        require_equals = true,
        default_value_t = false,
        default_missing_value = "true",
        action = ArgAction::Set
    )]
    ignore_errors: bool,

    /// Quiet mode - only warnings and errors are logged
    #[arg(short, long)]
    quiet: bool,

    /// Print help
    #[arg(long, action = ArgAction::Help)]
    help: Option<bool>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse_from(cli::normalize_args(std::env::args_os()));

    // Logs go to stderr so stdout carries only the report
    use tracing_subscriber::{EnvFilter, FmtSubscriber};
    let default_filter = if args.quiet {
        "json2pg=warn,sqlx=off"
    } else {
        "json2pg=info,sqlx=off"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);

    let connection = ConnectArgsBuilder::default()
        .host(args.host)
        .port(args.port)
        .username(args.user)
        .password(args.password)
        .database(args.database)
        .build()?;

    let load_args = LoadArgs {
        connection,
        table: args.table,
        input_path: args.file,
        ignore_errors: args.ignore_errors,
    };

    let summary = run_load(load_args).await?;

    let mut stdout = std::io::stdout().lock();
    summary.write_report(&mut stdout)?;
    stdout.flush()?;

    if summary.has_errors() {
        std::process::exit(summary.exit_code());
    }

    Ok(())
}

/// CLI utility functions for parsing command-line arguments
mod cli {
    use std::ffi::OsString;

    /// Rewrite the single-dash `-ignore-errors[=bool]` form to its long-flag
    /// spelling so clap accepts it
    pub fn normalize_args(args: impl IntoIterator<Item = OsString>) -> Vec<OsString> {
        args.into_iter()
            .map(|arg| match arg.to_str() {
                Some(s) if s == "-ignore-errors" || s.starts_with("-ignore-errors=") => {
                    OsString::from(format!("-{}", s))
                }
                _ => arg,
            })
            .collect()
    }
}
