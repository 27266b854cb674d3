use clap::{Args, Parser, Subcommand};
use enc_creds::commands;
use enc_creds::error::Result;
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "enc-creds")]
#[command(version)]
#[command(about = "Diff and merge encrypted credentials in git", long_about = None)]
struct Cli {
    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct EnrollFlags {
    /// Register this tool as git's diff/merge driver for credentials files
    #[arg(long, conflicts_with = "disenroll")]
    enroll: bool,

    /// Remove the registration made by --enroll
    #[arg(long)]
    disenroll: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a credentials file decrypted (used by git as textconv)
    Diff {
        #[command(flatten)]
        flags: EnrollFlags,

        /// Encrypted credentials file
        #[arg(
            required_unless_present_any = ["enroll", "disenroll"],
            conflicts_with_all = ["enroll", "disenroll"]
        )]
        path: Option<PathBuf>,

        /// Environment whose key to use (inferred from the path by default)
        #[arg(short, long)]
        environment: Option<String>,
    },

    /// Three-way merge of encrypted credentials (used by git as merge driver)
    Merge {
        #[command(flatten)]
        flags: EnrollFlags,

        /// Our version (%A); receives the result
        #[arg(
            required_unless_present_any = ["enroll", "disenroll"],
            conflicts_with_all = ["enroll", "disenroll"]
        )]
        ours: Option<PathBuf>,

        /// Common ancestor (%O)
        #[arg(required_unless_present_any = ["enroll", "disenroll"])]
        base: Option<PathBuf>,

        /// Their version (%B)
        #[arg(required_unless_present_any = ["enroll", "disenroll"])]
        theirs: Option<PathBuf>,

        /// Path of the file in the work tree (%P)
        #[arg(required_unless_present_any = ["enroll", "disenroll"])]
        real_path: Option<PathBuf>,
    },

    /// Print the decrypted credentials of an environment
    Show {
        /// Environment name (default environment if omitted)
        #[arg(short, long)]
        environment: Option<String>,
    },
}

fn main() {
    let cli = Cli::parse();

    // stdout carries textconv output, so logs go to stderr
    let filter = EnvFilter::try_from_env("ENC_CREDS_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("enc_creds=debug")
        } else {
            EnvFilter::new("enc_creds=warn")
        }
    });
    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .without_time(),
        )
        .init();

    match run(cli.command) {
        Ok(0) => {}
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

fn run(command: Commands) -> Result<i32> {
    match command {
        Commands::Diff { flags, .. } | Commands::Merge { flags, .. } if flags.enroll => {
            commands::enroll().map(|()| 0)
        }
        Commands::Diff { flags, .. } | Commands::Merge { flags, .. } if flags.disenroll => {
            commands::disenroll().map(|()| 0)
        }
        Commands::Diff {
            path: Some(path),
            environment,
            ..
        } => commands::diff(&path, environment.as_deref()).map(|()| 0),
        Commands::Merge {
            ours: Some(ours),
            base: Some(base),
            theirs: Some(theirs),
            real_path: Some(real_path),
            ..
        } => commands::merge(&ours, &base, &theirs, &real_path),
        Commands::Show { environment } => commands::show(environment.as_deref()).map(|()| 0),
        // clap rejects incomplete argument lists before we get here
        Commands::Diff { .. } | Commands::Merge { .. } => Err(enc_creds::CredsError::Other(
            "missing file arguments".into(),
        )),
    }
}
