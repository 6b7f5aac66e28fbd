use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

fn about_message() -> String {
    format!(
        "Derives the workload selectors of a local process\nVersion: {}",
        env!("CARGO_PKG_VERSION")
    )
}

#[derive(Parser, Clone)]
#[clap(name = "workload-attestor", about = about_message(), version)]
pub struct Cli {
    /// TOML file with `discover_workload_path` and `workload_size_limit`
    #[clap(long, global = true)]
    pub config: Option<PathBuf>,

    /// Default log filter, overridden by RUST_LOG
    #[clap(long, global = true, default_value = "warn")]
    pub log_level: String,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Attest a process and print its selectors
    Attest(AttestArgs),

    /// Print the effective attestation configuration as JSON
    Config,
}

#[derive(Args, Debug, Clone)]
pub struct AttestArgs {
    /// Process to attest
    #[clap(long)]
    pub pid: u32,

    /// Emit `path` and `sha256` selectors
    #[clap(long)]
    pub discover_workload_path: bool,

    /// Override the digest size limit: negative unlimited, 0 disabled
    #[clap(long, allow_hyphen_values = true)]
    pub workload_size_limit: Option<i64>,

    /// Abort the attestation after this many milliseconds
    #[clap(long)]
    pub timeout_ms: Option<u64>,

    /// Print the selectors as a JSON array
    #[clap(long)]
    pub json: bool,
}
