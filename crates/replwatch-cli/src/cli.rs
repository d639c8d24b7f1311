use clap::Parser;

/// Measure replication lag between a replica and its primary
#[derive(Debug, Parser)]
#[command(name = "replwatch")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Replica host to connect to and measure from
    #[arg(short = 'H', long)]
    pub host: String,

    /// Replica port
    #[arg(short, long)]
    pub port: u16,

    /// Seconds behind the primary before a WARNING
    #[arg(short, long)]
    pub warning: u64,

    /// Seconds behind the primary before a CRITICAL
    #[arg(short, long)]
    pub critical: u64,

    /// Path to configuration file
    #[arg(long, env = "REPLWATCH_CONFIG")]
    pub config: Option<String>,

    /// Log progress to stderr
    #[arg(short, long)]
    pub verbose: bool,

    /// Log every poll to stderr
    #[arg(long)]
    pub debug: bool,
}
