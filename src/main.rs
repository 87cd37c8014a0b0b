//! Command-line interface for kafkacat-shim
//!
//! # Usage Examples
//!
//! ## Produce
//! ```bash
//! # Each stdin line becomes one message; "key:value" when --key-delim is set
//! kafkacat-shim --broker localhost:9092 --key-delim : \
//!   produce --topic events --partition 0
//! ```
//!
//! ## Consume
//! ```bash
//! kafkacat-shim --broker localhost:9092 \
//!   --operation-name audit --strict-errors \
//!   consume --group readers events orders
//! ```
//!
//! ## Processor
//! The processor is enabled by default and configured through
//! `--processor-address`, `--processor-auth-token` and
//! `--processor-service-name` (or `PROCESSOR_ADDRESS`, `PROCESSOR_AUTH_TOKEN`,
//! `PROCESSOR_SERVICE_NAME`). Pass `--enable-processor false` to bypass it.

use clap::Parser;
use kafkacat_shim::consume::{run_consumer, ConsumeArgs};
use kafkacat_shim::produce::{run_producer, ProduceArgs};
use kafkacat_shim::signal::spawn_signal_handler;
use kafkacat_shim::ShimOpts;
use tokio_util::sync::CancellationToken;

#[derive(Parser)]
#[command(name = "kafkacat-shim")]
#[command(about = "Minimal kafkacat clone that runs messages through a processing shim")]
#[command(long_about = None)]
struct Cli {
    /// Bootstrap broker(s)
    #[arg(long)]
    broker: String,

    /// Key and value delimiter (empty string = don't print/parse key)
    #[arg(long, default_value = "")]
    key_delim: String,

    /// Processing shim options
    #[command(flatten)]
    shim: ShimOpts,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Produce messages read from stdin
    Produce {
        /// Topic to produce to
        #[arg(long)]
        topic: String,

        /// Partition to produce to (-1 = any)
        #[arg(long, default_value_t = -1, allow_negative_numbers = true)]
        partition: i32,
    },

    /// Consume messages and print them to stdout
    Consume {
        /// Consumer group
        #[arg(long)]
        group: String,

        /// Topic(s) to subscribe to
        #[arg(required = true)]
        topics: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = run().await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let cancel = CancellationToken::new();
    let signals = spawn_signal_handler(cancel.clone());

    let result = match cli.command {
        Commands::Produce { topic, partition } => {
            run_producer(
                ProduceArgs {
                    broker: cli.broker,
                    topic,
                    partition,
                    key_delim: cli.key_delim,
                    shim: cli.shim,
                },
                cancel.clone(),
            )
            .await
        }
        Commands::Consume { group, topics } => {
            run_consumer(
                ConsumeArgs {
                    broker: cli.broker,
                    group,
                    topics,
                    key_delim: cli.key_delim,
                    shim: cli.shim,
                },
                cancel.clone(),
            )
            .await
        }
    };

    // Release the signal task if we finished on our own (EOF)
    cancel.cancel();
    let _ = signals.await;

    result
}
