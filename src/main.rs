use clap::{Parser, Subcommand};
use std::path::PathBuf;
use transit_stream::{Config, ConnectorProvisioner, ConnectorSpec, Error, Result, Runner};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

#[derive(Parser, Debug)]
#[command(name = "transit-stream")]
#[command(about = "Transit event producer and CDC pipeline provisioner", long_about = None)]
struct Args {
    #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
    config: PathBuf,

    #[arg(short, long, help = "Enable JSON output for logs")]
    json_logs: bool,

    #[arg(short, long, help = "Verbose logging")]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the simulation loop, publishing turnstile events until Ctrl-C
    Run,
    /// Idempotently provision the Kafka Connect CDC pipeline and exit
    ConfigureConnector,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(args.json_logs, args.verbose);

    info!("Starting transit-stream");
    info!("Loading configuration from {:?}", args.config);

    let config = match Config::from_file(&args.config) {
        Ok(cfg) => {
            info!("Configuration loaded successfully");
            cfg
        }
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(Error::Config(e));
        }
    };

    info!(
        kafka_brokers = ?config.kafka.brokers,
        schema_registry = %config.schema_registry.url,
        connect_url = %config.connect.url,
        topic = %config.simulation.topic,
        "Configuration summary"
    );

    match args.command {
        Command::Run => Runner::new(config).run().await,
        Command::ConfigureConnector => {
            let provisioner = ConnectorProvisioner::new(&config.connect.url);
            let spec = ConnectorSpec::jdbc_source(&config.connect);
            match provisioner.configure(&spec).await {
                Ok(()) => Ok(()),
                Err(e) => {
                    // Downstream ingestion depends on this pipeline; abort.
                    error!("Connector provisioning failed: {}", e);
                    Err(e)
                }
            }
        }
    }
}

fn init_logging(json: bool, verbose: bool) {
    let env_filter = if verbose {
        EnvFilter::new("transit_stream=debug,info")
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("transit_stream=info,warn"))
    };

    let fmt_layer = if json {
        tracing_subscriber::fmt::layer()
            .json()
            .flatten_event(true)
            .with_current_span(false)
            .with_span_list(false)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_thread_ids(false)
            .with_thread_names(false)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}
