use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use mandarin_cantonese::server::build_router;
use mandarin_cantonese::source::MappingSource;
use mandarin_cantonese::{csv_handler, sheets_handler, Event, Handler, Loader};

#[derive(Parser)]
#[clap(version, about, long_about = None)]
struct Args {
    /// TOML file layered over the built-in defaults
    #[clap(short, long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,

    /// Read mapping tables from `<DIR>/<table>.csv` instead of the spreadsheet
    #[clap(long, value_name = "DIR", global = true)]
    mapping_dir: Option<String>,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the form and the converter over HTTP
    Serve {
        /// Listen address
        #[clap(long, default_value = "0.0.0.0:8080")]
        listen: String,
    },
    /// Handle one event read from a JSON file and print the response
    Invoke {
        /// Event JSON (`requestContext.http.method`, `body`, `isBase64Encoded`)
        #[clap(long, value_name = "PATH")]
        event: PathBuf,
    },
    /// Convert a UTF-8 text file and print the result
    Convert {
        /// Text to convert
        #[clap(value_name = "FILE")]
        input: PathBuf,
    },
}

fn init_tracing(debug: bool) {
    let default_level = if debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_level.into()))
        .with_writer(std::io::stderr)
        .init();
}

async fn run<S: MappingSource + 'static>(handler: Handler<S>, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Serve { listen } => {
            let app = build_router(Arc::new(handler));
            let listener = TcpListener::bind(&listen).await?;
            info!("listening on {}", listen);
            axum::serve(listener, app).await?;
        }
        Command::Invoke { event } => {
            let json = tokio::fs::read_to_string(&event).await?;
            let resp = handler.handle(Event::from_json(&json)?).await;
            println!("{}", serde_json::to_string(&resp)?);
        }
        Command::Convert { input } => {
            let text = tokio::fs::read_to_string(&input).await?;
            let converted = handler.convert_text(&text).await?;
            print!("{}", converted);
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut loader = Loader::new();
    if let Some(path) = &args.config {
        loader = loader.with_file(path);
    }
    loader = loader.with_environment();
    if let Some(dir) = args.mapping_dir {
        loader = loader.set_override("mapping_dir", dir)?;
    }
    let config = loader.build()?;
    init_tracing(config.debug);

    if config.uses_local_tables() {
        run(csv_handler(config)?, args.command).await
    } else {
        run(sheets_handler(config)?, args.command).await
    }
}
