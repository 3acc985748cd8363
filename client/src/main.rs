use clap::Parser;
use client::config::ClientConfig;
use client::console;
use client::error::ClientError;
use client::network::Client;
use log::{error, info};
use shared::{DEFAULT_TIMER_SECONDS, RESOLUTION_PHASE_SECS};
use tokio::io::BufReader;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server address (http(s)://, ws(s):// or a bare host)
    #[arg(short = 's', long, default_value = "localhost:8000")]
    server: String,

    /// Room to join or create
    #[arg(short = 'r', long)]
    room: String,

    /// Display name
    #[arg(short = 'n', long)]
    name: String,

    /// Typing timer in seconds, used when this join creates the room
    #[arg(short = 't', long, default_value_t = DEFAULT_TIMER_SECONDS)]
    timer: u32,

    /// Resolution phase length in seconds; must match the server
    #[arg(long, default_value_t = RESOLUTION_PHASE_SECS)]
    resolution_secs: f64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();
    let config = ClientConfig::default().with_resolution_secs(args.resolution_secs);

    info!("Starting client...");
    let mut client = match Client::new(&args.server, config).await {
        Ok(client) => client,
        Err(e) => {
            error!("{}", e);
            eprintln!("Could not join: {}", e);
            return Err(e.into());
        }
    };

    println!("{}", console::HELP);
    client.join(&args.room, &args.name, args.timer).await;

    match client.run(BufReader::new(tokio::io::stdin())).await {
        Ok(()) => Ok(()),
        Err(ClientError::ConnectionLost) => {
            eprintln!("Connection lost. Restart the client to play again.");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}
