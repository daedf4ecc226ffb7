use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "mesh-relay")]
#[command(about = "Relay between a radio mesh bridge and a chat gateway", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show version
    Version,

    /// Create the configuration directory and a config.json listing every default.
    Init {
        /// Config file path (default: MESH_RELAY_CONFIG_PATH or ~/.mesh-relay/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<std::path::PathBuf>,
    },

    /// Run the relay. Waits for the chat gateway to be ready, then serves /send-message, /receive-message and /health.
    Gateway {
        /// Config file path (default: MESH_RELAY_CONFIG_PATH or ~/.mesh-relay/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<std::path::PathBuf>,

        /// HTTP port (default from config or 8080)
        #[arg(long, short)]
        port: Option<u16>,
    },

    /// Post a command to a running relay as if it came from a mesh device, and print the reply.
    Send {
        /// Config file path (default: MESH_RELAY_CONFIG_PATH or ~/.mesh-relay/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<std::path::PathBuf>,

        /// Device id to send as.
        #[arg(long, default_value = "!cli")]
        from: String,

        /// Command text, e.g. `!wsp +56912345678 hola`.
        #[arg(required = true, num_args = 1..)]
        message: Vec<String>,
    },
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Version) => {
            println!("mesh-relay {}", env!("CARGO_PKG_VERSION"));
        }
        Some(Commands::Init { config }) => {
            if let Err(e) = run_init(config) {
                log::error!("init failed: {}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Gateway { config, port }) => {
            if let Err(e) = run_gateway(config, port).await {
                log::error!("gateway failed: {:#}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Send {
            config,
            from,
            message,
        }) => {
            if let Err(e) = run_send(config, from, message.join(" ")).await {
                log::error!("send failed: {:#}", e);
                std::process::exit(1);
            }
        }
        None => {
            println!("Run with --help for usage");
        }
    }
}

fn run_init(config_path: Option<std::path::PathBuf>) -> anyhow::Result<()> {
    let path = config_path.unwrap_or_else(lib::config::default_config_path);
    let dir = lib::init::init_config_dir(&path)?;
    println!("initialized configuration at {}", dir.display());
    Ok(())
}

async fn run_gateway(
    config_path: Option<std::path::PathBuf>,
    port: Option<u16>,
) -> anyhow::Result<()> {
    let (mut config, path) = lib::config::load_config(config_path)?;
    if let Some(p) = port {
        config.gateway.port = p;
    }
    log::info!(
        "starting gateway on {}:{} (config {})",
        config.gateway.bind,
        config.gateway.port,
        path.display()
    );
    lib::gateway::run_gateway(config).await
}

async fn run_send(
    config_path: Option<std::path::PathBuf>,
    from: String,
    message: String,
) -> anyhow::Result<()> {
    let (config, _) = lib::config::load_config(config_path)?;
    let bind = config.gateway.bind.trim();
    let host = if bind == "0.0.0.0" { "127.0.0.1" } else { bind };
    let url = format!("http://{}:{}/send-message", host, config.gateway.port);
    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0);
    let body = serde_json::json!({
        "from": from,
        "message": message,
        "timestamp": timestamp,
    });
    let res = reqwest::Client::new().post(&url).json(&body).send().await?;
    let status = res.status();
    let text = res.text().await.unwrap_or_default();
    if status.is_success() {
        println!("< {}", text.trim());
        Ok(())
    } else {
        anyhow::bail!("{} {}", status, text.trim())
    }
}
