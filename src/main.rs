use clap::{
    CommandFactory, Parser, Subcommand,
    builder::{
        Styles,
        styling::{AnsiColor, Effects},
    },
};
use clap_complete::{Shell, generate};

use spotify_chat_relay::{config, error, info, logging, server, success, warning};

fn styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::White.on_default() | Effects::BOLD)
        .usage(AnsiColor::White.on_default() | Effects::BOLD)
        .literal(AnsiColor::BrightBlue.on_default())
        .placeholder(AnsiColor::BrightGreen.on_default())
}

#[derive(Parser, Debug, Clone)]
#[clap(
  version = env!("CARGO_PKG_VERSION"),
  name=env!("CARGO_PKG_NAME"),
  bin_name=env!("CARGO_PKG_NAME"),
  about=env!("CARGO_PKG_DESCRIPTION"),
  styles=styles(),
)]
struct Cli {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run the relay server
    Serve(ServeOptions),

    /// Get shell completions
    Completions(CompletionsOption),
}

#[derive(Parser, Debug, Clone)]
pub struct ServeOptions {
    /// Address to bind, overrides SERVER_ADDRESS (e.g. 0.0.0.0:8080)
    #[clap(long)]
    pub addr: Option<String>,

    /// Open the login page in the default browser once the server is up
    #[clap(long)]
    pub open_login: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct CompletionsOption {
    shell: Shell,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    match cli.command {
        Command::Serve(opt) => serve(opt).await,
        Command::Completions(opt) => {
            let mut cmd = Cli::command_for_update();
            let name = cmd.get_name().to_string();
            generate(opt.shell, &mut cmd, name, &mut std::io::stdout())
        }
    }
}

async fn serve(opt: ServeOptions) {
    let loaded = config::load_env();
    logging::init_tracing();
    for path in &loaded {
        tracing::debug!(path = %path.display(), "loaded environment file");
    }

    let mut config = match config::Config::from_env() {
        Ok(config) => config,
        Err(e) => error!("Cannot load configuration. Err: {}", e),
    };
    if let Some(addr) = opt.addr {
        config.server_address = addr;
    }

    if config.state_secret_ephemeral {
        warning!("OAUTH_STATE_SECRET not set, using an ephemeral secret for this process");
    }
    if config.llm_api_key.is_none() {
        warning!("LLM_API_KEY not set, /chat and /chat/test will fail");
    }

    let login_url = format!("http://{}/auth/login", config.server_address);
    info!("Starting relay on {}", config.server_address);
    info!("Log in at {}", login_url);

    if opt.open_login {
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(500)).await;
            if webbrowser::open(&login_url).is_err() {
                warning!(
                    "Failed to open browser. Please navigate to the following URL manually:\n{}",
                    login_url
                )
            }
        });
    }

    match server::start_api_server(config).await {
        Ok(()) => success!("Relay stopped"),
        Err(e) => error!("Server failed: {}", e),
    }
}
