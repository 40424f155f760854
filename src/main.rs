use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ccl_core::host::mock::{MockHost, MockScript};
use ccl_core::{format_values, CclClient, ClientConfig, DetachedHost, HostBridge};

#[derive(Parser)]
#[command(name = "ccl")]
#[command(about = "Invoke CCL programs through the PowerChart XMLCclRequest bridge")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the argument string sent to XMLCclRequest for the given parameters
    Format {
        /// Parameters; JSON values (numbers, quoted strings, {"type","param"} objects) or bare text
        #[arg(allow_negative_numbers = true)]
        params: Vec<String>,
        /// Do not prepend the 'MINE' argument
        #[arg(long)]
        exclude_mine: bool,
    },
    /// Call a CCL program and print the response as JSON
    ///
    /// Outside PowerChart the call resolves with inPowerChart=false. Any --mock-* option
    /// replaces the host with a scripted one for local development.
    Call {
        /// CCL program name
        program: String,
        /// Parameters; JSON values (numbers, quoted strings, {"type","param"} objects) or bare text
        #[arg(allow_negative_numbers = true)]
        params: Vec<String>,
        /// Do not prepend the 'MINE' argument
        #[arg(long)]
        exclude_mine: bool,
        /// Status code the mock host completes with
        #[arg(long)]
        mock_status: Option<i32>,
        /// Status text the mock host completes with
        #[arg(long, default_value = "OK")]
        mock_status_text: String,
        /// Response text the mock host completes with
        #[arg(long)]
        mock_body: Option<String>,
        /// Make the mock host report a network error
        #[arg(long)]
        mock_network_error: bool,
    },
}

/// Entry point for the `ccl` developer tool
///
/// # Environment Variables
/// - `CCL_VERBOSITY`: diagnostic verbosity (none, error, warning, info, debug; default: none)
/// - `CCL_EXCLUDE_MINE`: omit the 'MINE' argument by default (default: false)
/// - `RUST_LOG`: additional `tracing` filter directives
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("ccl_core=debug".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = ClientConfig::from_env_values(
        std::env::var("CCL_VERBOSITY").ok(),
        std::env::var("CCL_EXCLUDE_MINE").ok(),
    )?;

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Format {
            params,
            exclude_mine,
        }) => {
            let values = parse_cli_params(&params);
            let exclude_mine = exclude_mine || config.exclude_mine();
            println!("{}", format_values(&values, exclude_mine)?);
        }
        Some(Commands::Call {
            program,
            params,
            exclude_mine,
            mock_status,
            mock_status_text,
            mock_body,
            mock_network_error,
        }) => {
            let values = parse_cli_params(&params);
            let exclude_mine = exclude_mine.then_some(true);

            if mock_status.is_some() || mock_body.is_some() || mock_network_error {
                let mut script = MockScript::new()
                    .status(mock_status.unwrap_or(200))
                    .status_text(mock_status_text)
                    .response_text(mock_body.unwrap_or_default());
                if mock_network_error {
                    script = script.network_error();
                }
                let client = CclClient::new(MockHost::new(script), config);
                call(&client, &program, &values, exclude_mine).await?;
            } else {
                let client = CclClient::new(DetachedHost, config);
                call(&client, &program, &values, exclude_mine).await?;
            }
        }
        None => {
            println!("Use 'ccl --help' for commands");
        }
    }

    Ok(())
}

/// Run one call and print the response.
async fn call<B: HostBridge>(
    client: &CclClient<B>,
    program: &str,
    values: &[Value],
    exclude_mine: Option<bool>,
) -> anyhow::Result<()> {
    tracing::debug!("calling {} with {} params", program, values.len());
    let res = client
        .request_values::<Value>(program, values, exclude_mine)
        .await?;
    println!("{}", serde_json::to_string_pretty(&res)?);
    Ok(())
}

/// Interpret each argument as JSON, falling back to a bare string.
fn parse_cli_params(params: &[String]) -> Vec<Value> {
    params
        .iter()
        .map(|raw| serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.clone())))
        .collect()
}
