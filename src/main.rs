use anyhow::Context;
use convene::{
    AppState, ConfigManager, ConveneConfig,
    cli::{Cli, Commands, output::Output},
    research::{Frame, domains::DOMAINS},
    types::StartSessionRequest,
};
use futures::StreamExt;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse_args();
    let output = if cli.no_color {
        Output::no_color()
    } else {
        Output::new()
    };

    if let Commands::Config { full, validate } = cli.command() {
        return show_config(&cli, &output, *full, *validate);
    }

    let config_manager = match ConfigManager::new(&cli.config) {
        Ok(manager) => manager,
        Err(e) => {
            output.error(&format!("Failed to load {}: {}", cli.config.display(), e));
            std::process::exit(1);
        }
    };
    init_tracing(&config_manager.config(), cli.verbose);

    match cli.command() {
        Commands::Serve => serve(config_manager, &output).await,
        Commands::Run {
            topic,
            mode,
            participants,
            heartbeats,
        } => {
            let request = StartSessionRequest {
                topic: topic.clone(),
                mode: *mode,
                participants: *participants,
            };
            run_session(config_manager, request, *heartbeats, cli.verbose, &output).await
        }
        Commands::Domains => {
            output.header("Domains");
            output.table_header(&["Agent", "Domain", "Default tools"]);
            for domain in DOMAINS.iter() {
                output.table_row(&[
                    &domain.agent_name(),
                    domain.domain,
                    &domain.default_tools.join(", "),
                ]);
            }
            output.newline();
            Ok(())
        }
        Commands::Tools => {
            let state = AppState::from_config(config_manager).await?;
            output.header("Tools");
            output.table_header(&["Name", "Figure family"]);
            for name in state.registry.tool_names() {
                let family = state
                    .registry
                    .family_of(&name)
                    .map(|f| f.label())
                    .unwrap_or("-");
                output.table_row(&[&name, family]);
            }
            output.newline();
            Ok(())
        }
        Commands::Config { .. } => Ok(()),
    }
}

/// `RUST_LOG` wins, then `--verbose`, then `[server].log_level`.
fn init_tracing(config: &ConveneConfig, verbose: bool) {
    let fallback = if verbose {
        "debug".to_string()
    } else {
        format!("{},tower_http=info", config.server.log_level)
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    let json = config.server.log_format.eq_ignore_ascii_case("json");

    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr)))
        .with((!json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr)))
        .init();
}

async fn serve(config_manager: ConfigManager, output: &Output) -> anyhow::Result<()> {
    let config = config_manager.config();
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState::from_config(config_manager).await?;

    output.banner();
    output.kv("listening", &format!("http://{}", addr));
    output.kv("tools", &state.registry.tool_names().len().to_string());
    output.kv(
        "reasoning",
        config
            .reasoning
            .as_ref()
            .map(|r| r.provider.model())
            .unwrap_or("deterministic"),
    );
    #[cfg(feature = "swagger-ui")]
    output.kv("docs", &format!("http://{}/swagger-ui/", addr));
    if config.reasoning.is_none() {
        output.warning("No [reasoning] section: tools follow pool order and findings are rule-based");
    }
    output.info("Press Ctrl+C to stop");
    output.newline();

    let app = convene::api::routes::app(state);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    tracing::info!(%addr, "Server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("Server stopped");
    Ok(())
}

/// Stdout carries one JSON object per frame; `--verbose` adds readable lines on stderr.
async fn run_session(
    config_manager: ConfigManager,
    request: StartSessionRequest,
    heartbeats: bool,
    verbose: bool,
    output: &Output,
) -> anyhow::Result<()> {
    let state = AppState::from_config(config_manager).await?;
    let (session_id, frames) = state.start_session(&request)?;
    tracing::info!(%session_id, topic = %request.topic, "Running session");

    futures::pin_mut!(frames);
    while let Some(frame) = frames.next().await {
        match frame {
            Frame::Event(event) => {
                if verbose {
                    output.event_line(&event);
                }
                println!("{}", serde_json::to_string(&event)?);
            }
            Frame::Heartbeat if heartbeats => println!(r#"{{"heartbeat":true}}"#),
            Frame::Heartbeat => {}
        }
    }
    Ok(())
}

fn show_config(cli: &Cli, output: &Output, full: bool, validate: bool) -> anyhow::Result<()> {
    let config = match ConveneConfig::load_or_default(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            output.error(&format!("{}: {}", cli.config.display(), e));
            std::process::exit(1);
        }
    };

    if validate {
        output.success(&format!("{} is valid", cli.config.display()));
    }

    output.header("Configuration");
    output.kv("file", &cli.config.display().to_string());
    output.kv(
        "server",
        &format!("{}:{}", config.server.host, config.server.port),
    );
    output.kv(
        "session ceiling",
        &format!("{}s", config.session.duration_ceiling_secs),
    );
    output.kv("tools per agent", &config.session.tools_per_agent.to_string());
    output.kv(
        "agreement probability",
        &config.session.agreement_probability.to_string(),
    );
    match &config.reasoning {
        Some(reasoning) => output.kv("reasoning model", reasoning.provider.model()),
        None => output.kv("reasoning", "deterministic"),
    }

    if !config.tools.endpoints.is_empty() {
        output.subheader("Endpoint overrides");
        let mut endpoints: Vec<_> = config.tools.endpoints.iter().collect();
        endpoints.sort();
        for (tool, url) in endpoints {
            output.list_item(&format!("{} -> {}", tool, url));
        }
    }

    if full {
        output.subheader("Full configuration");
        println!("{}", toml::to_string_pretty(&config)?);
    } else if !validate {
        output.hint("Use --full to print every setting.");
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
