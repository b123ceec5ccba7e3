use std::{net::SocketAddr, path::Path, sync::Arc};

use axum::{
    Router,
    extract::{ConnectInfo, Request},
    routing::any,
};
use clap::Parser;
use color_eyre::{Result, eyre::Context};
use synapse::{
    adapters::{AmqpPublisher, HttpClientAdapter, HttpHandler, RegistryDiscovery},
    config::{GatewayConfigValidator, load_config},
    core::GatewayService,
    tracing_setup,
};
use tower_http::trace::TraceLayer;

#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    #[clap(subcommand)]
    command: Option<Commands>,

    /// Configuration file (optional; environment variables alone suffice)
    #[clap(short, long)]
    config: Option<String>,
}

#[derive(Parser, Debug)]
enum Commands {
    /// Validate configuration and exit
    Validate {
        #[clap(short, long)]
        config: Option<String>,
    },
    /// Initialize a new configuration file
    Init {
        #[clap(short, long, default_value = "gateway.toml")]
        config: String,
    },
    /// Start the gateway server (default)
    Serve {
        #[clap(short, long)]
        config: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let args = Args::parse();

    match args.command {
        Some(Commands::Validate { config }) => {
            return validate_config_command(config.as_deref()).await;
        }
        Some(Commands::Init { config }) => {
            return init_config_command(&config).await;
        }
        Some(Commands::Serve { config }) => serve(config.or(args.config)).await,
        None => serve(args.config).await,
    }
}

async fn serve(config_path: Option<String>) -> Result<()> {
    tracing_setup::init_tracing();

    let config = load_config(config_path.as_deref())
        .await
        .context("Failed to load configuration")?;
    GatewayConfigValidator::validate(&config).context("Invalid configuration")?;

    let discovery = Arc::new(
        RegistryDiscovery::new(&config.registry_url)
            .context("Failed to create registry client")?,
    );
    discovery
        .probe()
        .await
        .context("Service registry must be reachable at startup")?;

    let publisher = Arc::new(
        AmqpPublisher::connect(&config.broker_url)
            .await
            .context("Message broker must be reachable at startup")?,
    );

    let http_client = Arc::new(HttpClientAdapter::new(config.forward_timeout_secs));
    let gateway = Arc::new(
        GatewayService::new(&config, discovery, http_client)
            .context("Failed to build gateway service")?,
    );

    for rule in gateway.routes().rules() {
        tracing::info!(
            prefix = %rule.prefix,
            service = %rule.service,
            require_auth = rule.require_auth,
            "configured route"
        );
    }

    let handler = HttpHandler::new(gateway, publisher);

    let make_request_route = |handler: HttpHandler| {
        any(
            move |ConnectInfo(client_addr): ConnectInfo<SocketAddr>, req: Request| {
                let handler = handler.clone();
                async move { handler.handle_request(req, Some(client_addr)).await }
            },
        )
    };

    let app = Router::new()
        .route("/{*path}", make_request_route(handler.clone()))
        .route("/", make_request_route(handler))
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = config
        .listen_addr
        .parse()
        .context("Failed to parse listen address")?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;

    tracing::info!(listen_addr = %addr, routes = config.routes.len(), "gateway listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("Server error")?;

    tracing::info!("shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => tracing::error!(error = %e, "failed to install SIGTERM handler"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("received ctrl-c, shutting down"),
        () = terminate => tracing::info!("received SIGTERM, shutting down"),
    }
}

/// Validate configuration and exit
async fn validate_config_command(config_path: Option<&str>) -> Result<()> {
    if let Some(path) = config_path {
        println!("Validating configuration file: {path}");
        if !Path::new(path).exists() {
            eprintln!("Error: configuration file '{path}' not found");
            std::process::exit(1);
        }
    } else {
        println!("Validating configuration from environment");
    }

    let config = match load_config(config_path).await {
        Ok(config) => {
            println!("Configuration parsing: OK");
            config
        }
        Err(e) => {
            eprintln!("Configuration parsing failed:");
            eprintln!("   {e}");
            std::process::exit(1);
        }
    };

    match GatewayConfigValidator::validate(&config) {
        Ok(()) => {
            println!("Configuration validation: OK");
            println!();
            println!("Summary:");
            println!("   Listen address: {}", config.listen_addr);
            println!("   Registry:       {}", config.registry_url);
            println!("   Broker:         {}", config.broker_url);
            println!("   Routes:         {}", config.routes.len());
            println!(
                "   Rate limit:     {} requests per {}",
                config.rate_limit.requests, config.rate_limit.period
            );
            Ok(())
        }
        Err(e) => {
            eprintln!("Configuration validation failed:");
            eprintln!("{e}");
            std::process::exit(1);
        }
    }
}

/// Initialize a new configuration file
async fn init_config_command(config_path: &str) -> Result<()> {
    let path = Path::new(config_path);
    if path.exists() {
        eprintln!("Error: configuration file '{config_path}' already exists");
        std::process::exit(1);
    }

    let default_config = r#"# Synapse API Gateway Configuration

# The address to listen on
listen_addr = "127.0.0.1:3000"

# Service registry catalog endpoint; services are resolved as GET <url>/<name>
registry_url = "http://localhost:8500/v1/catalog/service"

# Message broker for the /publish endpoint
broker_url = "amqp://localhost:5672/%2f"

# Shared secret for verifying bearer tokens on gated routes
jwt_secret = "change-me"

# Per-request forwarding deadline
forward_timeout_secs = 30

[rate_limit]
requests = 100
period = "15m"
api_key_header = "x-api-key"

[[routes]]
prefix = "/auth"
service = "auth-service"

[[routes]]
prefix = "/users"
service = "user-service"
require_auth = true
"#;

    tokio::fs::write(path, default_config)
        .await
        .context("Failed to write config file")?;
    println!("Created default configuration at: {config_path}");
    println!("   Run 'synapse serve --config {config_path}' to start the gateway");
    Ok(())
}
