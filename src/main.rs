mod cli;

use remuxd::{command, config, ledger, pipeline, probe, proxy, remote};

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use std::sync::Arc;

async fn run_service(config_path: Option<&std::path::Path>, once: bool) -> Result<()> {
    let mut config = config::load_config_or_default(config_path)?;
    if once {
        config.pipeline.continuous = false;
    }

    tracing::info!("Starting remuxd");
    tracing::info!(
        "Workers: {}, batch size: {}, continuous: {}",
        config.pipeline.workers,
        config.pipeline.batch_size,
        config.pipeline.continuous
    );

    std::fs::create_dir_all(&config.pipeline.temp_dir)?;

    let proxies = proxy::ProxyPool::from_file(&config.proxy.file);

    let db_path = config.store.path.to_string_lossy().to_string();
    tracing::info!("Opening work ledger at {db_path}");
    let pool = ledger::init_pool(&db_path)?;

    let client = remote::RemoteHostClient::new(&config.remote, Arc::new(proxies));

    let ctx = Arc::new(pipeline::PipelineContext {
        config,
        client,
        pool,
    });

    tokio::select! {
        result = pipeline::run(ctx) => Ok(result?),
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received, stopping");
            Ok(())
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on
    // the verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "remuxd=trace,reqwest=debug".to_string()
        } else {
            "remuxd=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .init();

    match cli.command {
        Commands::Run { once } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(run_service(cli.config.as_deref(), once))
        }
        Commands::Probe { file, json } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(probe_file(&file, cli.config.as_deref(), json))
        }
        Commands::CheckTools => check_tools(cli.config.as_deref()),
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("remuxd {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

async fn probe_file(
    file: &std::path::Path,
    config_path: Option<&std::path::Path>,
    json: bool,
) -> Result<()> {
    if !file.exists() {
        anyhow::bail!("File does not exist: {:?}", file);
    }

    let config = config::load_config_or_default(config_path)?;
    let info = probe::probe(file, &config.tools).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    println!("File: {}", file.display());
    println!("Container: {}", info.container);
    println!("Streams: {}", info.streams.len());

    for (i, stream) in info.streams.iter().enumerate() {
        print!("  [{}] {:?} {}", i, stream.kind, stream.codec);
        if let Some(ref lang) = stream.language {
            print!(" ({lang})");
        }
        if let Some(channels) = stream.channels {
            print!(", {channels} ch");
        }
        if let Some(ref title) = stream.title {
            print!(" - {title}");
        }
        println!();
    }

    Ok(())
}

fn check_tools(config_path: Option<&std::path::Path>) -> Result<()> {
    println!("Checking external tools...\n");

    let config = config::load_config_or_default(config_path)?;
    let tools = command::check_tools(&config.tools);
    let mut all_ok = true;

    for tool in &tools {
        let status = if tool.available {
            "✓"
        } else {
            all_ok = false;
            "✗"
        };

        print!("{} {}", status, tool.name);

        if let Some(ref version) = tool.version {
            print!(" ({})", version.lines().next().unwrap_or(""));
        }

        if let Some(ref path) = tool.path {
            print!(" - {}", path.display());
        }

        println!();
    }

    println!();
    if all_ok {
        println!("All required tools are available!");
    } else {
        println!("Some tools are missing. Install them to enable all features.");
    }

    Ok(())
}

fn validate_config(path: Option<&std::path::Path>) -> Result<()> {
    match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            println!("✓ Configuration is valid");
            println!("  Ledger: {:?}", config.store.path);
            println!("  Remote API: {}", config.remote.api_base);
            println!("  Workers: {}", config.pipeline.workers);
            println!("  Batch size: {}", config.pipeline.batch_size);
            println!("  Subtitle extraction: {}", config.pipeline.extract_subtitles);
            println!("  Multi-audio: {}", config.pipeline.multi_audio);
        }
        None => {
            println!("No config file specified, using defaults");
            let config = config::Config::default();
            println!("Default config:");
            println!("  Ledger: {:?}", config.store.path);
            println!("  Remote API: {}", config.remote.api_base);
        }
    }

    Ok(())
}
