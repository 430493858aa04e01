use clap::Parser;
use post_aggregator::adapters::server;
use post_aggregator::utils::{logger, validation::Validate};
use post_aggregator::{
    Aggregator, AggregatorError, AggregatorSettings, CliConfig, ConfigProvider, HttpUpstream,
    Response, TomlConfig,
};
use std::sync::Arc;

/// 依 CLI 參數決定配置來源，並回傳服務綁定位址 (若有)
fn load_config(cli: &CliConfig) -> post_aggregator::Result<(Box<dyn ConfigProvider>, Option<String>)> {
    match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from {}", path.display());
            let ignored = cli.ignored_with_config_file();
            if !ignored.is_empty() {
                tracing::warn!(
                    "⚠️ Ignoring {} because --config was given",
                    ignored.join(", ")
                );
            }
            let toml = TomlConfig::from_file(path)?;
            toml.validate()?;
            let bind = cli.serve.clone().or_else(|| toml.bind().map(str::to_string));
            Ok((Box::new(toml), bind))
        }
        None => {
            cli.validate()?;
            Ok((Box::new(cli.clone()), cli.serve.clone()))
        }
    }
}

fn render(responses: &[Response], pretty: bool) -> post_aggregator::Result<String> {
    let output = if pretty {
        serde_json::to_string_pretty(responses)?
    } else {
        serde_json::to_string(responses)?
    };
    Ok(output)
}

fn report_failure(e: &AggregatorError) -> ! {
    tracing::error!("❌ {}", e);
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());
    std::process::exit(e.exit_code());
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = CliConfig::parse();

    // 初始化日誌
    if cli.json_logs {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting post-aggregator");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    let (config, bind) = match load_config(&cli) {
        Ok(loaded) => loaded,
        Err(e) => report_failure(&e),
    };

    let upstream = match HttpUpstream::from_config(&*config) {
        Ok(upstream) => upstream,
        Err(e) => report_failure(&e),
    };
    let settings = AggregatorSettings::from_config(&*config);
    tracing::info!(
        "Upstream {} | cache TTL {:?} | concurrency {} | policy {}",
        upstream.base_url(),
        settings.cache_ttl,
        settings.concurrency_limit,
        settings.failure_policy
    );

    let aggregator = Arc::new(Aggregator::new(upstream, settings));

    if let Some(bind) = bind {
        if let Err(e) = server::serve(aggregator, &bind).await {
            report_failure(&e);
        }
        return Ok(());
    }

    match aggregator.aggregate().await {
        Ok(responses) => {
            let output = match render(&responses, cli.pretty) {
                Ok(output) => output,
                Err(e) => report_failure(&e),
            };
            println!("{}", output);
            tracing::info!("✅ Aggregated {} posts", responses.len());
        }
        Err(e) => report_failure(&e),
    }

    Ok(())
}
