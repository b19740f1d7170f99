use anyhow::Context;
use clap::Parser;
use maven_source_finder::utils::{logger, validation::Validate};
use maven_source_finder::{CliArgs, MetadataFinder, ReqwestTransport};
use std::process::ExitCode;
use std::sync::Arc;

#[tokio::main]
async fn main() -> ExitCode {
    let args = CliArgs::parse();

    if args.json_logs {
        logger::init_json_logger(args.verbose);
    } else {
        logger::init_cli_logger(args.verbose);
    }

    match run(&args).await {
        Ok(Some(url)) => {
            println!("{}", url);
            ExitCode::SUCCESS
        }
        Ok(None) => {
            eprintln!("No source repository found for {}", args.dependency);
            ExitCode::from(2)
        }
        Err(e) => {
            tracing::error!("❌ Lookup failed: {:#}", e);
            eprintln!("❌ {:#}", e);
            if let Some(finder_error) = e.downcast_ref::<maven_source_finder::FinderError>() {
                eprintln!("💡 {}", finder_error.recovery_suggestion());
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(args: &CliArgs) -> anyhow::Result<Option<url::Url>> {
    args.validate()?;
    let config = args.load_config().context("loading configuration")?;
    if args.verbose {
        tracing::debug!("Registry: {}", args.registry.as_deref().unwrap_or(&config.default_registry_url));
    }

    let transport = Arc::new(ReqwestTransport::new(&config)?);
    let finder = MetadataFinder::new(args.dependency(), config.credential_set(), config, transport);

    let url = finder
        .source_url()
        .await
        .with_context(|| format!("resolving source for {}", args.dependency))?;
    Ok(url)
}
