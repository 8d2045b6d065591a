use clap::Parser;
use seo_audit::{Audit, RendererKind};

mod args;
use args::{Args, Command};

#[tokio::main]
async fn main() {
    // Initialize logging
    env_logger::init();

    // Parse command-line arguments
    let args = Args::parse();

    match args.command {
        Command::Audit {
            url,
            single_page,
            max_pages,
            concurrency,
            total_timeout,
            common,
        } => {
            let mut config = match common.load_config() {
                Ok(config) => config,
                Err(e) => {
                    ::log::error!("Failed to load configuration: {}", e);
                    std::process::exit(2);
                }
            };
            if let Some(max_pages) = max_pages {
                config.max_pages = max_pages;
            }
            if let Some(concurrency) = concurrency {
                config.max_concurrency = concurrency;
            }
            if total_timeout.is_some() {
                config.total_timeout_secs = total_timeout;
            }

            if config.renderer == RendererKind::WebDriver {
                eprintln!("Note: page analysis requires a WebDriver server (e.g., ChromeDriver).");
                eprintln!(
                    "Set WEBDRIVER_URL if not using {}, or pass --renderer static",
                    config.webdriver_url
                );
            }

            ::log::info!("Starting audit for URL: {}", url);

            let report = match Audit::new(url)
                .with_config(config)
                .single_page(single_page)
                .run()
                .await
            {
                Ok(report) => report,
                Err(e) => {
                    ::log::error!("Audit failed: {}", e);
                    eprintln!("{}", serde_json::json!({ "error": e.to_string() }));
                    std::process::exit(1);
                }
            };

            match serde_json::to_string_pretty(&report) {
                Ok(json) => println!("{}", json),
                Err(e) => {
                    ::log::error!("Failed to serialize report: {}", e);
                    std::process::exit(1);
                }
            }
        }
        Command::Serve { bind, common } => {
            let mut config = match common.load_config() {
                Ok(config) => config,
                Err(e) => {
                    ::log::error!("Failed to load configuration: {}", e);
                    std::process::exit(2);
                }
            };
            if let Some(bind) = bind {
                config.bind = bind;
            }

            if let Err(e) = seo_audit::server::serve(config).await {
                ::log::error!("Server error: {}", e);
                std::process::exit(1);
            }
        }
    }
}
