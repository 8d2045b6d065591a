use clap::{Parser, Subcommand, ValueEnum};
use seo_audit::{AuditConfig, RendererKind};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "seo-audit")]
#[command(about = "Audits the on-page and technical SEO signals of a website")]
#[command(version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Audit a site and print the report as JSON
    Audit {
        /// Site URL (must start with http:// or https://)
        url: String,

        /// Analyze only this URL and include best-practice findings
        #[arg(long)]
        single_page: bool,

        /// Maximum number of pages to discover and analyze
        #[arg(long)]
        max_pages: Option<usize>,

        /// Number of pages analyzed concurrently
        #[arg(short, long)]
        concurrency: Option<usize>,

        /// Total timeout in seconds (maximum runtime)
        #[arg(long)]
        total_timeout: Option<u64>,

        #[command(flatten)]
        common: CommonArgs,
    },

    /// Serve the audit over HTTP at POST /api/seo
    Serve {
        /// Address to listen on
        #[arg(long)]
        bind: Option<String>,

        #[command(flatten)]
        common: CommonArgs,
    },
}

#[derive(clap::Args, Debug)]
pub struct CommonArgs {
    /// JSON configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Rendering engine
    #[arg(long, value_enum)]
    pub renderer: Option<RendererArg>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum RendererArg {
    Webdriver,
    Static,
}

impl From<RendererArg> for RendererKind {
    fn from(arg: RendererArg) -> Self {
        match arg {
            RendererArg::Webdriver => RendererKind::WebDriver,
            RendererArg::Static => RendererKind::Static,
        }
    }
}

impl CommonArgs {
    /// Configuration file (or defaults), then `WEBDRIVER_URL`, then flags
    pub fn load_config(&self) -> Result<AuditConfig, Box<dyn std::error::Error>> {
        let mut config = match &self.config {
            Some(path) => AuditConfig::from_file(path)?,
            None => AuditConfig::default(),
        }
        .with_env_overrides();

        if let Some(renderer) = self.renderer {
            config.renderer = renderer.into();
        }
        Ok(config)
    }
}
