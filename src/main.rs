mod cache;
mod chart;
mod config;
mod dashboard;
mod error;
mod models;
mod pipeline;
mod provider;
mod reshape;
mod server;
mod upload;
mod utils;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::warn;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::AppConfig;
use crate::dashboard::{Dashboard, RenderReply, RenderRequest};
use crate::models::SymbolMapping;
use crate::provider::YahooProvider;
use crate::upload::preview_file;

#[derive(Parser)]
#[command(name = "stock-dashboard", about = "Stock price dashboard", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the dashboard over HTTP
    Serve {
        /// Bind address (overrides config)
        #[arg(long, env = "STOCKDASH_HOST")]
        host: Option<String>,

        /// Port (overrides config)
        #[arg(short, long, env = "STOCKDASH_PORT")]
        port: Option<u16>,
    },

    /// Run a single render pass and print the table
    Render {
        /// Lookback window in days
        #[arg(short, long)]
        days: Option<u32>,

        /// Lower bound of the price axis
        #[arg(long)]
        ymin: Option<f64>,

        /// Upper bound of the price axis
        #[arg(long)]
        ymax: Option<f64>,

        /// Company to include (repeatable; default: all)
        #[arg(short, long = "company")]
        companies: Vec<String>,

        /// Also print the Vega-Lite chart spec
        #[arg(long)]
        json: bool,
    },

    /// List the company → ticker mapping
    Symbols,

    /// Preview a tab-delimited file as a table
    Preview {
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "stock_dashboard=info,warn",
        1 => "stock_dashboard=debug,info",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(fmt::layer().compact().with_target(false))
        .with(EnvFilter::new(filter))
        .init();

    let config = AppConfig::load()?;

    match cli.command {
        Command::Serve { host, port } => {
            let _t = utils::Timer::start("Dashboard server");
            let mut server_cfg = config.server.clone();
            if let Some(host) = host {
                server_cfg.host = host;
            }
            if let Some(port) = port {
                server_cfg.port = port;
            }

            let source = Arc::new(YahooProvider::new(&config.provider)?);
            let dashboard = Arc::new(Dashboard::new(source, config.dashboard.clone()));
            server::serve(dashboard, &server_cfg).await?;
        }

        Command::Render { days, ymin, ymax, companies, json } => {
            let source = Arc::new(YahooProvider::new(&config.provider)?);
            let dashboard = Dashboard::new(source, config.dashboard.clone());

            let defaults = dashboard.default_request();
            let req = RenderRequest {
                days: days.unwrap_or(defaults.days),
                price_range: (
                    ymin.unwrap_or(defaults.price_range.0),
                    ymax.unwrap_or(defaults.price_range.1),
                ),
                companies: if companies.is_empty() { defaults.companies } else { companies },
            };

            match RenderReply::from(dashboard.render(&req).await) {
                RenderReply::Ok(output) => {
                    let table = &output.table;
                    println!("─────────────────────────────────");
                    println!("  Stock Prices (USD) — last {} days", req.days);
                    println!("─────────────────────────────────");
                    print!("  {:<18}", "Date");
                    for row in &table.rows {
                        print!("{:>12}", row.name);
                    }
                    println!();
                    for (i, date) in table.columns.iter().enumerate() {
                        print!("  {:<18}", date);
                        for row in &table.rows {
                            print!("{:>12}", utils::fmt_price(row.values.get(i).copied().flatten()));
                        }
                        println!();
                    }
                    println!("─────────────────────────────────");
                    println!("  {} observations charted", output.long.len());

                    if json {
                        println!("{}", serde_json::to_string_pretty(&output.chart)?);
                    }
                }
                RenderReply::Error { message, .. } => {
                    eprintln!("{}", message);
                    std::process::exit(1);
                }
            }
        }

        Command::Symbols => {
            let mapping = SymbolMapping::default_universe();
            println!("{} companies:", mapping.len());
            for (name, symbol) in mapping.iter() {
                println!("  {:<12} {}", name, symbol);
            }
        }

        Command::Preview { file } => {
            let table = match preview_file(&file) {
                Ok(table) => table,
                Err(e) => {
                    warn!("Preview of {:?} failed: {}", file, e);
                    eprintln!("{}", e.user_message());
                    std::process::exit(1);
                }
            };
            println!("{}", table.headers.join("\t"));
            for row in &table.rows {
                println!("{}", row.join("\t"));
            }
            println!("({} rows)", table.rows.len());
        }
    }

    Ok(())
}
