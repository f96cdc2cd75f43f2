use anyhow::anyhow;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use valuesync::demo;
use valuesync::{init_logging, init_sync_bus, sync_bus, BusConfig, CalculatorGroup, Page};

/// Mount a page of calculator widgets and drive its sliders.
#[derive(Parser, Debug)]
#[command(name = "valuesync", version, about)]
struct Cli {
    /// Page configuration file (JSON or TOML).
    #[arg(short, long, env = "VALUESYNC_CONFIG")]
    config: Option<PathBuf>,

    /// Log as JSON lines.
    #[arg(long)]
    json: bool,

    /// Calculator group to drive.
    #[arg(short, long, default_value = valuesync::DEFAULT_GROUP)]
    group: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.json)?;
    tracing::info!(
        "ValueSync {} (built {})",
        valuesync::VERSION,
        valuesync::BUILD_DATE
    );

    let group = CalculatorGroup::new(cli.group)?;
    let config = demo::resolve_config(cli.config.as_deref(), &group)?;

    let bus_config = BusConfig::from(&config.bus);
    let settle = bus_config.announce_delay + bus_config.reconnect_delay;
    init_sync_bus(bus_config).map_err(|_| anyhow!("value sync bus already initialised"))?;

    let page = Page::mount(sync_bus(), &config);
    let frames = demo::run(&page, &group, &demo::DEFAULT_SCRIPT, settle).await;

    for frame in frames {
        match frame.change {
            Some(change) => println!("\n> {}", change),
            None => println!("> start"),
        }
        for view in frame.views {
            println!("  {}", view);
        }
    }

    page.unmount();
    Ok(())
}
