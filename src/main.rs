// BLE scanner screen for the terminal

use anyhow::Context;
use clap::Parser;
use log::info;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;

use ble_view::bluetooth::BluerBinding;
use ble_view::command::{Command, Target};
use ble_view::config::{load_config, DEFAULT_CONFIG_PATH};
use ble_view::permissions::HostPermissions;
use ble_view::{BleBinding, PeripheralId, Screen};

#[derive(Parser)]
#[command(name = "ble-view")]
#[command(about = "Scan for BLE peripherals and connect to one")]
struct Cli {
    /// Configuration file (TOML, JSON or YAML)
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,
    /// Bluetooth adapter to use, e.g. hci0
    #[arg(short, long)]
    adapter: Option<String>,
    /// Start a scan as soon as the screen is up
    #[arg(short, long)]
    scan: bool,
    /// Print the screen as JSON instead of text
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let mut config = load_config(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;
    if let Some(adapter) = cli.adapter {
        config.bluetooth.adapter = Some(adapter);
    }
    info!("Configuration loaded");

    let binding = BluerBinding::new(config.bluetooth.adapter.as_deref())
        .await
        .context("Failed to open Bluetooth adapter")?;
    info!("BLE adapter ready: {}", binding.name());

    let mut screen = Screen::new(binding, config.screen_options());
    let mut discoveries = screen.mount(&HostPermissions).await;

    if cli.scan {
        screen.scan().await;
    }
    show(&screen, cli.json)?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match line.parse::<Command>() {
                    Ok(Command::Quit) => break,
                    Ok(command) => {
                        run(&mut screen, command).await;
                        show(&screen, cli.json)?;
                    }
                    Err(e) => println!("{}", e),
                }
            }
            Some(peripheral) = discoveries.recv() => {
                if screen.handle_discovery(peripheral) {
                    show(&screen, cli.json)?;
                }
            }
            _ = signal::ctrl_c() => break,
        }
    }

    screen.unmount(discoveries);
    info!("Shutting down...");

    Ok(())
}

async fn run<B: BleBinding>(screen: &mut Screen<B>, command: Command) {
    match command {
        Command::Scan => screen.scan().await,
        Command::Connect(target) => {
            let id = match target {
                Target::Row(index) => match screen.peripheral_at(index) {
                    Some(peripheral) => peripheral.id.clone(),
                    None => {
                        println!("No row {}", index);
                        return;
                    }
                },
                Target::Id(id) => PeripheralId::new(id),
            };
            screen.connect(&id).await;
        }
        Command::Disconnect => screen.disconnect().await,
        Command::List | Command::Quit => {}
    }
}

fn show<B: BleBinding>(screen: &Screen<B>, json: bool) -> anyhow::Result<()> {
    let view = screen.render();
    if json {
        println!("{}", serde_json::to_string(&view)?);
    } else {
        print!("{}", view);
    }
    Ok(())
}
