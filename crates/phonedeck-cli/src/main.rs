//! Phonedeck CLI - console for the phone-agent control server.

use std::error::Error;

use clap::{Parser, Subcommand};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use phonedeck_client::{
    ClientError, PollingScheduler, RequestClient, SCREENSHOT_INTERVAL, StreamSession,
};
use phonedeck_core::{ConfigPatch, DeviceKind, LogBlock, RunEvent};

/// Phonedeck - drive and monitor a phone-agent control server
#[derive(Parser)]
#[command(name = "phonedeck")]
#[command(about = "Console for the phone-agent control server", long_about = None)]
#[command(version)]
struct Cli {
    /// Control server base URL
    #[arg(short, long, global = true, default_value = "http://127.0.0.1:5000")]
    server: String,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show or update the server's agent configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// List devices known to the server
    Devices,

    /// Connect the device bridge to a network address
    Connect {
        /// Device address (e.g. 192.168.1.20:5555)
        address: String,
    },

    /// Disconnect the device bridge
    Disconnect {
        /// Address to disconnect; omit to disconnect all
        address: Option<String>,
    },

    /// List applications the agent can drive
    Apps,

    /// Fetch the current device screenshot
    Screenshot {
        /// Keep refreshing every 3 seconds until Ctrl-C
        #[arg(long)]
        watch: bool,
    },

    /// Run a task and stream its log
    Run {
        /// Wait for the final answer instead of streaming
        #[arg(long)]
        one_shot: bool,

        /// Task description
        #[arg(required = true, trailing_var_arg = true)]
        task: Vec<String>,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Print the stored configuration
    Show,

    /// Update configuration fields
    Set {
        #[arg(long)]
        base_url: Option<String>,
        #[arg(long)]
        model: Option<String>,
        #[arg(long)]
        api_key: Option<String>,
        /// Device bridge: adb or hdc
        #[arg(long)]
        device_type: Option<DeviceKind>,
        #[arg(long)]
        device_id: Option<String>,
        #[arg(long)]
        max_steps: Option<u32>,
        #[arg(long)]
        lang: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    let default_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let client = RequestClient::new(&cli.server);

    match cli.command {
        Commands::Config { command } => match command {
            ConfigCommands::Show => {
                let config = client.config().await?;
                println!("{}", serde_json::to_string_pretty(&config)?);
            }
            ConfigCommands::Set {
                base_url,
                model,
                api_key,
                device_type,
                device_id,
                max_steps,
                lang,
            } => {
                let patch = ConfigPatch {
                    base_url,
                    model,
                    api_key,
                    device_type,
                    device_id,
                    max_steps,
                    lang,
                };
                let config = client.update_config(&patch).await?;
                println!("{}", serde_json::to_string_pretty(&config)?);
            }
        },
        Commands::Devices => {
            let devices = client.devices().await?;
            if devices.is_empty() {
                println!("no devices");
            }
            for device in devices {
                println!("{device}");
            }
        }
        Commands::Connect { address } => {
            println!("{}", client.connect_device(&address).await?);
        }
        Commands::Disconnect { address } => {
            println!("{}", client.disconnect_device(address.as_deref()).await?);
        }
        Commands::Apps => {
            for app in client.apps().await? {
                println!("{app}");
            }
        }
        Commands::Screenshot { watch } => {
            if watch {
                watch_screenshots(client).await?;
            } else {
                let frame = client.screenshot().await?;
                print_frame(&frame);
            }
        }
        Commands::Run { one_shot, task } => {
            let task = task.join(" ");
            if one_shot {
                println!("{}", client.run_once(&task).await?);
            } else {
                stream_run(&client, &task).await?;
            }
        }
    }

    Ok(())
}

/// Stream one run's log to stdout; exit status reflects how it ended.
async fn stream_run(client: &RequestClient, task: &str) -> Result<(), Box<dyn Error>> {
    let mut session = StreamSession::new(client);
    let mut events = session.start(task)?;

    while let Some(event) = events.recv().await {
        match event {
            RunEvent::Opened => {}
            RunEvent::Line(text) => print!("{}", LogBlock::Line(text).render()),
            RunEvent::Result(text) => print!("{}", LogBlock::Result(text).render()),
            RunEvent::Error(text) => print!("{}", LogBlock::Error(text).render()),
            RunEvent::Done => print!("{}", LogBlock::Done.render()),
            RunEvent::Retrying => warn!("run stream interrupted, retrying"),
            RunEvent::Closed(reason) => return Err(ClientError::StreamClosed(reason).into()),
        }
    }
    Ok(())
}

/// Poll screenshots on the fixed cadence until Ctrl-C.
async fn watch_screenshots(client: RequestClient) -> Result<(), Box<dyn Error>> {
    let mut poller = PollingScheduler::new(client);
    poller.set_enabled(true);

    let mut ticker = tokio::time::interval(SCREENSHOT_INTERVAL);
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            _ = ticker.tick() => {
                if let Some(frame) = poller.latest_frame() {
                    print_frame(&frame);
                }
            }
        }
    }

    poller.set_enabled(false);
    Ok(())
}

fn print_frame(frame: &phonedeck_core::ScreenshotFrame) {
    println!(
        "{} {} app={} sensitive={} ({} bytes)",
        frame.captured_at.format("%H:%M:%S"),
        frame.dimensions(),
        frame.current_app.as_deref().unwrap_or("-"),
        frame.is_sensitive,
        frame.image.len()
    );
}
