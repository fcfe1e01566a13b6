/*!
# RF Transmitter Application

Transmits 24-bit codes through a 433 MHz on-off-keyed RF module connected to
a GPIO pin.

## Usage

### Send one code
```bash
rftransmitter --config rftransmitter.toml transmit --code 1361
```

### Serve JSON commands over UDP
```bash
rftransmitter serve --port 4330
echo '{"command": "transmit", "code": 1361}' | nc -u -w1 127.0.0.1 4330
```

### Inspect a frame without hardware
```bash
rftransmitter render --code 5
```
*/

use clap::{Parser, Subcommand};
use shared::protocol::{DEFAULT_PULSE_LENGTH_US, TX_REPEAT};
use shared::{Code, Symbol};
use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::time::Duration;
use tracing::Level;

use rftransmitter::config::AppConfig;
use rftransmitter::error::BoxError;
use rftransmitter::server::CommandServer;

#[derive(Parser)]
#[command(name = "rftransmitter")]
#[command(about = "433 MHz on-off-keyed RF code transmitter")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, default_value = "rftransmitter.toml")]
    config: PathBuf,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Transmit a code once
    Transmit {
        /// Code to send (0..=16777215)
        #[arg(short = 'n', long)]
        code: Code,
    },

    /// Print the frame and pulse timing for a code without touching hardware
    Render {
        /// Code to render (0..=16777215)
        #[arg(short = 'n', long)]
        code: Code,

        /// Pulse length in microseconds
        #[arg(short, long, default_value_t = DEFAULT_PULSE_LENGTH_US)]
        pulse_length: u64,
    },

    /// Serve JSON commands over UDP
    Serve {
        /// UDP bind address (overrides the config file)
        #[arg(short, long)]
        bind_addr: Option<String>,

        /// UDP port to listen on (overrides the config file)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// List the pins of a board
    Pins {
        /// Board name (defaults to the configured board)
        #[arg(short, long)]
        board: Option<String>,
    },

    /// Generate configuration file
    Config {
        /// Output path for configuration file
        #[arg(short, long, default_value = "rftransmitter.toml")]
        output: PathBuf,
    },
}

fn main() -> Result<(), BoxError> {
    let cli = Cli::parse();

    // Initialize logging to stderr to keep stdout for command output
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::INFO })
        .init();

    match cli.command {
        Commands::Transmit { code } => run_transmit(cli.config, code),
        Commands::Render { code, pulse_length } => render_frame(code, pulse_length),
        Commands::Serve { bind_addr, port } => run_server(cli.config, bind_addr, port),
        Commands::Pins { board } => list_pins(cli.config, board),
        Commands::Config { output } => generate_config_file(output),
    }
}

/// Build the transmitter from config and send one code
fn run_transmit(config_path: PathBuf, code: Code) -> Result<(), BoxError> {
    let config = AppConfig::load_from_file(&config_path)?;
    let transmitter = config.build_transmitter()?;

    // Set up Ctrl+C handler
    let cancel = transmitter.cancel_token();
    ctrlc::set_handler(move || {
        eprintln!("\n🛑 Received Ctrl+C, cancelling transmission...");
        cancel.cancel();
    })?;

    let report = transmitter.transmit(code)?;
    println!(
        "✅ Sent code {} ({}) x{} in {:?}",
        report.code, report.binary, report.repetitions, report.elapsed
    );
    Ok(())
}

/// Print the symbol sequence and pulse timing of one repetition
fn render_frame(code: Code, pulse_length: u64) -> Result<(), BoxError> {
    if pulse_length == 0 {
        return Err("pulse length must be positive".into());
    }
    let pulse = Duration::from_micros(pulse_length);

    println!("Code:    {}", code);
    println!("Binary:  {}", code.render());
    println!("Repeats: {}", TX_REPEAT);
    println!();

    for symbol in [Symbol::Zero, Symbol::One, Symbol::Sync] {
        let ratio = symbol.ratio();
        println!(
            "{:<5} high {:>6}us  low {:>6}us",
            symbol,
            (pulse * ratio.high_units).as_micros(),
            (pulse * ratio.low_units).as_micros()
        );
    }

    let frame: Vec<String> = code.frame().map(|s| s.to_string()).collect();
    let units: u32 = code.frame().map(|s| s.ratio().total_units()).sum();
    println!();
    println!("Frame:   {}", frame.join(" "));
    println!(
        "Airtime: {:?} per repetition, {:?} total",
        pulse * units,
        pulse * units * TX_REPEAT as u32
    );
    Ok(())
}

/// Serve UDP commands until Ctrl+C
fn run_server(
    config_path: PathBuf,
    bind_addr: Option<String>,
    port: Option<u16>,
) -> Result<(), BoxError> {
    let config = AppConfig::load_from_file(&config_path)?;
    let transmitter = config.build_transmitter()?;

    let bind_addr = bind_addr.unwrap_or(config.server.bind_addr);
    let port = port.unwrap_or(config.server.port);
    let server = CommandServer::bind(&bind_addr, port, config.server.queue_depth)?;
    println!("🚀 Listening for commands on {}", server.local_addr()?);

    // Set up Ctrl+C handler
    let running = server.get_running_flag();
    let cancel = transmitter.cancel_token();
    ctrlc::set_handler(move || {
        eprintln!("\n🛑 Received Ctrl+C, shutting down gracefully...");
        running.store(false, Ordering::SeqCst);
        cancel.cancel();
    })?;

    if let Err(e) = server.run(transmitter) {
        eprintln!("Command server failed: {}", e);
        return Err(format!("Command server failed: {}", e).into());
    }

    println!("✅ Command server stopped");
    Ok(())
}

/// Print the pin table of a board
fn list_pins(config_path: PathBuf, board: Option<String>) -> Result<(), BoxError> {
    let config = AppConfig::load_from_file(&config_path).unwrap_or_else(|_| {
        eprintln!("⚠️ Failed to load config, using defaults");
        AppConfig::new()
    });
    let registry = config.board_registry();
    let name = board.unwrap_or(config.transmitter.board);
    let board = registry.lookup(&name)?;

    println!("Board {}:", board.name());
    for pin in board.pin_names() {
        let mapping = board.gpio_mapping(&pin);
        println!("  {:<8} {} line {}", pin, mapping.chip, mapping.line);
    }
    Ok(())
}

/// Generate a default configuration file
fn generate_config_file(output_path: PathBuf) -> Result<(), BoxError> {
    let config = AppConfig::new();
    config.save_to_file(&output_path)?;

    println!("✅ Generated configuration file: {}", output_path.display());
    println!("📝 Edit the file to customize settings, then run:");
    println!("   rftransmitter --config {} transmit --code <CODE>", output_path.display());

    Ok(())
}
