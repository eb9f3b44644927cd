/*!
# lcdpipe

Pushes the lines it reads from standard input to a character LCD connected
via an LCD2USB interface. Lines are rendered round-robin over the display
rows, truncated at the display width and padded with spaces so a short or
empty line clears the remainder of its row.

## Usage

```bash
lcdpipe                          # 20x4 display, read stdin until EOF
lcdpipe --columns 16 --rows 4    # other geometries
lcdpipe --bus 3 --address 12     # pin discovery to one physical device
lcdpipe --brightness 180 --contrast 220
```

Logging goes to stderr; stdout is never written.
*/

use std::io::{self, BufRead};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::{info, warn};

mod usb;

use lcd2usb::diag::{run_echo_test, ECHO_TRIALS};
use lcd2usb::{firmware_version, Display, Geometry, ReconnectingTransport, Transport};
use usb::UsbOpener;

#[derive(Parser)]
#[command(name = "lcdpipe")]
#[command(about = "Pushes stdin lines to a character LCD connected via LCD2USB")]
#[command(version)]
struct Cli {
    /// Display width in characters
    #[arg(long, default_value_t = 20, value_parser = clap::value_parser!(u8).range(1..=40))]
    columns: u8,

    /// Display height in rows
    #[arg(long, default_value_t = 4, value_parser = clap::value_parser!(u8).range(1..=4))]
    rows: u8,

    /// Only scan the given USB bus number
    #[arg(long)]
    bus: Option<u8>,

    /// Only scan the given USB device address
    #[arg(long)]
    address: Option<u8>,

    /// Set the display contrast (0-255) at startup
    #[arg(long)]
    contrast: Option<u8>,

    /// Set the backlight brightness (0-255) at startup
    #[arg(long)]
    brightness: Option<u8>,

    /// Skip the startup echo self-test
    #[arg(long)]
    skip_echo: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Log to stderr; stdout stays clean
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .init();

    let opener = UsbOpener {
        bus: cli.bus,
        address: cli.address,
    };
    let mut transport =
        ReconnectingTransport::new(opener).context("could not find a LCD2USB USB LCD")?;

    // Test interface reliability; mismatches are informational only
    if !cli.skip_echo {
        run_echo_test(&mut transport, ECHO_TRIALS).context("echo test aborted")?;
    }

    match firmware_version(&mut transport) {
        Ok((major, minor)) => info!("firmware version {major}.{minor:02}"),
        Err(e) => warn!("unable to read firmware version: {e}"),
    }

    let geometry = Geometry::new(cli.columns, cli.rows);
    let mut display = Display::detect(transport, geometry);
    if display.controllers().is_empty() {
        bail!("no controllers found, display is inoperable");
    }

    if let Some(contrast) = cli.contrast {
        display.set_contrast(contrast)?;
    }
    if let Some(brightness) = cli.brightness {
        display.set_brightness(brightness)?;
    }

    display.clear()?;

    let running = Arc::new(AtomicBool::new(true));
    let flag = Arc::clone(&running);
    ctrlc::set_handler(move || {
        eprintln!("\n🛑 Received Ctrl+C, shutting down gracefully...");
        flag.store(false, Ordering::SeqCst);
    })?;

    run_pipe(&mut display, &running)
}

/// Read stdin lines and render them round-robin over the display rows until
/// end of stream or shutdown.
fn run_pipe<T: Transport>(display: &mut Display<T>, running: &AtomicBool) -> Result<()> {
    let columns = usize::from(display.geometry().columns);
    let rows = display.geometry().rows;
    let mut row = 0u8;

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        if !running.load(Ordering::SeqCst) {
            break;
        }
        let line = line.context("failed to read from stdin")?;
        display.write(row, 0, &render_line(&line, columns))?;
        row = (row + 1) % rows;
    }

    info!("✅ End of input, display left as-is");
    Ok(())
}

/// Truncate a line at the display width and pad it with spaces, so writing it
/// always covers the full row (an empty line clears its row).
fn render_line(line: &str, columns: usize) -> Vec<u8> {
    let mut bytes: Vec<u8> = line.bytes().take(columns).collect();
    bytes.resize(columns, b' ');
    bytes
}
