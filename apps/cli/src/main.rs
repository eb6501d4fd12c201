use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use shikra_core::device::DeviceError;
use shikra_core::session::{self, ProgrammerSession};
use shikra_core::transport::NusbTransport;
use shikra_core::{LedConfig, ProgrammerConfig, TracingObserver};
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(author, version, about = "Shikra EEPROM programmer (Pure Rust)", long_about = None)]
struct Args {
    /// Programmer profile (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// LED function to program: off, on, tx, rx or txrx
    #[arg(long, global = true)]
    led: Option<LedConfig>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the image the profile would program, without a device
    PrintConfig,
    /// Read the device EEPROM and decode its fields
    ShowConfig,
    /// Check whether a Shikra is attached
    Find,
    /// Program the profile into the device EEPROM
    WriteConfig {
        /// Read back and compare after writing
        #[arg(long)]
        verify: bool,
    },
    /// Print the device EEPROM as a hex dump
    Dump,
    /// Save the device EEPROM to a hex dump file
    Backup { file: PathBuf },
    /// Write a hex dump file to the device EEPROM
    Restore { file: PathBuf },
    /// Write 0x0000 to every word
    Zero,
    /// Write 0xFFFF to every word
    FactoryReset,
    /// Write the default profile to a TOML file
    InitConfig { file: PathBuf },
}

fn load_config(args: &Args) -> Result<ProgrammerConfig> {
    let mut config = match &args.config {
        Some(path) => ProgrammerConfig::load_from_file(path)?,
        None => ProgrammerConfig::default(),
    };
    if args.led.is_some() {
        config.eeprom.led = args.led;
    }
    Ok(config)
}

fn with_session<F>(config: ProgrammerConfig, f: F) -> Result<()>
where
    F: FnOnce(&ProgrammerSession<'_, NusbTransport, TracingObserver>) -> Result<()>,
{
    let transport = session::open(&config.device, &TracingObserver)?;
    let session = ProgrammerSession::new(&transport, config);
    f(&session)
}

fn run(args: Args) -> Result<()> {
    let mut config = load_config(&args)?;

    match args.command {
        Command::PrintConfig => {
            println!("{}", session::print_config(&config)?);
        }
        Command::ShowConfig => with_session(config, |s| {
            let image = s.dump()?;
            println!("{}", image.decode()?);
            Ok(())
        })?,
        Command::Find => {
            let selector = config.device;
            match NusbTransport::find(selector.vendor_id, selector.product_id)? {
                Some(info) => info!(
                    bus = %info.bus_id(),
                    address = info.device_address(),
                    "Shikra found"
                ),
                None => warn!(
                    "No device with VID {:04X} PID {:04X}",
                    selector.vendor_id, selector.product_id
                ),
            }
        }
        Command::WriteConfig { verify } => {
            config.verify |= verify;
            with_session(config, |s| {
                s.write_config()?;
                info!("Configuration written");
                Ok(())
            })?
        }
        Command::Dump => with_session(config, |s| {
            println!("{}", s.dump()?.to_hex_dump());
            Ok(())
        })?,
        Command::Backup { file } => with_session(config, |s| {
            s.backup(&file)?;
            Ok(())
        })?,
        Command::Restore { file } => with_session(config, |s| {
            s.restore(&file)?;
            info!("Backup restored");
            Ok(())
        })?,
        Command::Zero => with_session(config, |s| s.zero())?,
        Command::FactoryReset => with_session(config, |s| s.factory_reset())?,
        Command::InitConfig { file } => {
            config.save_to_file(&file)?;
            info!(path = %file.display(), "Profile written");
        }
    }
    Ok(())
}

fn main() {
    let args = Args::parse();

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(if args.verbose {
                    tracing::Level::DEBUG.into()
                } else {
                    tracing::Level::INFO.into()
                })
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    if let Err(e) = run(args) {
        if let Some(completed) = e.downcast_ref::<DeviceError>().and_then(DeviceError::completed) {
            error!("Error after {} words: {:#}", completed, e);
        } else {
            error!("Error: {:#}", e);
        }
        std::process::exit(1);
    }
}
