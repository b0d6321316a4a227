use adc_drivers::AdcDevice;
use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use i2c_transport::I2cBus;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{info, warn};
use trigger_sequencer::{build_sequencer, load_plan_file, ProbeSource, SequenceError};
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(
    name = "brewd",
    version,
    about = "Brew session daemon and hardware CLI",
    disable_help_subcommand = true
)]
struct Cli {
    /// Bus backend for device access
    #[arg(long, value_enum, global = true, default_value_t = Backend::Mock)]
    backend: Backend,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum Backend {
    Mock,
    Linux,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List registered ADC device types
    DeviceTypes,
    /// List I2C buses visible to the selected backend
    BusList,
    /// Read one calibrated value from an ADC channel
    DeviceRead {
        /// Bus number (e.g., 1 for /dev/i2c-1)
        #[arg(long, default_value = "1")]
        bus: String,
        /// Slave address, 0x-prefixed hex or decimal
        #[arg(long, default_value = "0x48")]
        address: String,
        /// Registered device type name
        #[arg(long, default_value = "ADS1015")]
        device_type: String,
        #[arg(long, default_value_t = 0)]
        channel: u8,
    },
    /// Run a brew session plan to completion
    Run {
        /// Session plan YAML file
        #[arg(long)]
        session: String,
        /// Probe binding as name=bus:address:type:channel (repeatable)
        #[arg(long = "probe")]
        probes: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    setup_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::DeviceTypes => {
            for name in adc_drivers::available_types() {
                println!("{name}");
            }
            Ok(())
        }
        Commands::BusList => bus_list(cli.backend),
        Commands::DeviceRead {
            bus,
            address,
            device_type,
            channel,
        } => device_read(cli.backend, &bus, &address, &device_type, channel),
        Commands::Run { session, probes } => run_session(cli.backend, &session, &probes).await,
    }
}

fn bus_list(backend: Backend) -> Result<()> {
    let infos = match backend {
        Backend::Mock => i2c_transport::MockBus::list()?,
        Backend::Linux => linux_bus_list()?,
    };
    for info in infos {
        println!("{}\t{}", info.path, info.driver);
    }
    Ok(())
}

fn device_read(
    backend: Backend,
    bus: &str,
    address: &str,
    device_type: &str,
    channel: u8,
) -> Result<()> {
    let volts = match backend {
        Backend::Mock => read_one::<i2c_transport::MockBus>(bus, address, device_type, channel)?,
        Backend::Linux => linux_device_read(bus, address, device_type, channel)?,
    };
    println!(
        "{}",
        serde_json::json!({
            "bus": bus,
            "address": address,
            "device_type": device_type,
            "channel": channel,
            "volts": volts,
        })
    );
    Ok(())
}

fn read_one<B: I2cBus>(bus: &str, address: &str, device_type: &str, channel: u8) -> Result<f32> {
    let mut device = AdcDevice::<B>::create(bus, address, device_type)?;
    device.init()?;
    Ok(device.read_value(channel)?)
}

async fn run_session(backend: Backend, session: &str, probe_specs: &[String]) -> Result<()> {
    let plan = load_plan_file(session)?;
    let probes = match backend {
        Backend::Mock => build_probes::<i2c_transport::MockBus>(probe_specs)?,
        Backend::Linux => linux_probes(probe_specs)?,
    };

    let session_id = Uuid::new_v4();
    info!(
        %session_id,
        session = %plan.session,
        steps = plan.steps.len(),
        "brew session starting"
    );

    let sequencer = Arc::new(build_sequencer(&plan, &probes)?);
    let mut worker = {
        let sequencer = Arc::clone(&sequencer);
        tokio::task::spawn_blocking(move || sequencer.run_to_completion())
    };
    let mut ticker = tokio::time::interval(Duration::from_secs(1));

    loop {
        tokio::select! {
            res = &mut worker => {
                return match res.context("sequencing worker panicked")? {
                    Ok(()) => {
                        info!(%session_id, "brew session complete");
                        println!("{}", serde_json::to_string(&sequencer.status())?);
                        Ok(())
                    }
                    Err(SequenceError::Cancelled) => {
                        warn!(%session_id, "brew session cancelled");
                        Ok(())
                    }
                    Err(e) => Err(e.into()),
                };
            }
            _ = tokio::signal::ctrl_c() => {
                warn!(%session_id, "interrupt received, cancelling session");
                sequencer.cancel();
            }
            _ = ticker.tick() => {
                println!("{}", serde_json::to_string(&sequencer.status())?);
            }
        }
    }
}

/// Adapter exposing one ADC channel as a calibrated probe.
struct AdcProbe<B: I2cBus + Send> {
    name: String,
    channel: u8,
    device: Mutex<AdcDevice<B>>,
}

impl<B: I2cBus + Send> ProbeSource for AdcProbe<B> {
    fn name(&self) -> &str {
        &self.name
    }

    fn read(&self) -> std::result::Result<f64, Box<dyn std::error::Error + Send + Sync>> {
        let mut device = self
            .device
            .lock()
            .map_err(|_| "probe device lock poisoned")?;
        let volts = device.read_value(self.channel)?;
        Ok(f64::from(volts))
    }
}

fn build_probes<B: I2cBus + Send + 'static>(
    specs: &[String],
) -> Result<HashMap<String, Arc<dyn ProbeSource>>> {
    let mut map: HashMap<String, Arc<dyn ProbeSource>> = HashMap::new();
    for spec in specs {
        let (name, bus, address, device_type, channel) = parse_probe_spec(spec)?;
        let mut device = AdcDevice::<B>::create(&bus, &address, &device_type)?;
        device
            .init()
            .with_context(|| format!("initialising probe {name}"))?;
        map.insert(
            name.clone(),
            Arc::new(AdcProbe {
                name,
                channel,
                device: Mutex::new(device),
            }),
        );
    }
    Ok(map)
}

fn parse_probe_spec(spec: &str) -> Result<(String, String, String, String, u8)> {
    let (name, rest) = spec
        .split_once('=')
        .ok_or_else(|| anyhow!("probe spec missing '=': {spec}"))?;
    let parts: Vec<&str> = rest.split(':').collect();
    if parts.len() != 4 {
        return Err(anyhow!(
            "probe spec must be name=bus:address:type:channel: {spec}"
        ));
    }
    let channel = parts[3]
        .parse::<u8>()
        .with_context(|| format!("probe channel in {spec}"))?;
    Ok((
        name.to_string(),
        parts[0].to_string(),
        parts[1].to_string(),
        parts[2].to_string(),
        channel,
    ))
}

#[cfg(feature = "linux-i2c")]
fn linux_bus_list() -> Result<Vec<i2c_transport::BusInfo>> {
    Ok(i2c_transport::LinuxI2c::list()?)
}

#[cfg(not(feature = "linux-i2c"))]
fn linux_bus_list() -> Result<Vec<i2c_transport::BusInfo>> {
    Err(anyhow!("linux-i2c feature not enabled"))
}

#[cfg(feature = "linux-i2c")]
fn linux_device_read(bus: &str, address: &str, device_type: &str, channel: u8) -> Result<f32> {
    read_one::<i2c_transport::LinuxI2c>(bus, address, device_type, channel)
}

#[cfg(not(feature = "linux-i2c"))]
fn linux_device_read(_bus: &str, _address: &str, _device_type: &str, _channel: u8) -> Result<f32> {
    Err(anyhow!("linux-i2c feature not enabled"))
}

#[cfg(feature = "linux-i2c")]
fn linux_probes(specs: &[String]) -> Result<HashMap<String, Arc<dyn ProbeSource>>> {
    build_probes::<i2c_transport::LinuxI2c>(specs)
}

#[cfg(not(feature = "linux-i2c"))]
fn linux_probes(_specs: &[String]) -> Result<HashMap<String, Arc<dyn ProbeSource>>> {
    Err(anyhow!("linux-i2c feature not enabled"))
}

fn setup_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}
