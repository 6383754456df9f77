use clap::{Parser, Subcommand, ValueEnum};
use nomad_driver::config::{Config, ConfigLoader};
use nomad_driver::logging::init_logging;
use nomad_driver::{CancelToken, DriverResult, Machine, MachineConfig, MotionRequest, WaitOutcome};
use std::path::PathBuf;
use tokio::signal;
use tracing::{info, warn};

// Command-line arguments
#[derive(Parser, Debug)]
#[command(
    version,
    about = "Drive a GRBL-based desktop mill over a serial port.",
    long_about = "Sends G-code/M-code commands one at a time, waiting for the controller's acknowledgment before the next. Ctrl+C aborts a pending read or status wait."
)]
struct Args {
    /// Configuration file (defaults to the standard search path).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Serial port or configured alias, e.g. /dev/ttyACM0 or COM23.
    #[arg(short, long)]
    port: Option<String>,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Print one raw status report.
    Status,
    /// Clear an alarm lock ($X).
    Unlock,
    /// Run the homing cycle ($H).
    Home,
    /// Move the tool.
    Move {
        #[arg(long, allow_hyphen_values = true)]
        x: Option<f64>,
        #[arg(long, allow_hyphen_values = true)]
        y: Option<f64>,
        #[arg(long, allow_hyphen_values = true)]
        z: Option<f64>,
        /// Treat coordinates as offsets from the current position.
        #[arg(long)]
        relative: bool,
        /// Rapid traverse instead of the feed rate.
        #[arg(long)]
        fast: bool,
        /// Block until the machine reports it has stopped.
        #[arg(long)]
        wait: bool,
    },
    /// Start or stop the spindle.
    Spindle {
        #[arg(value_enum)]
        direction: SpindleArg,
        /// Spindle speed in RPM, sent before the direction.
        #[arg(long)]
        speed: Option<u32>,
    },
    /// Run a short exercise sequence: jog X back and forth, then visit two points.
    Demo,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum SpindleArg {
    Cw,
    Ccw,
    Stop,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match args.config {
        Some(ref path) => ConfigLoader::load_from(path)?.into_config(),
        None => match ConfigLoader::load() {
            Ok(loader) => loader.into_config(),
            Err(e) => {
                eprintln!("Warning: Failed to load config, using defaults: {}", e);
                ConfigLoader::with_defaults().into_config()
            }
        },
    };
    init_logging(&config.logging)?;

    let port = resolve_port(&args, &config)?;
    let machine_config = config.machine_config();

    let cancel = CancelToken::new();
    let worker_token = cancel.clone();
    let command = args.command;
    let mut task = tokio::task::spawn_blocking(move || {
        run(command, &port, &machine_config, worker_token)
    });

    let finished = tokio::select! {
        res = &mut task => Some(res),
        _ = signal::ctrl_c() => None,
    };

    let outcome = match finished {
        Some(res) => res,
        None => {
            // The worker notices the token at its next read or poll boundary.
            warn!("Interrupt received, cancelling");
            cancel.cancel();
            task.await
        }
    };

    outcome??;
    Ok(())
}

fn resolve_port(args: &Args, config: &Config) -> Result<String, Box<dyn std::error::Error>> {
    let name = args
        .port
        .as_deref()
        .or(config.serial.port.as_deref())
        .ok_or("no serial port given; pass --port or set serial.port")?;
    Ok(config.serial.resolve_port(name))
}

fn run(
    command: Cmd,
    port: &str,
    config: &MachineConfig,
    cancel: CancelToken,
) -> DriverResult<()> {
    let mut machine = Machine::connect(port, config)?;
    machine.driver_mut().set_cancel_token(cancel);

    match command {
        Cmd::Status => println!("{}", machine.status()?),
        Cmd::Unlock => machine.unlock()?,
        Cmd::Home => machine.home()?,
        Cmd::Move {
            x,
            y,
            z,
            relative,
            fast,
            wait,
        } => {
            let request = MotionRequest { x, y, z };
            match (relative, fast) {
                (false, false) => machine.move_to(request)?,
                (false, true) => machine.move_to_fast(request)?,
                (true, false) => machine.move_by(request)?,
                (true, true) => machine.move_by_fast(request)?,
            };
            if wait {
                report_wait(machine.wait_until_stopped()?);
            }
        }
        Cmd::Spindle { direction, speed } => {
            if let Some(rpm) = speed {
                machine.spindle_speed(rpm)?;
            }
            match direction {
                SpindleArg::Cw => machine.spindle_clockwise()?,
                SpindleArg::Ccw => machine.spindle_counter_clockwise()?,
                SpindleArg::Stop => machine.spindle_stop()?,
            }
        }
        Cmd::Demo => demo(&mut machine)?,
    }

    machine.disconnect();
    Ok(())
}

fn report_wait(outcome: WaitOutcome) {
    match outcome {
        WaitOutcome::Stopped { queries } => info!("Stopped after {} status queries", queries),
        WaitOutcome::Exhausted { queries } => {
            warn!("Gave up waiting after {} status queries", queries)
        }
    }
}

fn demo(machine: &mut Machine) -> DriverResult<()> {
    machine.unlock()?;

    machine.in_millimeters()?;
    machine.spindle_speed(2000)?;
    machine.spindle_clockwise()?;
    machine.feed_rate(400)?;

    machine.move_by_fast(MotionRequest::new().x(-10.0))?;
    machine.move_by_fast(MotionRequest::new().x(10.0))?;
    machine.move_by(MotionRequest::new().x(-5.0))?;
    machine.move_by(MotionRequest::new().x(5.0))?;
    report_wait(machine.wait_until_stopped()?);

    machine.move_to(MotionRequest::new().x(-30.0).y(-20.0))?;
    machine.move_to(MotionRequest::new().x(0.0).y(0.0))?;
    report_wait(machine.wait_until_stopped()?);

    machine.spindle_stop()
}
