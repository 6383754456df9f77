//! Tests against a real controller.
//!
//! None of these move an axis or start the spindle; they only exchange
//! status queries and modal commands.
//!
//! # Running Hardware Tests
//!
//! ```bash
//! export NOMAD_TEST_PORT=/dev/ttyACM0    # or COM23 on Windows
//! export NOMAD_TEST_BAUD=115200          # optional, default: 115200
//!
//! cargo test --test integration_hardware -- --ignored
//! ```

use nomad_driver::machine::{Machine, MachineConfig};
use nomad_driver::protocol::{RunState, UnitsMode};
use std::env;

/// Get the test port from environment variable.
fn get_test_port() -> Option<String> {
    env::var("NOMAD_TEST_PORT").ok()
}

/// Get the test baud rate from environment variable (default: 115200).
fn get_test_baud() -> u32 {
    env::var("NOMAD_TEST_BAUD")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(115_200)
}

/// Open the controller, or skip when no port is configured.
fn connect_or_skip() -> Option<Machine> {
    let port_name = match get_test_port() {
        Some(p) => p,
        None => {
            println!("Skipping hardware test: NOMAD_TEST_PORT not set");
            return None;
        }
    };

    let mut config = MachineConfig::default();
    config.port.baud_rate = get_test_baud();
    println!("Testing controller on {} at {} baud", port_name, config.port.baud_rate);

    match Machine::connect(&port_name, &config) {
        Ok(machine) => Some(machine),
        Err(e) => panic!("Connect failed: {}", e),
    }
}

#[test]
#[ignore] // Run with --ignored flag
fn test_banner_and_status() {
    let Some(mut machine) = connect_or_skip() else {
        return;
    };

    println!("Banner: {:?}", machine.banner());
    let status = machine.status().expect("status query");
    println!("Status: {}", status);
    assert!(
        !matches!(status.run_state(), RunState::Unknown(_)),
        "unrecognized status line: {}",
        status
    );
}

#[test]
#[ignore]
fn test_units_round_trip() {
    let Some(mut machine) = connect_or_skip() else {
        return;
    };

    // Alarm-locked controllers reject G-code; clear it first.
    machine.unlock().expect("unlock");
    machine.in_inches().expect("G20 accepted");
    assert_eq!(machine.modal().units_mode, UnitsMode::Inches);

    machine.in_millimeters().expect("G21 accepted");
    assert_eq!(machine.modal().units_mode, UnitsMode::Millimeters);

    machine.disconnect();
}
