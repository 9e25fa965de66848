use std::env;

use inquire::Select;
use xpf_psu::{
    XpfPsu,
    config::TransportConfig,
    mock_serial::MockSerial,
    transport::{Transport, serial::SerialTransport},
};

// Configuration constants - adjust these for your setup
const BAUD_RATE: u32 = 9600;
// The PSU can take a while to respond, a reasonably large time out is required.
const SERIAL_TIMEOUT_MS: u32 = 300;
const CHANNEL: &str = "1";
const LOAD_MODEL: &str = "DI-8111";

fn run<T: Transport>(mut psu: XpfPsu<T>) {
    let outcome = psu.connect();
    println!("{}", outcome.message);
    if !outcome.success {
        std::process::exit(1);
    }

    // Program the channel for the load module
    if psu.set_voltage(CHANNEL, LOAD_MODEL) {
        println!("Programmed channel {CHANNEL} for {LOAD_MODEL}");
    }
    println!("{:#?}", psu.snapshot());

    // Turn everything back off
    psu.reset_control("both");
    println!("{:#?}", psu.snapshot());

    psu.release();
}

fn main() {
    env_logger::init();

    // `--simulate` runs against the simulated PSU, no hardware needed.
    let arg = env::args().nth(1);
    if arg.as_deref() == Some("--simulate") {
        run(XpfPsu::<_>::new(MockSerial::new()));
        return;
    }

    // Get serial port from command line arg or interactive selection
    let port_name = arg.unwrap_or_else(|| {
        // List available serial ports
        let ports = serialport::available_ports().expect("Failed to enumerate serial ports");

        if ports.is_empty() {
            eprintln!("No serial ports found!");
            std::process::exit(1);
        }

        let port_names: Vec<String> = ports.iter().map(|p| p.port_name.clone()).collect();

        // Interactive selection
        Select::new("Select a serial port:", port_names)
            .prompt()
            .expect("Failed to select port")
    });

    println!("Using port: {}", port_name);

    // Settings are fixed before the session is created
    let mut config = TransportConfig::default();
    if let Err(e) = config.load_str(&format!("{port_name},{BAUD_RATE},N,8,1,{SERIAL_TIMEOUT_MS}")) {
        eprintln!("Bad serial settings: {e}");
        std::process::exit(1);
    }

    run(XpfPsu::<_>::with_config(SerialTransport::new(), config));
}
