use std::{env, thread, time::Duration};

use inquire::Select;
use inspire_hand::{Generation, HandConfig, JointVector};

// Configuration constants - adjust these for your setup
const HAND_ID: u8 = 0x01;
const GENERATION: Generation = Generation::Gen3;
const SPEED: u16 = 500;
const FORCE_LIMIT: u16 = 500;
const SETTLE_DELAY_MS: u64 = 1500;

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    // Get serial port from command line arg or interactive selection
    let port_name = env::args().nth(1).unwrap_or_else(|| {
        let ports = serialport::available_ports().expect("Failed to enumerate serial ports");

        if ports.is_empty() {
            eprintln!("No serial ports found!");
            std::process::exit(1);
        }

        let port_names: Vec<String> = ports.iter().map(|p| p.port_name.clone()).collect();

        Select::new("Select a serial port:", port_names)
            .prompt()
            .expect("Failed to select port")
    });

    println!("Using port: {}", port_name);

    let mut hand = HandConfig::serial(&port_name)
        .with_generation(GENERATION)
        .with_hand_id(HAND_ID)
        .with_debug(true)
        .connect()
        .expect("Failed to open hand");

    hand.reset_error().unwrap();
    hand.set_speed(JointVector::splat(SPEED)).unwrap();
    hand.set_force(JointVector::splat(FORCE_LIMIT)).unwrap();

    println!("Opening hand");
    hand.perform_open().unwrap();
    thread::sleep(Duration::from_millis(SETTLE_DELAY_MS));
    println!("Angles: {:?}", hand.get_angle_actual().unwrap());

    // Pinch: close index and thumb flex only, leave the rest where they are.
    println!("Pinching");
    hand.set_angle([-1, -1, -1, 300, 300, -1]).unwrap();
    thread::sleep(Duration::from_millis(SETTLE_DELAY_MS));
    println!("Angles: {:?}", hand.get_angle_actual().unwrap());
    println!("Forces: {:?}", hand.get_force_actual().unwrap());

    let status = hand.get_status().unwrap();
    let errors = hand.get_error().unwrap();
    let temps = hand.get_temp().unwrap();
    println!("\n--- Actuators ---");
    for (joint, state) in status.iter() {
        println!(
            "{:>13}: {:<18} {:>3}°C  errors clear: {}",
            joint,
            state,
            temps[joint],
            errors[joint].is_clear()
        );
    }

    println!("\nClosing hand");
    hand.perform_close().unwrap();
    thread::sleep(Duration::from_millis(SETTLE_DELAY_MS));
    hand.perform_open().unwrap();

    hand.disconnect();
}
