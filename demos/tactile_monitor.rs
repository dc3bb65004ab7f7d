use std::{env, net::IpAddr, thread, time::Duration, time::Instant};

use inspire_hand::{Generation, HandConfig, config::DEFAULT_IP};

const POLL_INTERVAL_MS: u64 = 100;
const SAMPLES: usize = 100;

fn main() {
    tracing_subscriber::fmt::init();

    // Optional IP address on the command line, otherwise the factory default.
    let ip: IpAddr = env::args()
        .nth(1)
        .map(|arg| arg.parse().expect("Invalid IP address"))
        .unwrap_or(IpAddr::V4(DEFAULT_IP));

    let mut hand = HandConfig::modbus(ip)
        .with_generation(Generation::Gen4)
        .connect()
        .expect("Failed to connect to hand");

    println!("Hand reports IP {}", hand.get_ip_address().unwrap());
    for (register, readable) in hand.probe_registers() {
        println!("{:>14}: {}", register, if readable { "ok" } else { "unreadable" });
    }

    println!(
        "\n{:>8} {:>6} {:>6} {:>6} {:>6} {:>6} {:>6}",
        "ms", "pinky", "ring", "middle", "index", "thumb", "palm"
    );
    let start = Instant::now();
    for _ in 0..SAMPLES {
        let frame = hand.read_tactile().unwrap();
        println!(
            "{:>8} {:>6} {:>6} {:>6} {:>6} {:>6} {:>6}",
            start.elapsed().as_millis(),
            frame.pinky.peak(),
            frame.ring.peak(),
            frame.middle.peak(),
            frame.index.peak(),
            frame.thumb.peak(),
            frame.palm.peak(),
        );
        thread::sleep(Duration::from_millis(POLL_INTERVAL_MS));
    }

    hand.disconnect();
}
