//! Command-line front end for a jamyxer server.
//!
//! ```text
//! cargo run --example mixer -- <host> <port> ports
//! cargo run --example mixer -- <host> <port> get i mic1
//! cargo run --example mixer -- <host> <port> vol o master 0.8
//! cargo run --example mixer -- <host> <port> bal i mic1 -0.2
//! cargo run --example mixer -- <host> <port> con mic1 master
//! cargo run --example mixer -- <host> <port> dis mic1 master
//! cargo run --example mixer -- <host> <port> tog mic1 master
//! cargo run --example mixer -- <host> <port> monitor [i|o name]
//! cargo run --example mixer -- <host> <port> listen i mic1 o master
//! ```
//!
//! Set `RUST_LOG=jamyx=debug` to see the raw requests and replies.

use jamyx::{Direction, Port, Target, VolumeEvent};
use tracing_subscriber::EnvFilter;

type BoxError = Box<dyn std::error::Error>;

fn usage() -> BoxError {
    "usage: mixer <host> <port> <ports|get|vol|bal|con|dis|tog|monitor|listen> [args...]".into()
}

fn direction(code: &str) -> Result<Direction, BoxError> {
    match code {
        "i" => Ok(Direction::Input),
        "o" => Ok(Direction::Output),
        other => Err(format!("direction must be i or o, got {:?}", other).into()),
    }
}

fn print_port(port: &Port) {
    println!(
        "{:<4} {:<20} vol {:>6.3}  bal {:>6.3}  {}  -> [{}]",
        port.direction().ptype(),
        port.name(),
        port.volume(),
        port.balance(),
        if port.is_mono() { "mono  " } else { "stereo" },
        port.connections().join(", ")
    );
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let args: Vec<&str> = args.iter().map(String::as_str).collect();
    let [host, port, command, rest @ ..] = args.as_slice() else {
        return Err(usage());
    };
    let target = Target::new(*host, port.parse()?);

    match (*command, rest) {
        ("ports", []) => {
            let ports = target.ports().await?;
            for port in ports.inputs.iter().chain(&ports.outputs) {
                print_port(port);
            }
        }
        ("get", [dir, name]) => {
            print_port(&target.port(direction(dir)?, name).await?);
        }
        ("vol", [dir, name, value]) => {
            let mut port = target.port(direction(dir)?, name).await?;
            port.set_volume(value.parse()?).await?;
            print_port(&port);
        }
        ("bal", [dir, name, value]) => {
            let mut port = target.port(direction(dir)?, name).await?;
            port.set_balance(value.parse()?).await?;
            print_port(&port);
        }
        ("con", [input, output]) => {
            let mut port = target.port(Direction::Input, input).await?;
            port.connect_to_channel(output).await?;
            print_port(&port);
        }
        ("dis", [input, output]) => {
            target.disconnect_io(input, output).await?;
            print_port(&target.port(Direction::Input, input).await?);
        }
        ("tog", [input, output]) => {
            target.toggle_connection_io(input, output).await?;
            println!("connected: {}", target.connected_io(input, output).await?);
        }
        ("monitor", []) => {
            print_port(&target.monitor_port().await?);
        }
        ("monitor", [dir, name]) => {
            let mut port = target.port(direction(dir)?, name).await?;
            port.set_monitored().await?;
            print_port(&port);
        }
        ("listen", pairs) if !pairs.is_empty() && pairs.len() % 2 == 0 => {
            let channels = pairs
                .chunks(2)
                .map(|pair| Ok((direction(pair[0])?, pair[1].to_string())))
                .collect::<Result<Vec<_>, BoxError>>()?;

            let mut watch = target.watch_volumes(channels);
            loop {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => break,
                    event = watch.recv() => match event? {
                        VolumeEvent::Changed(port) => print_port(&port),
                        VolumeEvent::Failed { direction, channel, error } => {
                            eprintln!("{} {}: {}", direction, channel, error);
                        }
                    },
                }
            }
            watch.stop().await;
        }
        _ => return Err(usage()),
    }

    Ok(())
}
