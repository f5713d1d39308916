//! OSC sniffer for debugging and development
//!
//! Listens on the telemetry port and prints every datagram, whether or not
//! it carries the configured output header. No state is touched.

use anyhow::{Context, Result};
use colored::*;
use rosc::OscType;
use std::net::SocketAddr;
use std::time::Instant;

use crate::osc::{self, format_args, InboundMessage, MTU};
use crate::router::Router;
use crate::transport::bind_telemetry;

/// One decoded datagram as seen by the sniffer
#[derive(Debug, Clone)]
pub struct SnifferEvent {
    pub elapsed_ms: u128,
    pub peer: SocketAddr,
    pub messages: Vec<InboundMessage>,
    pub error: Option<String>,
    pub len: usize,
}

/// CLI OSC sniffer
pub async fn run_cli_sniffer(port: u16, output_header: &str) -> Result<()> {
    if port == 0 {
        anyhow::bail!("Sniffer needs a nonzero device.listen_port");
    }

    let socket = bind_telemetry(port)
        .await
        .context("Failed to open sniffer socket")?;
    let router = Router::new(output_header);

    println!("{}", "=== OSC Sniffer ===".bold().cyan());
    println!("Listening on UDP port {}", port.to_string().bright_white());
    println!("Output header: {}", router.output_header().bright_white());
    println!("Press Ctrl+C to exit\n");
    println!(
        "{}",
        "Format: [time +ms] PEER | ADDRESS [ARGS]".dimmed()
    );
    println!("{}\n", "─".repeat(80).dimmed());

    let start_time = Instant::now();
    let mut buf = vec![0u8; MTU];
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            received = socket.recv_from(&mut buf) => {
                let (len, peer) = match received {
                    Ok(received) => received,
                    Err(e) => {
                        println!("{} {}", "receive error:".red(), e);
                        continue;
                    }
                };
                let event = match osc::decode(&buf[..len]) {
                    Ok(messages) => SnifferEvent {
                        elapsed_ms: start_time.elapsed().as_millis(),
                        peer,
                        messages,
                        error: None,
                        len,
                    },
                    Err(e) => SnifferEvent {
                        elapsed_ms: start_time.elapsed().as_millis(),
                        peer,
                        messages: Vec::new(),
                        error: Some(e.to_string()),
                        len,
                    },
                };
                print_event(&event, &router);
            }
            _ = &mut shutdown => break,
        }
    }

    println!("\n{}", "Sniffer stopped".yellow());
    Ok(())
}

fn print_event(event: &SnifferEvent, router: &Router) {
    let timestamp = format!(
        "{} +{:08}",
        chrono::Local::now().format("%H:%M:%S%.3f"),
        event.elapsed_ms
    );
    let peer = event.peer.to_string();

    if let Some(error) = &event.error {
        println!(
            "[{}] {:21} | {} ({} bytes)",
            timestamp.dimmed(),
            peer.white(),
            error.bright_black(),
            event.len
        );
        return;
    }

    for msg in &event.messages {
        println!(
            "[{}] {:21} | {}",
            timestamp.dimmed(),
            peer.white(),
            format_message(msg, router)
        );
    }
}

/// Color the address by whether it would be routed
pub fn format_message(msg: &InboundMessage, router: &Router) -> String {
    let address = match router.route_key(&msg.address) {
        Some(_) => msg.address.bright_green(),
        None => msg.address.bright_black(),
    };
    let args = format_args(&msg.args);
    let args = if msg.args.iter().any(|a| matches!(a, OscType::String(_))) {
        args.bright_yellow()
    } else {
        args.bright_cyan()
    };
    format!("{} [{}]", address, args)
}
