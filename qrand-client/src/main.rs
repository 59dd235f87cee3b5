// SPDX-License-Identifier: MIT
//
// Quantum Random Bit Service
// Copyright (c) 2025 Quantum Random Service Contributors

//! Test client for the quantum random bit server
//!
//! Probes the health endpoints, requests bits and prints them alongside a
//! hex dump and a ones/zeros count. Bits are unpacked LSB-first, so they are
//! shown in the order the server generated them.

use anyhow::{Context, Result};
use clap::Parser;
use qrand_core::bits::BitSequence;
use qrand_core::packer::unpack_lsb_first;
use serde_json::json;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "qrand-client")]
#[command(about = "Test client for the quantum random bit server")]
struct Args {
    /// Base URL of the server
    #[arg(long, default_value = "http://localhost:9000")]
    url: String,

    /// Number of bits to request
    #[arg(short, long, default_value = "16")]
    bits: i64,

    /// API key sent in X-API-Key
    #[arg(long, env = "API_KEY", default_value = "")]
    api_key: String,

    /// Backend hint: simulator or hardware
    #[arg(long)]
    backend: Option<String>,

    /// Verify TLS certificates (off by default for self-signed deployments)
    #[arg(long)]
    verify_ssl: bool,

    /// Skip the health endpoint probe
    #[arg(long)]
    no_health: bool,
}

/// Ones/zeros tally of a bit sequence
#[derive(Debug, Clone, PartialEq)]
struct Analysis {
    total_bits: usize,
    ones: usize,
    zeros: usize,
}

impl Analysis {
    fn of(bits: &BitSequence) -> Self {
        let ones = bits.ones();
        Self {
            total_bits: bits.len(),
            ones,
            zeros: bits.len() - ones,
        }
    }

    fn ones_ratio(&self) -> f64 {
        if self.total_bits == 0 {
            0.0
        } else {
            self.ones as f64 / self.total_bits as f64
        }
    }

    fn zeros_ratio(&self) -> f64 {
        if self.total_bits == 0 {
            0.0
        } else {
            self.zeros as f64 / self.total_bits as f64
        }
    }
}

/// One line per byte: its bits in generation order and its value
fn bit_groups(bits: &BitSequence, data: &[u8]) -> Vec<String> {
    let rendered = bits.to_string();
    rendered
        .as_bytes()
        .chunks(8)
        .zip(data)
        .map(|(chunk, byte)| {
            let chunk = String::from_utf8_lossy(chunk);
            format!("  {:<8} = {:3} (0x{:02x})", chunk, byte, byte)
        })
        .collect()
}

async fn check_health(client: &reqwest::Client, base_url: &str) {
    println!("Testing Health Endpoints");
    println!("{}", "-".repeat(30));

    for endpoint in ["/", "/health"] {
        let url = format!("{}{}", base_url, endpoint);
        match client.get(&url).timeout(Duration::from_secs(10)).send().await {
            Ok(response) => {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                println!("{}: {} - {}", endpoint, status, body);
            }
            Err(e) => println!("{}: Error - {}", endpoint, e),
        }
    }
    println!();
}

async fn request_bits(client: &reqwest::Client, args: &Args) -> Result<()> {
    let url = format!("{}/quantum-random", args.url);
    let payload = json!({ "n_bits": args.bits, "backend": args.backend });

    println!("Testing Quantum Random API");
    println!("URL: {}", url);
    println!("Requesting {} bits...", args.bits);
    println!("{}", "-".repeat(50));

    let response = client
        .post(&url)
        .header("X-API-Key", &args.api_key)
        .json(&payload)
        .timeout(Duration::from_secs(30))
        .send()
        .await
        .context("Request failed")?;

    let status = response.status();
    println!("Status Code: {}", status);
    for name in ["x-bits-generated", "x-backend", "content-length"] {
        if let Some(value) = response.headers().get(name) {
            println!("{}: {}", name, value.to_str().unwrap_or("<binary>"));
        }
    }
    println!();

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        println!("Error: {}", body);
        return Ok(());
    }

    let data = response.bytes().await.context("Failed to read response body")?;
    println!("Received {} bytes", data.len());

    let n_bits = usize::try_from(args.bits).unwrap_or(0);
    let bits = unpack_lsb_first(&data, n_bits);
    println!("Binary representation: {}", bits);
    println!();
    println!("Hex representation: {}", hex::encode(&data));
    println!();

    let analysis = Analysis::of(&bits);
    if analysis.total_bits > 0 {
        println!("Randomness Analysis:");
        println!("  Total bits: {}", analysis.total_bits);
        println!("  Ones: {} ({:.2}%)", analysis.ones, analysis.ones_ratio() * 100.0);
        println!("  Zeros: {} ({:.2}%)", analysis.zeros, analysis.zeros_ratio() * 100.0);
        println!();
    }

    if bits.len() > 8 {
        println!("Bit groups (8-bit chunks, LSB first):");
        for line in bit_groups(&bits, &data) {
            println!("{}", line);
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let client = reqwest::Client::builder()
        .danger_accept_invalid_certs(!args.verify_ssl)
        .build()
        .context("Failed to build HTTP client")?;

    println!("Quantum Random Number Generator - Test Client");
    println!("{}", "=".repeat(50));
    println!();

    if !args.no_health {
        check_health(&client, &args.url).await;
    }

    request_bits(&client, &args).await
}
