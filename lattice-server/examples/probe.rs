use std::io::{Read, Write};
use std::net::TcpStream;

use lattice_proto::DiscretizeRequest;

fn main() -> std::io::Result<()> {
    let addr = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "127.0.0.1:8080".to_string());
    println!("Probing LATTICE at {}...", addr);

    let health = send(&addr, "GET /api HTTP/1.1\r\nHost: probe\r\n\r\n".to_string())?;
    println!("--- Health ---\n{}\n", health);

    let request = DiscretizeRequest {
        state: [0.0, 0.5, 0.0, -0.5],
        n_bins: Some(10),
    };
    let body = serde_json::to_string(&request).expect("serialize probe body");
    let raw = format!(
        "POST /api/discretize HTTP/1.1\r\nHost: probe\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n{}",
        body.len(),
        body
    );
    let discretized = send(&addr, raw)?;
    println!("--- Discretize ---\n{}", discretized);

    println!("Probe dispatched successfully.");
    Ok(())
}

fn send(addr: &str, request: String) -> std::io::Result<String> {
    let mut stream = TcpStream::connect(addr)?;
    stream.write_all(request.as_bytes())?;
    stream.flush()?;
    let mut response = String::new();
    stream.read_to_string(&mut response)?;
    Ok(response)
}
