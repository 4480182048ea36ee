use std::thread;

use anyhow::Result;
use clap::Parser;
use log::info;

mod config;
mod http;
mod net;
mod query;
mod routes;

use config::Args;

fn main() -> Result<()> {
    env_logger::init();
    info!("Starting LATTICE Server...");

    let args = Args::parse();

    ctrlc::set_handler(|| {
        log::info!("Shutdown signal received. Stopping listeners.");
        std::process::exit(0);
    })?;

    info!(
        "Spawning {} workers on {}:{}...",
        args.workers, args.bind, args.port
    );

    let mut handles = Vec::with_capacity(args.workers);
    for worker_id in 0..args.workers {
        let bind = args.bind.clone();
        let port = args.port;
        let handle = thread::Builder::new()
            .name(format!("lattice-worker-{}", worker_id))
            .spawn(move || {
                let listener =
                    net::bind_reuseport(&bind, port).expect("Failed to bind worker listener");
                info!("Worker {} active and listening.", worker_id);
                net::serve(worker_id, listener);
            })?;
        handles.push(handle);
    }

    info!("LATTICE API ready on port {}.", args.port);

    for handle in handles {
        let _ = handle.join();
    }

    Ok(())
}
