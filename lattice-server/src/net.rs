use std::io::BufReader;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::time::Duration;

use log::{debug, error, info, warn};
use socket2::{Domain, Protocol, Socket, Type};

use crate::http::{self, HttpError};
use crate::routes;

/// Pending-connection backlog per worker listener.
const LISTEN_BACKLOG: i32 = 1024;

/// A stalled client may not hold a worker hostage.
const READ_TIMEOUT: Duration = Duration::from_secs(5);

/// Creates one worker listener on `bind:port`.
///
/// Enables `SO_REUSEPORT` so every worker binds the same port and the kernel
/// spreads incoming connections across them, and `TCP_NODELAY` so small JSON
/// responses are not held back by Nagle.
///
/// # Errors
/// Returns `std::io::Error` if the socket cannot be created, configured, or
/// bound.
pub fn bind_reuseport(bind: &str, port: u16) -> std::io::Result<TcpListener> {
    let addr: SocketAddr = format!("{}:{}", bind, port)
        .parse()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;

    let socket = Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP))?;
    socket.set_reuse_address(true)?;
    socket.set_reuse_port(true)?;
    socket.set_nodelay(true)?;
    socket.bind(&addr.into())?;
    socket.listen(LISTEN_BACKLOG)?;

    info!(
        "HTTP ingress active on {} [REUSEPORT=ON, NODELAY=ON]",
        addr
    );

    Ok(socket.into())
}

/// Sequential accept-and-serve loop. Never returns.
pub fn serve(worker_id: usize, listener: TcpListener) -> ! {
    loop {
        match listener.accept() {
            Ok((stream, peer)) => {
                debug!("Worker {} accepted {}", worker_id, peer);
                handle_connection(stream, worker_id);
            }
            Err(e) => error!("Worker {} accept error: {}", worker_id, e),
        }
    }
}

/// One request, one response, close. Framing failures still answer with the
/// JSON error envelope; transport failures only log.
fn handle_connection(stream: TcpStream, worker_id: usize) {
    let _ = stream.set_nodelay(true);
    let _ = stream.set_read_timeout(Some(READ_TIMEOUT));

    let mut reader = BufReader::new(&stream);
    let response = match http::read_request(&mut reader) {
        Ok(request) => routes::route(&request),
        Err(HttpError::Eof) => return,
        Err(HttpError::Io(e)) => {
            debug!("Worker {} dropped connection: {}", worker_id, e);
            return;
        }
        Err(e) => {
            warn!("Worker {} rejected request: {}", worker_id, e);
            routes::framing_error(&e)
        }
    };

    let mut writer = &stream;
    if let Err(e) = http::write_response(&mut writer, &response) {
        debug!("Worker {} failed to write response: {}", worker_id, e);
    }
}
