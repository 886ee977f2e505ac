use std::{
    io::{self, Read, Write},
    net::{SocketAddr, TcpListener, TcpStream},
    thread,
    time::Duration,
};

use anyhow::{Context, Result};
use tracing::{debug, error, info, warn};

use crate::core::{config::server::ServerConfig, renderer::Renderer};

/// Upper bound for the request line plus headers.
const MAX_REQUEST_HEAD: usize = 8 * 1024;
const READ_TIMEOUT: Duration = Duration::from_secs(10);

/// Blocking HTTP/1.1 listener that answers every request with a freshly
/// rendered GIF.
#[derive(Debug)]
pub struct Server {
    listener: TcpListener,
    renderer: Renderer,
}

impl Server {
    /// Binds the listener to `config.bind`.
    ///
    /// # Errors
    ///
    /// Returns an error if the address cannot be bound.
    #[tracing::instrument(level = "info", skip(renderer))]
    pub fn bind(config: &ServerConfig, renderer: Renderer) -> Result<Self> {
        let listener = TcpListener::bind(&config.bind)
            .with_context(|| format!("Failed to bind listener to {}", config.bind))?;
        info!("Listening on {}", config.bind);
        Ok(Self { listener, renderer })
    }

    /// Address the listener ended up on, useful when binding to port 0.
    ///
    /// # Errors
    ///
    /// Returns an error if the socket address cannot be queried.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.listener
            .local_addr()
            .context("Failed to query listener address")
    }

    /// Accepts connections forever, each one served on its own thread.
    ///
    /// Neither a failed accept nor a failed thread spawn stops the loop;
    /// the affected connection is dropped and logged.
    #[tracing::instrument(level = "info", skip(self))]
    pub fn run(self) {
        accept_loop(self.listener.incoming(), |connection, stream| {
            let renderer = self.renderer.clone();
            thread::Builder::new()
                .name(format!("render-{connection}"))
                .spawn(move || serve_stream(stream, &renderer))
                .map(drop)
        });
    }

    /// Accepts and serves a single connection on the calling thread.
    ///
    /// # Errors
    ///
    /// Returns an error if accepting or serving the connection fails.
    pub fn accept_one(&self) -> Result<()> {
        let (stream, peer) = self
            .listener
            .accept()
            .context("Failed to accept connection")?;
        debug!("Accepted connection from {peer}");
        stream
            .set_read_timeout(Some(READ_TIMEOUT))
            .context("Failed to set read timeout")?;
        handle_connection(stream, &self.renderer)
    }
}

/// Hands every accepted connection to `dispatch` and returns the number
/// of connections that were dispatched successfully.
fn accept_loop<S, I, F>(incoming: I, mut dispatch: F) -> usize
where
    I: IntoIterator<Item = io::Result<S>>,
    F: FnMut(usize, S) -> io::Result<()>,
{
    let mut dispatched = 0;
    for (connection, stream) in incoming.into_iter().enumerate() {
        let stream = match stream {
            Ok(stream) => stream,
            Err(e) => {
                warn!("Failed to accept connection: {e}");
                continue;
            }
        };
        match dispatch(connection, stream) {
            Ok(()) => dispatched += 1,
            Err(e) => error!("Failed to spawn thread for connection {connection}: {e}"),
        }
    }
    dispatched
}

fn serve_stream(stream: TcpStream, renderer: &Renderer) {
    let peer = stream
        .peer_addr()
        .map_or_else(|_| "unknown peer".to_string(), |addr| addr.to_string());
    if let Err(e) = stream.set_read_timeout(Some(READ_TIMEOUT)) {
        warn!("Failed to set read timeout for {peer}: {e}");
    }
    if let Err(e) = handle_connection(stream, renderer) {
        warn!("Connection with {peer} failed: {e:#}");
    }
}

/// Request line of an incoming request. Everything but the method is
/// only logged, since every request is answered the same way.
#[derive(Debug, PartialEq, Eq)]
struct RequestLine {
    method: String,
    target: String,
}

/// Reads until the blank line that ends the request head.
fn read_request_head<S: Read>(stream: &mut S) -> Result<Vec<u8>> {
    let mut head = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        let read = stream.read(&mut chunk).context("Failed to read request")?;
        if read == 0 {
            break;
        }
        head.extend_from_slice(&chunk[..read]);
        if head.windows(4).any(|w| w == b"\r\n\r\n") || head.windows(2).any(|w| w == b"\n\n") {
            break;
        }
        if head.len() > MAX_REQUEST_HEAD {
            break;
        }
    }
    Ok(head)
}

fn parse_request_line(head: &[u8]) -> Option<RequestLine> {
    if head.len() > MAX_REQUEST_HEAD {
        return None;
    }
    let head = std::str::from_utf8(head).ok()?;
    let mut parts = head.lines().next()?.split_whitespace();
    let method = parts.next()?.to_string();
    let target = parts.next()?.to_string();
    Some(RequestLine { method, target })
}

fn write_response<S: Write>(
    stream: &mut S,
    status: &str,
    content_type: &str,
    body: &[u8],
    include_body: bool,
) -> Result<()> {
    write!(
        stream,
        "HTTP/1.1 {status}\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        body.len()
    )
    .context("Failed to write response head")?;
    if include_body {
        stream
            .write_all(body)
            .context("Failed to write response body")?;
    }
    stream.flush().context("Failed to flush response")?;
    Ok(())
}

/// Serves one request on `stream`.
///
/// The GIF is encoded into memory first, so a failing render is answered
/// with a 500 instead of a truncated image.
///
/// # Errors
///
/// Returns an error if reading the request or writing the response fails.
#[tracing::instrument(level = "debug", skip_all)]
pub fn handle_connection<S: Read + Write>(mut stream: S, renderer: &Renderer) -> Result<()> {
    let head = read_request_head(&mut stream)?;
    let Some(request) = parse_request_line(&head) else {
        warn!("Rejecting malformed request");
        return write_response(
            &mut stream,
            "400 Bad Request",
            "text/plain; charset=utf-8",
            b"bad request\n",
            true,
        );
    };
    info!("{} {}", request.method, request.target);

    let include_body = request.method != "HEAD";
    match renderer.render_gif() {
        Ok(gif) => write_response(&mut stream, "200 OK", "image/gif", &gif, include_body),
        Err(e) => {
            error!("Render failed: {e:#}");
            write_response(
                &mut stream,
                "500 Internal Server Error",
                "text/plain; charset=utf-8",
                b"render failed\n",
                include_body,
            )
        }
    }
}
