// Server module entry point
// Explicit server lifecycle: construct from config, run until shutdown

pub mod connection;
pub mod listener;
pub mod signal;

pub use listener::create_listener;

use std::sync::atomic::AtomicUsize;
use std::sync::Arc;

use crate::config::AppState;
use crate::logger;
use crate::server::signal::SignalHandler;

/// The listening server.
///
/// Owns its configuration and state explicitly; constructing one has no
/// process-wide side effects, and `run` holds the listener only for its
/// own lifetime.
pub struct Server {
    state: Arc<AppState>,
}

impl Server {
    pub const fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }

    /// Bind the configured address and accept connections until a
    /// shutdown signal arrives.
    ///
    /// Accept errors and per-connection failures are logged and never
    /// terminate the loop; only the shutdown signal does.
    pub async fn run(self) -> Result<(), Box<dyn std::error::Error>> {
        let addr = self.state.config.get_socket_addr()?;
        let listener = create_listener(addr)?;

        logger::log_server_start(&addr, &self.state.config);

        let signals = SignalHandler::new();
        signal::start_signal_handler(&signals);

        let active_connections = Arc::new(AtomicUsize::new(0));

        loop {
            tokio::select! {
                accept_result = listener.accept() => {
                    match accept_result {
                        Ok((stream, peer_addr)) => {
                            connection::accept_connection(
                                stream,
                                peer_addr,
                                &self.state,
                                &active_connections,
                            );
                        }
                        Err(e) => {
                            logger::log_error(&format!("Failed to accept connection: {e}"));
                        }
                    }
                }

                () = signals.shutdown.notified() => {
                    logger::log_shutdown();
                    break;
                }
            }
        }

        // In-flight connections finish in their own tasks; dropping the
        // listener just stops new accepts.
        drop(listener);
        Ok(())
    }
}
