//! Downstream register server: publishes a fixed holding-register value
//! over a minimal Modbus-TCP subset.
//!
//! Fully independent of the process graph; it exists so fieldbus clients
//! can poll a liveness/constant value from the monitoring host. Only
//! function 0x03 (read holding registers) is served; every other function
//! code gets an illegal-function exception. Start and stop are explicit
//! and report their failure states instead of being swallowed.

use std::net::SocketAddr;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::RegisterError;

/// Value published in every holding register, as in the original device
/// identity block.
pub const DEFAULT_REGISTER_VALUE: u16 = 12345;

/// Size of the addressable holding-register block.
pub const REGISTER_COUNT: u16 = 100;

const MBAP_HEADER_LEN: usize = 7;
const MODBUS_PROTOCOL_ID: u16 = 0;
const FN_READ_HOLDING_REGISTERS: u8 = 0x03;
const MAX_READ_QUANTITY: u16 = 125;

const EX_ILLEGAL_FUNCTION: u8 = 0x01;
const EX_ILLEGAL_DATA_ADDRESS: u8 = 0x02;
const EX_ILLEGAL_DATA_VALUE: u8 = 0x03;

/// Running register server with cooperative shutdown.
pub struct RegisterServer {
    local_addr: SocketAddr,
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl RegisterServer {
    /// Binds and starts serving. Fails with [`RegisterError::Bind`] when
    /// the address cannot be bound.
    pub async fn start(addr: &str, value: u16) -> Result<Self, RegisterError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| RegisterError::Bind {
                addr: addr.to_string(),
                source: e,
            })?;
        let local_addr = listener.local_addr().map_err(|e| RegisterError::Bind {
            addr: addr.to_string(),
            source: e,
        })?;

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        info!("register server listening on {}", local_addr);
        let task = tokio::spawn(accept_loop(listener, value, shutdown_rx));

        Ok(Self {
            local_addr,
            shutdown_tx,
            task,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stops accepting connections and waits for the accept loop to exit.
    pub async fn stop(self) {
        let _ = self.shutdown_tx.send(true);
        if let Err(e) = self.task.await {
            warn!("register server task terminated abnormally: {}", e);
        }
        info!("register server stopped");
    }
}

async fn accept_loop(listener: TcpListener, value: u16, mut shutdown_rx: watch::Receiver<bool>) {
    loop {
        tokio::select! {
            accepted = listener.accept() => {
                match accepted {
                    Ok((stream, peer)) => {
                        debug!("register client connected: {}", peer);
                        let conn_shutdown = shutdown_rx.clone();
                        tokio::spawn(async move {
                            if let Err(e) = serve_client(stream, value, conn_shutdown).await {
                                debug!("register client {} closed: {}", peer, e);
                            }
                        });
                    }
                    Err(e) => warn!("register server accept failed: {}", e),
                }
            }
            changed = shutdown_rx.changed() => {
                // A closed channel means the handle is gone; shut down.
                if changed.is_err() || *shutdown_rx.borrow() {
                    break;
                }
            }
        }
    }
}

async fn serve_client(
    mut stream: TcpStream,
    value: u16,
    mut shutdown_rx: watch::Receiver<bool>,
) -> std::io::Result<()> {
    loop {
        let mut header = [0u8; MBAP_HEADER_LEN];
        tokio::select! {
            read = stream.read_exact(&mut header) => { read?; }
            changed = shutdown_rx.changed() => {
                if changed.is_err() || *shutdown_rx.borrow() {
                    return Ok(());
                }
                continue;
            }
        }

        let transaction_id = u16::from_be_bytes([header[0], header[1]]);
        let protocol_id = u16::from_be_bytes([header[2], header[3]]);
        let length = u16::from_be_bytes([header[4], header[5]]) as usize;
        let unit_id = header[6];

        // length counts the unit id plus the PDU
        if protocol_id != MODBUS_PROTOCOL_ID || length < 2 || length > 256 {
            return Ok(());
        }
        let mut pdu = vec![0u8; length - 1];
        stream.read_exact(&mut pdu).await?;

        let response_pdu = respond(&pdu, value);
        let mut frame = Vec::with_capacity(MBAP_HEADER_LEN + response_pdu.len());
        frame.extend_from_slice(&transaction_id.to_be_bytes());
        frame.extend_from_slice(&MODBUS_PROTOCOL_ID.to_be_bytes());
        frame.extend_from_slice(&((response_pdu.len() as u16 + 1).to_be_bytes()));
        frame.push(unit_id);
        frame.extend_from_slice(&response_pdu);
        stream.write_all(&frame).await?;
    }
}

/// Builds the response PDU for one request PDU.
fn respond(pdu: &[u8], value: u16) -> Vec<u8> {
    let Some(&function) = pdu.first() else {
        return exception(FN_READ_HOLDING_REGISTERS, EX_ILLEGAL_DATA_VALUE);
    };
    if function != FN_READ_HOLDING_REGISTERS {
        return exception(function, EX_ILLEGAL_FUNCTION);
    }
    if pdu.len() != 5 {
        return exception(function, EX_ILLEGAL_DATA_VALUE);
    }

    let address = u16::from_be_bytes([pdu[1], pdu[2]]);
    let quantity = u16::from_be_bytes([pdu[3], pdu[4]]);
    if quantity == 0 || quantity > MAX_READ_QUANTITY {
        return exception(function, EX_ILLEGAL_DATA_VALUE);
    }
    if address.checked_add(quantity).map_or(true, |end| end > REGISTER_COUNT) {
        return exception(function, EX_ILLEGAL_DATA_ADDRESS);
    }

    let mut out = Vec::with_capacity(2 + quantity as usize * 2);
    out.push(function);
    out.push((quantity * 2) as u8);
    for _ in 0..quantity {
        out.extend_from_slice(&value.to_be_bytes());
    }
    out
}

fn exception(function: u8, code: u8) -> Vec<u8> {
    vec![function | 0x80, code]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_request(address: u16, quantity: u16) -> Vec<u8> {
        let mut pdu = vec![FN_READ_HOLDING_REGISTERS];
        pdu.extend_from_slice(&address.to_be_bytes());
        pdu.extend_from_slice(&quantity.to_be_bytes());
        pdu
    }

    #[test]
    fn test_respond_returns_fixed_value() {
        let pdu = respond(&read_request(0, 3), DEFAULT_REGISTER_VALUE);
        assert_eq!(pdu[0], FN_READ_HOLDING_REGISTERS);
        assert_eq!(pdu[1], 6);
        for chunk in pdu[2..].chunks(2) {
            assert_eq!(u16::from_be_bytes([chunk[0], chunk[1]]), 12345);
        }
    }

    #[test]
    fn test_respond_rejects_unknown_function() {
        let pdu = respond(&[0x06, 0, 0, 0, 1], 1);
        assert_eq!(pdu, vec![0x86, EX_ILLEGAL_FUNCTION]);
    }

    #[test]
    fn test_respond_rejects_out_of_range_address() {
        let pdu = respond(&read_request(99, 2), 1);
        assert_eq!(pdu, vec![0x83, EX_ILLEGAL_DATA_ADDRESS]);
        // Last addressable register is still readable.
        let ok = respond(&read_request(99, 1), 1);
        assert_eq!(ok[0], FN_READ_HOLDING_REGISTERS);
    }

    #[test]
    fn test_respond_rejects_bad_quantity() {
        assert_eq!(respond(&read_request(0, 0), 1)[1], EX_ILLEGAL_DATA_VALUE);
        assert_eq!(respond(&read_request(0, 126), 1)[1], EX_ILLEGAL_DATA_VALUE);
    }

    #[test]
    fn test_respond_rejects_truncated_pdu() {
        assert_eq!(respond(&[FN_READ_HOLDING_REGISTERS, 0, 0], 1)[1], EX_ILLEGAL_DATA_VALUE);
    }
}
