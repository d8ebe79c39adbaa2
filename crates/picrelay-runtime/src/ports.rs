//! Port allocation for the ingest listener.

use picrelay_core::error::StartupError;
use std::net::TcpListener;
use tracing::debug;

/// Check if a port is available by attempting to bind it on `host`.
/// The listener is dropped immediately, which releases the port.
///
/// The probe must bind the same interface the consuming service will
/// bind; probing loopback would miss a port held only on a wildcard or
/// external interface.
pub fn is_port_available(host: &str, port: u16) -> bool {
    match TcpListener::bind((host, port)) {
        Ok(listener) => listener.local_addr().is_ok(),
        Err(_) => false,
    }
}

/// Allocate the first free port on `host` in `[range_start, range_end]`,
/// scanning in ascending order.
///
/// A port is selected the moment a probe bind succeeds; it is not held,
/// so the consuming service must bind it promptly. Exhausting the range
/// is fatal to startup.
pub fn allocate_port(host: &str, range_start: u16, range_end: u16) -> Result<u16, StartupError> {
    for port in range_start..=range_end {
        if is_port_available(host, port) {
            debug!(port, host, "allocated available port");
            return Ok(port);
        }
        debug!(port, host, "port unavailable, scanning on");
    }
    Err(StartupError::NoFreePort {
        start: range_start,
        end: range_end,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use picrelay_core::config::DEFAULT_LISTEN_HOST;

    #[test]
    fn allocated_port_binds_at_allocation_time() {
        let port = allocate_port(DEFAULT_LISTEN_HOST, 18080, 18199).unwrap();
        // Absent external interference the port must still bind.
        let listener = TcpListener::bind((DEFAULT_LISTEN_HOST, port)).unwrap();
        assert_eq!(listener.local_addr().unwrap().port(), port);
    }

    #[test]
    fn occupied_port_is_skipped() {
        let holder = TcpListener::bind(("127.0.0.1", 0)).unwrap();
        let held = holder.local_addr().unwrap().port();

        // Range starting at the held port must yield a different one.
        if held < u16::MAX - 10 {
            let port = allocate_port(DEFAULT_LISTEN_HOST, held, held + 10).unwrap();
            assert_ne!(port, held);
        }
    }

    #[test]
    fn exhausted_range_reports_no_free_port() {
        let holder = TcpListener::bind(("127.0.0.1", 0)).unwrap();
        let held = holder.local_addr().unwrap().port();

        match allocate_port(DEFAULT_LISTEN_HOST, held, held) {
            Err(StartupError::NoFreePort { start, end }) => {
                assert_eq!((start, end), (held, held));
            }
            other => panic!("expected NoFreePort, got {other:?}"),
        }
    }

    #[test]
    fn loopback_holder_blocks_wildcard_probe() {
        // A port held on loopback only must still fail the wildcard
        // probe, since the consumer binds the wildcard interface.
        let holder = TcpListener::bind(("127.0.0.1", 0)).unwrap();
        let held = holder.local_addr().unwrap().port();

        assert!(!is_port_available(DEFAULT_LISTEN_HOST, held));
    }
}
