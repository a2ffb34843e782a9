//! Status record serving
//!
//! One polling client, request-triggered: the node waits for two
//! consecutive line terminators on the inbound stream (any well-formed
//! line-oriented request qualifies, content is never parsed), then replies
//! with the raw bytes of the current status record exactly once. The
//! caller closes the connection afterwards.
//!
//! Completing a request/reply cycle services the platform watchdog. If no
//! client is served within the watchdog deadline the platform restarts the
//! whole node, which is the accepted recovery path for stalled network
//! peers. Listen/accept mechanics and socket ownership stay with the
//! consuming firmware.

use embassy_time::Duration;
use embedded_io_async::{Read, Write};

use crate::system::snapshot::SnapshotCell;

/// Watchdog deadline of the reference deployment, informational only;
/// enforcement lives in the platform
pub const WATCHDOG_DEADLINE: Duration = Duration::from_secs(8);

/// Read chunk size; requests are short, one line plus its terminator
const READ_BUF_LEN: usize = 64;

/// Hook for servicing the platform watchdog.
pub trait Watchdog {
    /// Resets the watchdog countdown.
    fn feed(&mut self);
}

impl<F: FnMut()> Watchdog for F {
    fn feed(&mut self) {
        self()
    }
}

/// Detects the end of an inbound request: two consecutive `\n`, with `\r`
/// ignored. Use a fresh detector per connection.
pub struct RequestDetector {
    line_blank: bool,
}

impl RequestDetector {
    pub const fn new() -> Self {
        Self { line_blank: true }
    }

    /// Feeds one inbound byte; true once a blank line completes the request.
    pub fn feed(&mut self, byte: u8) -> bool {
        match byte {
            b'\n' if self.line_blank => true,
            b'\n' => {
                self.line_blank = true;
                false
            }
            b'\r' => false,
            _ => {
                self.line_blank = false;
                false
            }
        }
    }
}

impl Default for RequestDetector {
    fn default() -> Self {
        Self::new()
    }
}

/// Serves one request/reply cycle on an accepted connection.
///
/// Reads until a complete request is seen, feeds the watchdog, then sends
/// the current status record once. A peer that disconnects before
/// completing a request gets nothing, and the watchdog is not fed. The
/// caller closes the connection in either case.
pub async fn serve_once<C, const LEN: usize>(
    conn: &mut C,
    snapshot: &SnapshotCell<LEN>,
    watchdog: &mut impl Watchdog,
) -> Result<(), C::Error>
where
    C: Read + Write,
{
    let mut detector = RequestDetector::new();
    let mut buf = [0u8; READ_BUF_LEN];

    'request: loop {
        let n = conn.read(&mut buf).await?;
        if n == 0 {
            warn!("peer closed before completing a request");
            return Ok(());
        }
        for &byte in &buf[..n] {
            if detector.feed(byte) {
                break 'request;
            }
        }
    }

    watchdog.feed();

    let mut record = [0u8; LEN];
    snapshot.read_into(&mut record);
    conn.write_all(&record).await?;
    conn.flush().await?;
    info!("status record served, {} bytes", LEN);
    Ok(())
}
