//! Sensor edge watching
//!
//! Forwards every electrical transition of the rain sensor pin to the
//! debounce state machine, stamped with the microsecond uptime counter.
//!
//! On executors that service GPIO interrupts (embassy and friends) the
//! wakeup itself runs in interrupt context; the handler body here stays
//! bounded and never blocks. Platforms with bare ISRs can instead call
//! [`PulseChannel::on_edge_event`] directly from the vector.

use core::convert::Infallible;

use embedded_hal::digital::InputPin;
use embedded_hal_async::digital::Wait;
use embassy_time::Instant;

use crate::system::accumulator::PulseAccumulator;
use crate::system::debounce::PulseChannel;

/// Watches one sensor pin for the lifetime of the process.
///
/// Errors from the pin are the platform's to produce and the caller's to
/// handle; most GPIO implementations are infallible.
pub async fn pulse_detect<P>(
    pin: &mut P,
    channel: &mut PulseChannel,
    counters: &PulseAccumulator,
) -> Result<Infallible, P::Error>
where
    P: Wait + InputPin,
{
    loop {
        pin.wait_for_any_edge().await?;
        let now_us = Instant::now().as_micros() as u32;
        let level_high = pin.is_high()?;
        channel.on_edge_event(level_high, now_us, counters);
    }
}
