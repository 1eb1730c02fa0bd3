//! Platform services consumed by the driver
//!
//! The driver logs through the `log` facade, so the only services the
//! hosting firmware has to supply are delays used between status polls.

use maybe_async::maybe_async;

/// Delay primitives supplied by the host
#[maybe_async(AFIT)]
pub trait Platform {
    /// Delay for the specified number of microseconds
    async fn delay_us(&mut self, us: u32);

    /// Delay for the specified number of milliseconds
    async fn delay_ms(&mut self, ms: u32) {
        self.delay_us(ms.saturating_mul(1_000)).await
    }
}

/// Adapter from an `embedded-hal` delay provider
///
/// Wraps `embedded_hal::delay::DelayNs` with `is_sync`, and
/// `embedded_hal_async::delay::DelayNs` otherwise.
pub struct HalDelay<D> {
    delay: D,
}

impl<D> HalDelay<D> {
    /// Wrap a delay provider
    pub fn new(delay: D) -> Self {
        Self { delay }
    }

    /// Return the wrapped delay provider
    pub fn into_inner(self) -> D {
        self.delay
    }
}

#[cfg(feature = "is_sync")]
impl<D: embedded_hal::delay::DelayNs> Platform for HalDelay<D> {
    fn delay_us(&mut self, us: u32) {
        self.delay.delay_us(us)
    }

    fn delay_ms(&mut self, ms: u32) {
        self.delay.delay_ms(ms)
    }
}

#[cfg(not(feature = "is_sync"))]
impl<D: embedded_hal_async::delay::DelayNs> Platform for HalDelay<D> {
    async fn delay_us(&mut self, us: u32) {
        self.delay.delay_us(us).await
    }

    async fn delay_ms(&mut self, ms: u32) {
        self.delay.delay_ms(ms).await
    }
}

/// Platform for hosted builds: sleeps the calling thread
#[cfg(all(feature = "std", feature = "is_sync"))]
#[derive(Debug, Clone, Copy, Default)]
pub struct StdPlatform;

#[cfg(all(feature = "std", feature = "is_sync"))]
impl Platform for StdPlatform {
    fn delay_us(&mut self, us: u32) {
        std::thread::sleep(std::time::Duration::from_micros(us as u64));
    }
}
