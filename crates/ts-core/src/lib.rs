//! ts-core: stable foundation for thermosweep.
//!
//! Contains:
//! - units (uom SI types + constructors for the rig's quantities)
//! - numeric (Real + tolerances + float helpers)
//! - clock (monotonic timebase shared by the control loop and instruments)
//! - error (shared error types)

pub mod clock;
pub mod error;
pub mod numeric;
pub mod units;

// Re-exports: nice ergonomics for downstream crates
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{TsError, TsResult};
pub use numeric::*;
pub use units::*;
