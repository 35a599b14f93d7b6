mod driver;
mod engine;
pub mod input;
mod model;
mod store;

pub use driver::{Driver, DriverHandle, DriverTicket, ManualDriver, TokioDriver, TICK_INTERVAL};
pub use engine::TimerEngine;
pub use model::{format_clock, NewTimer, Timer, TimerId, TimerMode, TimerTarget, MAX_TITLE_LEN};
pub use store::TimerStore;
