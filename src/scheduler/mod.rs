mod clock;
mod live;

pub use clock::{Clock, ManualClock, SimulatedClock, SystemClock};
pub use live::{LiveScheduler, RenderBatch, SchedulerError, EVENT_BUFFER};
