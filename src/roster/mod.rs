mod events;
mod reconciler;
mod types;

pub use events::{tick_events, RenderEvent};
pub use reconciler::Reconciler;
pub use types::{RosterDiff, RosterEntry, Visibility};
