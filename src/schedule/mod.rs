pub mod aggregate;
pub mod slot_utils;
pub mod suggest;

pub use aggregate::{aggregate, AggregateCell};
pub use slot_utils::{format_slot, generate_slots, parse_time_to_minutes, poll_slots};
pub use suggest::{suggest, BestSingleSlot, LongestBlock, Suggestions};
