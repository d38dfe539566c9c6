//! TimeSync: a group scheduling poll. A creator picks candidate weekdays
//! and a daily time window; participants mark 15-minute slots they are
//! free; the engine aggregates the marks into an overlap grid and suggests
//! the best single time and the longest viable consecutive block.

pub mod availability;
pub mod display;
pub mod error;
pub mod export;
pub mod parser;
pub mod poll;
pub mod schedule;
pub mod storage;
pub mod web;
