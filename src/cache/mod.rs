//! Cache module for memoizing API responses in memory
//!
//! This module provides an expiring cache that stores raw response bytes keyed
//! by request URL. A background reaper sweeps stale entries once per interval,
//! so repeated requests inside that window never reach the network.

mod expiring;

pub use expiring::{CacheError, ExpiringCache};
