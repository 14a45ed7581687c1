//! Media source services.
//!
//! - `source` - Source and registry traits shared by every backend
//! - `mpris` - MPRIS players over the D-Bus session bus
//! - `device_cache` - TTL-bounded list of discovered sources
//! - `rotator` - Round-robin status rotation across active sources

pub mod device_cache;
pub mod mpris;
pub mod rotator;
pub mod source;

#[cfg(test)]
pub mod testing;
