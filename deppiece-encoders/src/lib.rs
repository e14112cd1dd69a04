//! Label encoders.

pub mod dependency;
