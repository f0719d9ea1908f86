//! Coordinate ascent: direct metric optimization of linear weights, one feature at a time

mod observer;
mod params;
mod solve;

pub use self::observer::{Callback, LogObserver, Observer, Silent};
pub use self::params::Params;
pub use solve::solve;
