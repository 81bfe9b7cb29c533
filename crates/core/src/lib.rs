#![forbid(unsafe_code)]

pub mod lint;
pub mod model;
pub mod selector;
pub mod shuffle;
pub mod time;
pub mod view;

pub use selector::{SelectionMode, SelectionState};
pub use shuffle::{ShuffleResult, shuffle};
pub use time::Clock;
pub use view::View;
