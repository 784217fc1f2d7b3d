pub mod state;

pub use state::{PlaybackState, Status};
