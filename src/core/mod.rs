pub mod error;

pub use error::{EngineError, ObservationError};
