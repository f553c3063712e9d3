pub mod command;
pub mod error;
pub mod event;
pub mod formatter;
pub mod locator;
pub mod outcome;
pub mod request;
pub mod runner;
pub mod state;
pub mod summary;

pub use error::ErrorKind;
pub use event::RunEvent;
pub use locator::{check_engine, Locator};
pub use outcome::ConversionOutcome;
pub use request::ConversionRequest;
pub use runner::{ConversionHandle, Runner};
pub use state::RunState;
