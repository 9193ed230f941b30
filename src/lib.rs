pub mod aggregate;
pub mod error;
pub mod ingest;
pub mod log;
pub mod series;
pub mod unit;

pub use error::{ErrorKind, IngestError, Result};

#[cfg(test)]
mod test;
