use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    // Frame errors
    #[error("Bit index {index} out of range for frame of capacity {capacity}")]
    BitIndexOutOfRange { index: usize, capacity: usize },

    #[error("Value {value} does not fit in {width}-bit {field} field")]
    FieldOverflow {
        field: &'static str,
        value: u32,
        width: usize,
    },

    // Platform errors
    #[error("Unknown platform class: {0}")]
    UnknownPlatform(String),
}

pub type Result<T> = std::result::Result<T, Error>;
