use thiserror_no_std::Error;

/// The error returned when the value behind a [`LinkedPtr`](crate::LinkedPtr) cannot be accessed in the requested way
#[derive(Debug, Error, Copy, Clone, Eq, PartialEq)]
pub enum AccessError {
    #[error("the pointer does not hold a value")]
    Null,
    #[error("the value is shared by {ring_len} pointers")]
    Shared { ring_len: usize },
}
