mod slice;
mod status;

pub use slice::Slice;
pub use status::{Code, Result, Status};
