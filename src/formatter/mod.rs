pub mod json;

pub use json::{Envelope, JsonFormatter, ResponseData, Status};
