//! Web request and response types, the CGI adapter and file-based views.

mod request;
mod response;
mod views;

pub use request::Request;
pub use response::Response;
pub use views::{ViewError, Views};
