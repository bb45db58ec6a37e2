pub mod envelope;
pub mod handlers;
pub mod routes;

pub use envelope::{translate_store_error, ApiReply, Envelope, ErrorReply, Status};
pub use routes::create_router;
