pub mod debug;
pub mod decode;
pub mod source;

pub use debug::send_store_request;
pub use decode::*;
pub use source::*;
