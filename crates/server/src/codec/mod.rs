//! Wire encoding of responses.
//!
//! [`HeadEncoder`] writes the status line and header block, [`ResponseEncoder`]
//! drives a whole response through head, body chunks and end of body.

mod head_encoder;
mod response_encoder;

pub use head_encoder::HeadEncoder;
pub use response_encoder::Frame;
pub use response_encoder::ResponseEncoder;
