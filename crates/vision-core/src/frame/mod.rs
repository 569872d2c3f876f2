//! Frame encoding for the detector socket.
//!
//! Frames travel as text: a JPEG wrapped in a `data:image/jpeg;base64,...`
//! URL.  The detector answers with strings of the same shape.

pub mod codec;
pub mod scale;

pub use codec::{decode_data_url, encode_jpeg, encode_jpeg_data_url, FrameCodecError, JPEG_QUALITY};
pub use scale::scale_to;
