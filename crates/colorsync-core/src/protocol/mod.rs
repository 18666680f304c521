//! Protocol module containing message types and the JSON codec.

pub mod codec;
pub mod messages;

pub use codec::{decode_inbound, decode_message, decode_outbound, encode_message, ProtocolError};
pub use messages::*;
