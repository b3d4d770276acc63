//! Protocol Module
//!
//! Defines the RESP-style wire protocol shared by clients and the AOF.
//!
//! ## Frame Format
//!
//! One frame encodes one [`Value`]. The first byte is the type prefix and
//! every header line ends in CRLF.
//!
//! ```text
//! +OK\r\n                          simple string
//! -ERR unknown command\r\n         error
//! :1000\r\n                        integer
//! $5\r\nhello\r\n                  bulk string   ($-1\r\n = null)
//! *2\r\n$3\r\nGET\r\n$1\r\nk\r\n   array         (*-1\r\n = null)
//! ```
//!
//! ### Requests
//! A request is a top-level array whose first element names the command
//! (case-insensitive) and whose remaining elements are the arguments.
//!
//! The AOF stores requests in exactly this encoding, back to back.

mod value;
mod request;
pub mod codec;

pub use value::Value;
pub use request::{Request, RequestError};
pub use codec::{decode, encode, encode_into, read_value, write_value};
