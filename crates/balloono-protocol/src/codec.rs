//! Turning wire types into bytes and back.
//!
//! The request layer in front of the server owns the bodies; it runs
//! them through a [`Codec`] to get an [`InputRequest`](crate::InputRequest)
//! or [`JoinRequest`](crate::JoinRequest), and encodes the
//! [`Snapshot`](crate::Snapshot) or [`JoinResponse`](crate::JoinResponse)
//! it sends back. Browser clients speak JSON, hence [`JsonCodec`].

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// Body format shared by every request handler for the server's lifetime.
pub trait Codec: Send + Sync + 'static {
    /// # Errors
    /// [`ProtocolError::Encode`] if the value can't be represented.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// # Errors
    /// [`ProtocolError::Decode`] for malformed or truncated bodies and
    /// for fields of the wrong type.
    fn decode<T: DeserializeOwned>(&self, body: &[u8]) -> Result<T, ProtocolError>;
}

/// JSON bodies with the client's camelCase field names (`placeBalloon`,
/// `serverTime`, ...).
///
/// ```rust
/// use balloono_protocol::{Codec, InputCommand, JsonCodec};
///
/// let input: InputCommand = JsonCodec
///     .decode(br#"{"move": -1, "placeBalloon": true}"#)
///     .unwrap();
/// assert_eq!(input.direction(), -1);
/// assert!(input.place_balloon && !input.place_banana);
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, body: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(body).map_err(ProtocolError::Decode)
    }
}
