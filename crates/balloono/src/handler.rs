//! Wire-level entry points for the request layer in front of the server.
//!
//! The HTTP (or any other) front end stays thin: it hands request bodies
//! to these methods and writes the returned bytes back. Decoding and
//! encoding go through the server's [`Codec`].

use balloono_protocol::{Codec, InputRequest, JoinRequest, PlayerId, RoomKey};

use crate::{BalloonoError, BalloonoServer};

impl BalloonoServer {
    /// Handles a join body (`{"room": "...", "name": "..."}`, both
    /// optional) and returns the encoded [`JoinResponse`].
    ///
    /// [`JoinResponse`]: balloono_protocol::JoinResponse
    pub async fn handle_join(&self, body: &[u8]) -> Result<Vec<u8>, BalloonoError> {
        let request: JoinRequest = self.codec.decode(body)?;
        let room = request.room.as_deref().unwrap_or(RoomKey::DEFAULT);
        let name = request.name.as_deref().unwrap_or_default();

        let response = self.join(room, name).await?;
        Ok(self.codec.encode(&response)?)
    }

    /// Handles an input body (`{"roomId", "playerId", "move",
    /// "placeBalloon", "placeBanana"}`).
    ///
    /// Only a body that doesn't decode is an error; everything else is
    /// queued or dropped like [`submit_input`](Self::submit_input).
    pub async fn handle_input(&self, body: &[u8]) -> Result<(), BalloonoError> {
        let request: InputRequest = self.codec.decode(body)?;
        self.submit_input(request.room_id.as_str(), request.player_id, request.input)
            .await;
        Ok(())
    }

    /// Returns the encoded latest snapshot of `room`.
    pub async fn handle_state(&self, room: &str, player_id: PlayerId) -> Result<Vec<u8>, BalloonoError> {
        let snapshot = self.get_snapshot(room, player_id).await?;
        Ok(self.codec.encode(&*snapshot)?)
    }
}
