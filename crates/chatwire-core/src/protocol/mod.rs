//! Wire protocol: JSON event envelopes and the room-key function.

pub mod event;
pub mod room;

pub use event::{ClientEvent, ErrorNotice, PresenceChange, SendMessagePayload, ServerEvent};
pub use room::direct_room_id;
