//! Shared protocol definitions for `MorseChat`: the Morse codec, message
//! framing and the relay wire format.

pub mod frame;
pub mod morse;
pub mod relay;
