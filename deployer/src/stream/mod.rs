//! Stack event streaming

pub mod fsm;
pub mod streamer;
