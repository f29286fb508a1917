//! Scheduling-and-playback core.
//!
//! Covers window evaluation, player process supervision, track
//! sequencing, and the session state machine shared by the agent ticks.

pub mod controller;
pub mod player;
pub mod progress;
pub mod sequencer;
pub mod supervisor;
pub mod window;
