//! Headless testing helpers: manual frames, stream recording.
//!
//! Use [`ManualFrames`] to step tick effects one frame at a time without a
//! clock, and [`Recorder`] to capture what a reactor or unit emits.

pub mod frames;
pub mod recorder;

pub use frames::ManualFrames;
pub use recorder::Recorder;
