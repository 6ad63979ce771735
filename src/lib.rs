//! Song request pipeline: tail a chat log for requests, clean them up with a
//! language model, resolve them on Spotify and queue them, while mirroring the
//! currently playing track into an overlay file.

pub mod catalog;
pub mod inference;
pub mod log_ring;
pub mod pipeline;
pub mod queue;
pub mod refiner;
pub mod request;
pub mod resolver;
pub mod session;
pub mod status;
pub mod tailer;

#[cfg(test)]
mod test_support;
