//! Speech synthesis provider.

mod client;

pub use client::HttpSpeechClient;
