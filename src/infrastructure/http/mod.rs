//! HTTP infrastructure - outbound client

mod client;

pub use client::HttpClient;
