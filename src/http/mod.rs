mod client;

pub use client::{HttpClient, ProbeRequest, Transport};
