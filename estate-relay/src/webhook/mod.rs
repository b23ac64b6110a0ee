mod client;

pub use client::{UpstreamReply, WebhookClient};
