//! Two small HTTP services for real-estate deal intake.
//!
//! * The webhook relay forwards POST bodies to an n8n workflow and hands the
//!   workflow's answer back unchanged.
//! * The extraction service accepts an offering document, runs it through a
//!   hosted assistant with file search, and returns the assistant's reply.

pub mod api;
pub mod assistants;
pub mod config;
pub mod error;
pub mod extraction;
pub mod server;
pub mod webhook;
