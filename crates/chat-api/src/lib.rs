//! # chat-api
//!
//! reqwest client for the guild REST API: roles, members, channel
//! overrides and message history.

pub mod client;
pub mod dto;
pub mod response;

pub use client::{HttpApiClient, GUILD_HEADER};
pub use dto::{ErrorBody, ErrorDetail, MemberDto, MessageDto, OverrideDto, OverrideKind};
