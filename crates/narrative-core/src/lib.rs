//! Share requests for narratives: validate who wants access to a workspace,
//! look up its admins and tell them through the feeds service.

pub mod config;
pub mod error;
pub mod feeds;
pub mod model;
pub mod sharing;
pub mod storage;
pub mod workspace;
