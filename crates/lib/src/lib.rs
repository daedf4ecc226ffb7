//! mesh-relay core library: routes commands from a radio mesh to a chat gateway and routes
//! chat replies back to the originating mesh device.

pub mod channels;
pub mod command;
pub mod config;
pub mod correlation;
pub mod gateway;
pub mod info;
pub mod init;
pub mod ratelimit;
pub mod readiness;
pub mod router;
