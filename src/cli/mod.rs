//! Operator commands that run against the archive without the HTTP server.

pub mod backup;
pub mod init;
pub mod reflect;
pub mod stats;
pub mod trace;

pub use backup::backup;
pub use init::init;
pub use reflect::reflect;
pub use stats::stats;
pub use trace::trace;
