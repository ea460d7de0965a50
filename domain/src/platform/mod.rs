//! Platform connection model.

pub mod connection;
pub mod spec;

pub use connection::ConnectionState;
pub use spec::PlatformSpec;
