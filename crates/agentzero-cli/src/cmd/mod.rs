pub mod init;
pub mod mcs;
pub mod relay;
pub mod reports;
pub mod serve;
