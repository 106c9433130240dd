pub mod actor;
pub mod analysis;
pub mod request;
