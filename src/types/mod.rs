pub mod activity;
pub mod fix;
pub mod session;
