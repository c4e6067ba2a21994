pub mod cache;
pub mod expansion;
pub mod session;
pub mod store;
pub mod visibility;
