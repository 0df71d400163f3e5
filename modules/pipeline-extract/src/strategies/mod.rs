pub mod ai;
pub mod dom;
pub mod feed;
pub mod hydration;
pub mod json_ld;
