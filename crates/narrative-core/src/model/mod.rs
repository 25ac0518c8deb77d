pub mod notification;
pub mod share;
