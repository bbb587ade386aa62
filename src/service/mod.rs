pub mod admin;
pub mod application;
pub mod dispatch;
pub mod event;
pub mod forms;
pub mod log;
pub mod registration;
pub mod schedule;
