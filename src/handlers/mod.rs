//! HTTP handlers for the admin interface.

pub mod collections;
pub mod items;
pub mod login;
