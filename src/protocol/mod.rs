//! HTTP command translation
//!
//! This module turns form fields into store commands and store results into
//! JSON replies.

pub mod command;
pub mod form;
pub mod get;
pub mod qpop;
pub mod qpush;
pub mod reply;
pub mod set;

pub use command::CommandFactory;
pub use form::FormFields;
pub use reply::Reply;
