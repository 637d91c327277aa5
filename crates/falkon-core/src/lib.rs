//! Core library for Falkon.
//!
//! Contains the contact [`Message`] model, the server clock, the append-only
//! [`MessageStore`], the [`MessageService`] seam shared by the server and the
//! client SDK, and the [`ContactForm`] submission shim that drives form
//! feedback. This crate depends on `falkon-storage` for the backend trait and
//! knows nothing about HTTP.
//!
//! [`Message`]: message::Message
//! [`MessageStore`]: store::MessageStore
//! [`MessageService`]: service::MessageService
//! [`ContactForm`]: submission::ContactForm

pub mod clock;
pub mod error;
pub mod message;
pub mod service;
pub mod store;
pub mod submission;
