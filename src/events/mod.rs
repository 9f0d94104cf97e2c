//! Synchronous in-process publish/subscribe.
//!
//! # Overview
//!
//! [`ListenerCollection`] is the ordered registry for a single event. Delivery
//! follows subscription order, and listeners may subscribe or unsubscribe
//! (themselves or others) while a notification pass is running.
//!
//! [`EventManager`] maps event names to lazily created collections and routes
//! `emit` calls to them.
//!
//! # Modules
//!
//! - [`listener_collection`]: [`ListenerCollection<T>`], [`Unsubscribe`] tokens.
//! - [`event_manager`]: [`EventManager<T>`].

pub mod event_manager;
pub mod listener_collection;

pub use event_manager::{create_event_manager, EventManager};
pub use listener_collection::{
    create_listener_collection, ListenerCollection, ListenerFn, ListenerId, ListenerRecord,
    Unsubscribe,
};
