pub mod error;
pub mod events;

pub use error::{EmitError, ListenerPanic, NotifyError};
pub use events::{
    create_event_manager, create_listener_collection, EventManager, ListenerCollection,
    ListenerFn, ListenerId, ListenerRecord, Unsubscribe,
};
