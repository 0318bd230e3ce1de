pub mod connection;
pub mod dispatcher;
pub mod events;

pub use dispatcher::Dispatcher;
pub use events::RealtimeEvent;
