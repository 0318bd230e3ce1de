pub mod chat;
pub mod event;
#[cfg(test)]
pub(crate) mod fixtures;
pub mod preference;
pub mod review;
pub mod rsvp;
pub mod ticket;
mod trim;
pub mod user;
pub mod venue;
