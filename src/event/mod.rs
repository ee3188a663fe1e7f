// Event-driven communication between connections
//
// Every session owns a topic on the bus, named after its id. Anything that
// changes a session publishes on that topic and every connection watching the
// session re-renders its view.

// Public API - what other modules can use
pub use bus::{EventBus, Subscription};
pub use events::SessionEvent;

// Internal modules
mod bus;
mod events;
