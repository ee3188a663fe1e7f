pub mod assertions;
pub mod mocks;
pub mod setup;

// Re-export main utilities for use by test files
#[allow(unused_imports)]
pub use assertions::{GameView, StateAssertion};
#[allow(unused_imports)]
pub use mocks::{MockReceiver, MockSender, Outbound, StalledSender};
#[allow(unused_imports)]
pub use setup::{TestClient, TestSetup, TestSetupBuilder};
