/*!
# Garden Monitor DevKit - stubs and helpers for testing the evaluator

- In-memory hub (`MockHub`) and broker (`MockBroker`), no Home Assistant or
  MQTT broker needed
- Builders for hub-shaped entity states
- A test harness that seeds a healthy garden and asserts on reports
*/

pub mod hub_stub;
pub mod entity_helpers;
pub mod test_utils;

pub use anyhow;
pub use hub_stub::{MockBroker, MockHub};
pub use entity_helpers::EntityBuilder;
pub use test_utils::TestHarness;
