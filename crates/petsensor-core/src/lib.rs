// # petsensor-core
//
// Core library for the polling adoptable-animal sensor.
//
// ## Architecture Overview
//
// - **Transport**: Trait for the upstream HTTP call
// - **DocumentStore**: Trait for persisting settings and the cached response
// - **throttle**: Self-imposed rate limiter over persisted bookkeeping
// - **fetch**: Live call with cache fallback
// - **normalize**: Upstream items → stable records
// - **change**: Records newer than the watermark
// - **Sensor**: Public contract; `PetFinderSensor` implements it
//
// ## Design Principles
//
// 1. **Never crash the caller**: Throttling, network and schema failures
//    degrade to cached data; only missing settings and total data loss surface
// 2. **Attempts are counted**: Usage is persisted before every live call
// 3. **Library-First**: Logging setup and process concerns live in the binary
// 4. **Single caller**: Every operation takes `&mut self`; the core never sleeps

pub mod traits;
pub mod config;
pub mod error;
pub mod state;
pub mod store;
pub mod payload;
pub mod throttle;
pub mod fetch;
pub mod normalize;
pub mod change;
pub mod sensor;

// Re-export core types for convenience
pub use traits::{DocumentStore, Sensor, Transport, TransportResponse};
pub use config::{CounterThrottle, IntervalThrottle, Settings, Throttle};
pub use error::{Error, Result};
pub use state::{FileDocumentStore, MemoryDocumentStore};
pub use store::{ConfigStore, RecordCache};
pub use payload::RawPayload;
pub use fetch::{FallbackReason, Fetched, PayloadSource};
pub use normalize::NormalizedRecord;
pub use sensor::PetFinderSensor;
