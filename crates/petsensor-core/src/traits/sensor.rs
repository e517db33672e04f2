// # Sensor Trait
//
// Defines the public contract of a polling record producer.
//
// A sensor fetches data from an external web service, turns it into
// uniform records and protects itself from being asked too often. It must
// never become unresponsive because of the service: throttling and
// transient failures degrade to cached data.
//
// ## Implementations
//
// - Petfinder shelter listings: `PetFinderSensor`
//
// ## Usage
//
// ```rust,ignore
// use petsensor_core::Sensor;
//
// async fn poll(sensor: &mut dyn Sensor) -> petsensor_core::Result<()> {
//     if sensor.has_updates(None).await? == 1 {
//         tokio::time::sleep(sensor.min_call_interval()).await;
//         for record in sensor.get_content(None).await? {
//             println!("{}: {}", record.title, record.summary);
//         }
//     }
//     Ok(())
// }
// ```

use async_trait::async_trait;
use std::time::Duration;

use crate::normalize::NormalizedRecord;

/// Trait for sensor implementations
///
/// # Token
///
/// `has_updates` and `get_content` accept a `token` for interface
/// compatibility with callers that pass an identifier previously issued by
/// the sensor. The current implementations ignore it; it is not a cursor.
///
/// # Concurrency
///
/// Every operation takes `&mut self`. A sensor is driven by one caller at a
/// time.
#[async_trait]
pub trait Sensor: Send {
    /// Human-readable sensor name
    fn name(&self) -> &str;

    /// Minimum pause a caller must leave between `has_updates` and
    /// `get_content` for both to be allowed a live call
    fn min_call_interval(&self) -> Duration;

    /// Whether new records are available
    ///
    /// # Returns
    ///
    /// - `Ok(1)`: A live call is permitted and at least one record is newer
    ///   than the watermark
    /// - `Ok(0)`: Otherwise
    /// - `Err(Error::NoDataAvailable)`: Neither live data nor cache available
    async fn has_updates(&mut self, token: Option<&str>) -> Result<u32, crate::Error>;

    /// Records newer than the watermark, in upstream order
    ///
    /// Advances the watermark. Not idempotent.
    async fn get_content(
        &mut self,
        token: Option<&str>,
    ) -> Result<Vec<NormalizedRecord>, crate::Error>;

    /// All currently available records, in upstream order
    ///
    /// Does not touch the watermark.
    async fn get_all(&mut self) -> Result<Vec<NormalizedRecord>, crate::Error>;
}
