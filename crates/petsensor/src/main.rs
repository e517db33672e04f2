// # petsensor - Polling Sensor Runner
//
// Thin integration layer: reads configuration from environment variables,
// installs logging, builds a PetFinderSensor and runs one operation.
// All sensor logic lives in petsensor-core.
//
// ## Configuration
//
// - `PETSENSOR_STATE_DIR`: Directory holding `petfindersensor.json` and the
//   cached response (default: current directory)
// - `PETSENSOR_LOG_LEVEL`: trace, debug, info, warn, error (default: info)
// - `PETSENSOR_HTTP_TIMEOUT_SECS`: Overall request timeout (default: 30)
//
// ## Operations
//
// The first argument selects what to run:
//
// - `all` (default): print every available record
// - `has-updates`: print 1 if new records are available, else 0 (exit
//   status is 0 either way; test the printed value)
// - `content`: print the new records and advance the watermark
//
// ## Example
//
// ```bash
// export PETSENSOR_STATE_DIR=/var/lib/petsensor
// if [ "$(petsensor has-updates)" = 1 ]; then
//     sleep 11 && petsensor content
// fi
// ```

use anyhow::{Context, Result, bail};
use petsensor_core::{Error, FileDocumentStore, NormalizedRecord, PetFinderSensor, Sensor};
use petsensor_http::ReqwestTransport;
use std::env;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

/// Exit codes for different termination scenarios
#[derive(Debug, Clone, Copy)]
enum SensorExitCode {
    /// Operation completed
    Success = 0,
    /// Configuration error or unusable settings
    ConfigError = 1,
    /// No data could be produced
    RuntimeError = 2,
}

impl From<SensorExitCode> for ExitCode {
    fn from(code: SensorExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Operation selected on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operation {
    All,
    HasUpdates,
    Content,
}

impl Operation {
    fn parse(arg: Option<&str>) -> Result<Self> {
        match arg {
            None | Some("all") => Ok(Self::All),
            Some("has-updates") => Ok(Self::HasUpdates),
            Some("content") => Ok(Self::Content),
            Some(other) => bail!(
                "Unknown operation '{}' (expected all, has-updates or content)",
                other
            ),
        }
    }
}

/// What an operation prints on stdout
enum Output {
    Records(Vec<NormalizedRecord>),
    /// `has-updates` result, printed bare so shells can compare it
    Count(u32),
}

impl Output {
    fn render(&self) -> Result<String> {
        Ok(match self {
            Output::Records(records) => serde_json::to_string_pretty(records)?,
            Output::Count(count) => count.to_string(),
        })
    }
}

/// Application configuration
struct Config {
    state_dir: String,
    log_level: String,
    http_timeout: Duration,
    operation: Operation,
}

impl Config {
    /// Load configuration from environment variables and arguments
    fn from_env() -> Result<Self> {
        let http_timeout_secs = match env::var("PETSENSOR_HTTP_TIMEOUT_SECS") {
            Ok(raw) => raw
                .parse::<u64>()
                .with_context(|| format!("PETSENSOR_HTTP_TIMEOUT_SECS is not a number: {}", raw))?,
            Err(_) => 30,
        };
        if http_timeout_secs == 0 {
            bail!("PETSENSOR_HTTP_TIMEOUT_SECS must be > 0");
        }

        let arg = env::args().nth(1);

        Ok(Self {
            state_dir: env::var("PETSENSOR_STATE_DIR").unwrap_or_else(|_| ".".to_string()),
            log_level: env::var("PETSENSOR_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            http_timeout: Duration::from_secs(http_timeout_secs),
            operation: Operation::parse(arg.as_deref())?,
        })
    }
}

fn main() -> ExitCode {
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return SensorExitCode::ConfigError.into();
        }
    };

    let log_level = match config.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    // Logs go to stderr so stdout stays machine-readable
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return SensorExitCode::ConfigError.into();
    }

    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return SensorExitCode::RuntimeError.into();
        }
    };

    rt.block_on(async {
        match run(config).await {
            Ok(()) => SensorExitCode::Success,
            Err(e) => {
                error!("{:#}", e);
                match e.downcast_ref::<Error>() {
                    Some(Error::ConfigUnavailable(_)) => SensorExitCode::ConfigError,
                    _ => SensorExitCode::RuntimeError,
                }
            }
        }
    })
    .into()
}

/// Build the sensor and run the selected operation
async fn run(config: Config) -> Result<()> {
    let store = FileDocumentStore::new(&config.state_dir).await?;
    let transport = ReqwestTransport::with_timeouts(Duration::from_secs(10), config.http_timeout)?;

    let mut sensor = PetFinderSensor::new(Arc::new(store), Box::new(transport)).await?;
    info!("This is me : {}", sensor);

    let output = match config.operation {
        Operation::All => Output::Records(sensor.get_all().await?),
        Operation::HasUpdates => {
            let available = sensor.has_updates(None).await?;
            info!(
                "Wait at least {:?} before requesting content for a live call",
                sensor.min_call_interval()
            );
            Output::Count(available)
        }
        Operation::Content => Output::Records(sensor.get_content(None).await?),
    };

    println!("{}", output.render()?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_parse() {
        assert_eq!(Operation::parse(None).unwrap(), Operation::All);
        assert_eq!(Operation::parse(Some("all")).unwrap(), Operation::All);
        assert_eq!(
            Operation::parse(Some("has-updates")).unwrap(),
            Operation::HasUpdates
        );
        assert_eq!(Operation::parse(Some("content")).unwrap(), Operation::Content);
        assert!(Operation::parse(Some("everything")).is_err());
    }

    #[test]
    fn test_has_updates_prints_a_bare_flag() {
        assert_eq!(Output::Count(1).render().unwrap(), "1");
        assert_eq!(Output::Count(0).render().unwrap(), "0");
        assert_eq!(Output::Records(Vec::new()).render().unwrap(), "[]");
    }
}
