use thiserror::Error;

/// Errors raised while validating adapter configuration.
///
/// These surface at construction time, before anything touches the network.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("required field '{0}' must not be empty")]
    EmptyField(&'static str),

    #[error("unknown measurement kind '{0}'. Supported kinds: air, road.")]
    UnknownKind(String),

    #[error(
        "no sensor named '{0}' is configured.\n\
         Hint: run `trv-weather add` first."
    )]
    UnknownSensor(String),

    #[error("a sensor named '{0}' is already configured")]
    DuplicateSensor(String),

    #[error(
        "no API key configured.\n\
         Hint: run `trv-weather configure` and enter your Trafikverket API key."
    )]
    MissingApiKey,
}

/// Errors raised by a single fetch attempt.
///
/// A fetch failure is never fatal: the fetcher logs it, keeps its previous
/// value, and stays callable on the next cycle.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("parse error: {0}")]
    Parse(String),
}
