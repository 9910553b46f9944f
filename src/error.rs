//! Error taxonomy: gateway, extraction, stage, and pipeline errors.
//!
//! Only `PipelineError` ever reaches a caller. Everything else is absorbed at
//! a stage boundary and recorded as a `FailureKind` in the result metadata.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Classified remote failure.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum GatewayErrorKind {
  /// DNS failure or connection refused.
  RemoteUnavailable,
  /// HTTP 401.
  RemoteUnauthorized,
  /// HTTP 429.
  RemoteRateLimited,
  /// HTTP 5xx.
  RemoteServerError,
  RemoteUnknownError,
}

impl fmt::Display for GatewayErrorKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let s = match self {
      GatewayErrorKind::RemoteUnavailable => "remote unavailable",
      GatewayErrorKind::RemoteUnauthorized => "remote unauthorized",
      GatewayErrorKind::RemoteRateLimited => "remote rate limited",
      GatewayErrorKind::RemoteServerError => "remote server error",
      GatewayErrorKind::RemoteUnknownError => "remote unknown error",
    };
    f.write_str(s)
  }
}

#[derive(Clone, Debug, Error)]
#[error("{kind}: {message}")]
pub struct GatewayError {
  pub kind: GatewayErrorKind,
  pub message: String,
}

impl GatewayError {
  pub fn new(kind: GatewayErrorKind, message: impl Into<String>) -> Self {
    Self { kind, message: message.into() }
  }
}

#[derive(Clone, Debug, Error, PartialEq)]
pub enum ExtractError {
  #[error("no structured payload found in completion text")]
  NoPayloadFound,
  #[error("malformed structured payload: {0}")]
  MalformedPayload(String),
}

/// Anything that sends a stage down its fallback path.
#[derive(Debug, Error)]
pub enum StageError {
  #[error("no completion gateway configured")]
  GatewayDisabled,
  #[error(transparent)]
  Gateway(#[from] GatewayError),
  #[error(transparent)]
  Extract(#[from] ExtractError),
  #[error("payload failed validation: {0}")]
  ValidationFailed(String),
}

impl StageError {
  pub fn kind(&self) -> FailureKind {
    match self {
      StageError::GatewayDisabled => FailureKind::GatewayDisabled,
      StageError::Gateway(e) => FailureKind::Remote(e.kind),
      StageError::Extract(ExtractError::NoPayloadFound) => FailureKind::NoPayloadFound,
      StageError::Extract(ExtractError::MalformedPayload(_)) => FailureKind::MalformedPayload,
      StageError::ValidationFailed(_) => FailureKind::ValidationFailed,
    }
  }
}

/// Enum-level reason a stage fell back. Carried in result metadata; wording is
/// left to the presentation layer.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
  GatewayDisabled,
  Remote(GatewayErrorKind),
  NoPayloadFound,
  MalformedPayload,
  ValidationFailed,
  /// The stage itself did not complete (panicked).
  HardFault,
}

/// The only error `Pipeline::run` returns.
#[derive(Debug, Error)]
pub enum PipelineError {
  #[error("invalid generation options: {0}")]
  PreconditionViolation(String),
}
