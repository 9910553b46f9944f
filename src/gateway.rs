//! Completion gateway seam: the only place the pipeline talks to a remote model.
//!
//! Implementations issue exactly one request per call and never retry. A
//! classified failure is returned as `GatewayError`; the stages turn it into
//! a fallback.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::GatewayError;

/// Logical model name resolved through the configured model table.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ModelAlias {
  Text,
  Chat,
  Analysis,
  Coding,
}

impl ModelAlias {
  pub fn as_str(&self) -> &'static str {
    match self {
      ModelAlias::Text => "text",
      ModelAlias::Chat => "chat",
      ModelAlias::Analysis => "analysis",
      ModelAlias::Coding => "coding",
    }
  }
}

/// Sampling options forwarded to the provider.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CompletionOptions {
  pub max_tokens: u32,
  pub temperature: f32,
  pub top_p: f32,
  pub frequency_penalty: f32,
  pub presence_penalty: f32,
}

impl Default for CompletionOptions {
  fn default() -> Self {
    Self { max_tokens: 2000, temperature: 0.3, top_p: 1.0, frequency_penalty: 0.0, presence_penalty: 0.0 }
  }
}

#[derive(Clone, Copy, Debug, Default, Serialize, PartialEq, Eq)]
pub struct Usage {
  pub prompt_tokens: u32,
  pub completion_tokens: u32,
  pub total_tokens: u32,
}

/// Raw completion text plus usage accounting.
#[derive(Clone, Debug, PartialEq)]
pub struct Completion {
  pub text: String,
  pub usage: Usage,
}

#[async_trait]
pub trait CompletionGateway: Send + Sync {
  async fn send_completion(
    &self,
    prompt: &str,
    alias: ModelAlias,
    options: &CompletionOptions,
  ) -> Result<Completion, GatewayError>;
}

#[cfg(test)]
pub mod stub {
  //! Scripted gateways for stage and pipeline tests.

  use std::sync::atomic::{AtomicUsize, Ordering};
  use std::sync::Mutex;

  use super::*;
  use crate::error::GatewayErrorKind;

  /// Replies from a queue; when the queue runs dry it repeats the last reply.
  pub struct ScriptedGateway {
    replies: Mutex<Vec<Result<String, GatewayErrorKind>>>,
    pub calls: AtomicUsize,
    pub prompts: Mutex<Vec<(ModelAlias, String)>>,
  }

  impl ScriptedGateway {
    pub fn new(replies: Vec<Result<String, GatewayErrorKind>>) -> Self {
      Self { replies: Mutex::new(replies), calls: AtomicUsize::new(0), prompts: Mutex::new(Vec::new()) }
    }

    pub fn always(reply: Result<String, GatewayErrorKind>) -> Self {
      Self::new(vec![reply])
    }

    pub fn call_count(&self) -> usize {
      self.calls.load(Ordering::SeqCst)
    }
  }

  #[async_trait]
  impl CompletionGateway for ScriptedGateway {
    async fn send_completion(
      &self,
      prompt: &str,
      alias: ModelAlias,
      _options: &CompletionOptions,
    ) -> Result<Completion, GatewayError> {
      self.calls.fetch_add(1, Ordering::SeqCst);
      self.prompts.lock().unwrap().push((alias, prompt.to_string()));
      let reply = {
        let mut q = self.replies.lock().unwrap();
        if q.len() > 1 { q.remove(0) } else { q[0].clone() }
      };
      match reply {
        Ok(text) => Ok(Completion { text, usage: Usage::default() }),
        Err(kind) => Err(GatewayError::new(kind, "scripted failure")),
      }
    }
  }

  /// Panics on every call: models a stage that cannot complete at all.
  pub struct PanickingGateway;

  #[async_trait]
  impl CompletionGateway for PanickingGateway {
    async fn send_completion(
      &self,
      _prompt: &str,
      _alias: ModelAlias,
      _options: &CompletionOptions,
    ) -> Result<Completion, GatewayError> {
      panic!("provider client crashed");
    }
  }
}
