//! Pipeline orchestrator: generate, validate, execute, report.
//!
//! Sequencing contract: the execution harness is invoked if and only
//! if the safety policy returned a safe verdict and the caller asked
//! for execution. There is no path that executes unvalidated text.

use std::sync::Arc;

use tracing::{debug, info};

use crate::config::Config;
use crate::llm::{CompletionClient, Message};

use super::fences::strip_code_fences;
use super::interp::{execute_source, ExecutionResult};
use super::policy::{SafetyPolicy, REJECTION_REASON};
use super::EngineError;

/// Outcome of the execution stage of a run.
#[derive(Debug)]
pub enum ExecOutcome {
    /// The safety policy rejected the code; nothing was executed.
    Blocked { reason: String },
    /// The harness ran the code. The result may itself be a faulted
    /// completion, reported inside its `stderr`.
    Ran(ExecutionResult),
}

/// Result of one generate-and-run request.
///
/// The generated code is always present once generation succeeded,
/// whatever happened afterwards.
#[derive(Debug)]
pub struct RunReport {
    /// Fence-stripped generated code.
    pub code: String,
    /// `None` when execution was not requested.
    pub outcome: Option<ExecOutcome>,
}

/// The code-generation engine — core of promptforge.
///
/// Holds the completion backend and the safety policy; every request
/// flows through [`Engine::run`] and leaves no state behind.
pub struct Engine {
    config: Config,
    llm: Arc<dyn CompletionClient>,
    policy: SafetyPolicy,
}

impl Engine {
    pub fn new(config: Config, llm: Arc<dyn CompletionClient>) -> Self {
        let policy = SafetyPolicy::new(&config.engine.denylist);
        Self {
            config,
            llm,
            policy,
        }
    }

    /// Asks the completion service for code and normalizes the reply.
    ///
    /// Fails with [`EngineError::MissingCredential`] before any network
    /// call when no API key is configured. Service errors propagate
    /// verbatim as [`EngineError::Generation`].
    pub async fn generate(&self, prompt: &str) -> Result<String, EngineError> {
        if self.config.llm.api_key.is_empty() {
            return Err(EngineError::MissingCredential);
        }

        let messages = [Message::user(prompt)];
        let response = self.llm.complete(&messages).await?;

        debug!(
            "Completion used {} tokens",
            response.input_tokens + response.output_tokens
        );

        Ok(strip_code_fences(&response.text))
    }

    /// Safety verdict for `code`. True means the code may be executed.
    pub fn validate(&self, code: &str) -> bool {
        self.policy.permits(code)
    }

    /// Runs the full pipeline for one prompt.
    ///
    /// - empty prompt → [`EngineError::EmptyPrompt`], nothing generated;
    /// - generation failure → the error, nothing executed;
    /// - `execute` false → report with `outcome: None`;
    /// - unsafe verdict → `ExecOutcome::Blocked`, harness never invoked;
    /// - safe verdict → `ExecOutcome::Ran` with the captured output.
    pub async fn run(&self, prompt: &str, execute: bool) -> Result<RunReport, EngineError> {
        if prompt.trim().is_empty() {
            return Err(EngineError::EmptyPrompt);
        }

        info!("Generating code ({} chars of prompt)", prompt.len());
        let code = self.generate(prompt).await?;
        debug!("Generated {} chars of code", code.len());

        if !execute {
            return Ok(RunReport {
                code,
                outcome: None,
            });
        }

        if !self.validate(&code) {
            return Ok(RunReport {
                code,
                outcome: Some(ExecOutcome::Blocked {
                    reason: REJECTION_REASON.to_string(),
                }),
            });
        }

        info!("Executing generated code");
        let result = execute_source(&code);

        Ok(RunReport {
            code,
            outcome: Some(ExecOutcome::Ran(result)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use crate::config::{EngineConfig, LlmConfig};
    use crate::llm::CompletionResponse;

    /// Scripted completion backend that counts how often it is called.
    struct MockClient {
        reply: Option<String>,
        calls: AtomicUsize,
    }

    impl MockClient {
        fn replying(text: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Some(text.to_string()),
                calls: AtomicUsize::new(0),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                reply: None,
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl CompletionClient for MockClient {
        async fn complete(&self, _messages: &[Message]) -> anyhow::Result<CompletionResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.reply {
                Some(text) => Ok(CompletionResponse {
                    text: text.clone(),
                    input_tokens: 10,
                    output_tokens: 5,
                }),
                None => anyhow::bail!("service unavailable"),
            }
        }

        fn description(&self) -> String {
            "mock".to_string()
        }
    }

    /// Config with an explicit key so tests never read the real
    /// environment.
    fn test_config(api_key: &str) -> Config {
        Config {
            llm: LlmConfig {
                provider: "openai".to_string(),
                model: "gpt-4o-mini".to_string(),
                api_key: api_key.to_string(),
                host: None,
                max_tokens_per_request: 4096,
            },
            engine: EngineConfig::default(),
        }
    }

    fn engine(mock: &Arc<MockClient>) -> Engine {
        Engine::new(test_config("sk-test"), mock.clone())
    }

    // ── End-to-end scenarios ────────────────────────────

    #[tokio::test]
    async fn test_e2e_print_42() {
        let mock = MockClient::replying("print(42)");
        let report = engine(&mock)
            .run("print the number 42", true)
            .await
            .unwrap();

        assert_eq!(report.code, "print(42)");
        match report.outcome {
            Some(ExecOutcome::Ran(result)) => {
                assert_eq!(result.stdout, "42\n");
                assert_eq!(result.stderr, "");
            }
            other => panic!("expected Ran outcome, got {other:?}"),
        }
        assert_eq!(mock.calls(), 1);
    }

    #[tokio::test]
    async fn test_e2e_unsafe_code_blocked() {
        let mock = MockClient::replying("print(os.environ)");
        let report = engine(&mock).run("show the environment", true).await.unwrap();

        assert_eq!(report.code, "print(os.environ)");
        match report.outcome {
            Some(ExecOutcome::Blocked { reason }) => {
                assert_eq!(reason, REJECTION_REASON);
            }
            other => panic!("expected Blocked outcome, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_fence_stripping_applied_to_reply() {
        let mock = MockClient::replying("```python\nprint(42)\n```");
        let report = engine(&mock).run("answer", true).await.unwrap();
        assert_eq!(report.code, "print(42)");
    }

    #[tokio::test]
    async fn test_faulted_execution_is_data_not_error() {
        let mock = MockClient::replying("fail(\"nope\")");
        let report = engine(&mock).run("break", true).await.unwrap();

        match report.outcome {
            Some(ExecOutcome::Ran(result)) => {
                assert_eq!(result.stdout, "");
                assert!(result.stderr.contains("nope"));
            }
            other => panic!("expected Ran outcome, got {other:?}"),
        }
    }

    // ── Short-circuits ──────────────────────────────────

    #[tokio::test]
    async fn test_empty_prompt_rejected_before_generation() {
        let mock = MockClient::replying("print(42)");
        let err = engine(&mock).run("   \n  ", true).await.unwrap_err();
        assert!(matches!(err, EngineError::EmptyPrompt));
        assert_eq!(mock.calls(), 0);
    }

    #[tokio::test]
    async fn test_missing_credential_checked_before_network() {
        let mock = MockClient::replying("print(42)");
        let eng = Engine::new(test_config(""), mock.clone());
        let err = eng.run("anything", true).await.unwrap_err();
        assert!(matches!(err, EngineError::MissingCredential));
        assert_eq!(mock.calls(), 0);
    }

    #[tokio::test]
    async fn test_generation_error_propagates_verbatim() {
        let mock = MockClient::failing();
        let err = engine(&mock).run("anything", true).await.unwrap_err();
        match err {
            EngineError::Generation(e) => {
                assert!(e.to_string().contains("service unavailable"));
            }
            other => panic!("expected Generation error, got {other:?}"),
        }
        assert_eq!(mock.calls(), 1);
    }

    // ── Flag/verdict matrix ─────────────────────────────

    #[tokio::test]
    async fn test_execute_flag_false_skips_validation_and_execution() {
        let mock = MockClient::replying("print(os.environ)");
        let report = engine(&mock).run("anything", false).await.unwrap();
        // Even unsafe code is returned for display when not executing
        assert_eq!(report.code, "print(os.environ)");
        assert!(report.outcome.is_none());
        assert_eq!(mock.calls(), 1);
    }

    #[tokio::test]
    async fn test_harness_runs_iff_safe_and_requested() {
        let cases = [
            ("print(1)", false, "none"),
            ("print(1)", true, "ran"),
            ("popen", false, "none"),
            ("popen", true, "blocked"),
        ];
        for (reply, flag, expected) in cases {
            let mock = MockClient::replying(reply);
            let report = engine(&mock).run("prompt", flag).await.unwrap();
            let got = match report.outcome {
                None => "none",
                Some(ExecOutcome::Ran(_)) => "ran",
                Some(ExecOutcome::Blocked { .. }) => "blocked",
            };
            assert_eq!(got, expected, "reply {reply:?}, flag {flag}");
        }
    }

    // ── Policy wiring ───────────────────────────────────

    #[tokio::test]
    async fn test_custom_denylist_from_config() {
        let mut config = test_config("sk-test");
        config.engine = EngineConfig {
            denylist: vec!["print(".to_string()],
        };
        let mock = MockClient::replying("print(1)");
        let report = Engine::new(config, mock.clone())
            .run("anything", true)
            .await
            .unwrap();
        assert!(matches!(
            report.outcome,
            Some(ExecOutcome::Blocked { .. })
        ));
    }

    #[tokio::test]
    async fn test_validate_delegates_to_policy() {
        let mock = MockClient::replying("unused");
        let eng = engine(&mock);
        assert!(!eng.validate("subprocess.run([\"ls\"])"));
        assert!(eng.validate("print(\"hello\")"));
    }

    #[tokio::test]
    async fn test_empty_completion_is_returned_as_empty_code() {
        let mock = MockClient::replying("");
        let report = engine(&mock).run("anything", false).await.unwrap();
        assert_eq!(report.code, "");
    }
}
