use thiserror::Error;
use tracing::{debug, warn};

use platzbot_db::repositories::FacilityStore;

use crate::assembler::ResponseAssembler;
use crate::executor::ActionExecutor;
use crate::llm::{ChatMessage, GenerationClient, RoutingOracle};
use crate::router::ActionRouter;

/// The one hard failure a turn can have. Everything upstream of generation
/// (oracle failures, malformed routing output, an unavailable capacity
/// store) is absorbed and only costs the turn its structured context.
#[derive(Debug, Error)]
pub enum TurnError {
    #[error("generation failed: {0}")]
    Generation(#[source] anyhow::Error),
}

impl TurnError {
    /// Message safe to show to the end user; never a stack trace.
    pub fn user_message(&self) -> &'static str {
        "Die Antwort konnte gerade nicht erstellt werden. \
         Bitte versuchen Sie es in einem Moment noch einmal."
    }
}

/// Composes router, executor and assembler for one synchronous turn:
/// classify, execute at most one action, generate.
pub struct Agent<O, S, G> {
    router: ActionRouter<O>,
    executor: ActionExecutor<S>,
    assembler: ResponseAssembler<G>,
}

impl<O, S, G> Agent<O, S, G>
where
    O: RoutingOracle,
    S: FacilityStore,
    G: GenerationClient,
{
    pub fn new(oracle: O, store: S, generator: G) -> Self {
        Self {
            router: ActionRouter::new(oracle),
            executor: ActionExecutor::new(store),
            assembler: ResponseAssembler::new(generator),
        }
    }

    pub async fn handle_turn(&self, history: &[ChatMessage]) -> Result<String, TurnError> {
        let decision = self.router.decide(history).await;
        debug!(action = decision.action.as_str(), "routing decision");

        let fragment = match self.executor.execute(&decision).await {
            Ok(fragment) => fragment,
            Err(error) => {
                warn!(
                    error = %error,
                    action = decision.action.as_str(),
                    "capacity store unavailable, answering without structured context"
                );
                None
            }
        };

        let fragments: Vec<String> = fragment.into_iter().collect();
        self.assembler.respond(history, &fragments).await.map_err(TurnError::Generation)
    }
}

#[cfg(test)]
mod tests {
    use anyhow::{anyhow, Result};
    use async_trait::async_trait;

    use platzbot_core::domain::facility::{CapacityLedger, Facility, FacilityId};
    use platzbot_db::repositories::{
        FacilityStore, InMemoryFacilityStore, RepositoryError,
    };

    use super::Agent;
    use crate::assembler::STRUCTURED_CONTEXT_PREAMBLE;
    use crate::llm::{ChatMessage, GenerationClient, RoutingOracle};

    struct CannedOracle(&'static str);

    #[async_trait]
    impl RoutingOracle for CannedOracle {
        async fn classify(&self, _instruction: &str, _utterance: &str) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    /// Echoes the final message back so tests can observe what the
    /// generation step was given.
    struct EchoGenerator;

    #[async_trait]
    impl GenerationClient for EchoGenerator {
        async fn generate(&self, messages: &[ChatMessage]) -> Result<String> {
            Ok(messages.last().map(|message| message.content.clone()).unwrap_or_default())
        }
    }

    struct FailingGenerator;

    #[async_trait]
    impl GenerationClient for FailingGenerator {
        async fn generate(&self, _messages: &[ChatMessage]) -> Result<String> {
            Err(anyhow!("model endpoint unreachable"))
        }
    }

    /// Simulates an unavailable persistence layer.
    struct BrokenStore;

    #[async_trait]
    impl FacilityStore for BrokenStore {
        async fn find_facilities(&self, _query: &str) -> Result<Vec<Facility>, RepositoryError> {
            Err(RepositoryError::Decode("connection refused".to_string()))
        }

        async fn facility_by_id(
            &self,
            _kennzahl: FacilityId,
        ) -> Result<Option<Facility>, RepositoryError> {
            Err(RepositoryError::Decode("connection refused".to_string()))
        }

        async fn free_places(
            &self,
            _kennzahl: FacilityId,
        ) -> Result<Option<i64>, RepositoryError> {
            Err(RepositoryError::Decode("connection refused".to_string()))
        }

        async fn reserve(
            &self,
            _kennzahl: FacilityId,
            _parent_name: &str,
            _parent_email: &str,
            _child_name: &str,
        ) -> Result<bool, RepositoryError> {
            Err(RepositoryError::Decode("connection refused".to_string()))
        }

        async fn reset_pre_registrations(
            &self,
            _city: Option<&str>,
        ) -> Result<u64, RepositoryError> {
            Err(RepositoryError::Decode("connection refused".to_string()))
        }
    }

    async fn seeded_store() -> InMemoryFacilityStore {
        let store = InMemoryFacilityStore::default();
        store
            .insert(Facility {
                kennzahl: FacilityId(401001),
                name: "KG Zentrum".to_string(),
                city: Some("Linz".to_string()),
                postal_code: Some("4020".to_string()),
                phone: None,
                email: None,
                website: None,
                ledger: CapacityLedger {
                    capacity_estimate: Some(10),
                    current_occupancy: Some(6),
                    pre_registrations: Some(0),
                },
            })
            .await;
        store
    }

    #[tokio::test]
    async fn action_turn_injects_structured_context_into_generation() {
        let agent = Agent::new(
            CannedOracle(r#"{"action": "list_facilities", "city": "Linz"}"#),
            seeded_store().await,
            EchoGenerator,
        );

        let answer = agent
            .handle_turn(&[ChatMessage::user("Welche Einrichtungen gibt es in Linz?")])
            .await
            .expect("turn");
        assert!(answer.starts_with(STRUCTURED_CONTEXT_PREAMBLE));
        assert!(answer.contains("KG Zentrum"));
    }

    #[tokio::test]
    async fn no_action_turn_passes_history_through() {
        let agent = Agent::new(
            CannedOracle(r#"{"action": "none"}"#),
            seeded_store().await,
            EchoGenerator,
        );

        let answer = agent.handle_turn(&[ChatMessage::user("Hallo!")]).await.expect("turn");
        assert_eq!(answer, "Hallo!");
    }

    #[tokio::test]
    async fn store_failure_degrades_to_an_answer_without_context() {
        let agent = Agent::new(
            CannedOracle(r#"{"action": "list_facilities", "city": "Linz"}"#),
            BrokenStore,
            EchoGenerator,
        );

        let answer = agent
            .handle_turn(&[ChatMessage::user("Welche Einrichtungen gibt es in Linz?")])
            .await
            .expect("turn must survive a broken store");
        assert_eq!(answer, "Welche Einrichtungen gibt es in Linz?");
    }

    #[tokio::test]
    async fn generation_failure_is_the_turns_only_hard_error() {
        let agent = Agent::new(
            CannedOracle(r#"{"action": "none"}"#),
            seeded_store().await,
            FailingGenerator,
        );

        let error = agent
            .handle_turn(&[ChatMessage::user("Hallo!")])
            .await
            .expect_err("generation failure must surface");
        assert!(!error.user_message().is_empty());
    }
}
