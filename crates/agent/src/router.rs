use tracing::warn;

use platzbot_core::domain::routing::RoutingDecision;

use crate::llm::{ChatMessage, Role, RoutingOracle};

/// Fixed instruction for the routing oracle. The rules in here define the
/// intended classification behavior, not mere prompt wording: city questions
/// map to list_facilities, questions about one explicitly identified
/// facility to check_free_places, registration intent to reserve_place, and
/// slots are only filled when the message names them unambiguously.
pub const ROUTER_INSTRUCTION: &str = "Du bist ein Routing-Assistent für einen Kinderbetreuungs-Chatbot in Oberösterreich. \
Analysiere die letzte Nutzerfrage und entscheide, ob eine Funktion auf der \
Kinderbetreuungsdatenbank aufgerufen werden soll.\n\n\
Gib deine Antwort ausschließlich als JSON im folgenden Format zurück:\n\
{\n\
  \"action\": \"none\" | \"list_facilities\" | \"check_free_places\" | \"reserve_place\",\n\
  \"city\": string oder null,\n\
  \"kennzahl\": number oder null,\n\
  \"parent_name\": string oder null,\n\
  \"parent_email\": string oder null,\n\
  \"child_name\": string oder null\n\
}\n\n\
Regeln:\n\
- Verwende action=\"list_facilities\", wenn nach Einrichtungen oder freien Plätzen in einer bestimmten Stadt/Gemeinde gefragt wird \
(z.B. \"Welche Kinderbetreuungseinrichtungen gibt es in Linz?\" oder \"Wie viele Plätze sind in Hagenberg noch frei?\").\n\
- Verwende action=\"check_free_places\", wenn nach freien Plätzen in einer bestimmten Einrichtung gefragt wird.\n\
- Verwende action=\"reserve_place\", wenn die Nutzerin ihr Kind vormerken/anmelden möchte.\n\
- Sonst action=\"none\".\n\
- city nur setzen, wenn eindeutig genannt (z.B. \"Linz\", \"Hagenberg\").\n\
- kennzahl nur setzen, wenn die Kennzahl explizit genannt wird.\n\
- parent_name, parent_email, child_name nur setzen, wenn sie in der Frage klar vorkommen.\n";

pub struct ActionRouter<O> {
    oracle: O,
}

impl<O> ActionRouter<O>
where
    O: RoutingOracle,
{
    pub fn new(oracle: O) -> Self {
        Self { oracle }
    }

    /// Classifies the most recent user message of the history. Never raises:
    /// a missing user message, oracle transport failure, or malformed oracle
    /// output all degrade to the no-action decision.
    pub async fn decide(&self, history: &[ChatMessage]) -> RoutingDecision {
        let Some(last_user) = history.iter().rev().find(|message| message.role == Role::User)
        else {
            return RoutingDecision::none();
        };

        match self.oracle.classify(ROUTER_INSTRUCTION, &last_user.content).await {
            Ok(raw) => RoutingDecision::parse_oracle_output(&raw),
            Err(error) => {
                warn!(error = %error, "routing oracle unavailable, defaulting to no action");
                RoutingDecision::none()
            }
        }
    }
}
