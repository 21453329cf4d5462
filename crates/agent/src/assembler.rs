use anyhow::Result;

use platzbot_core::text::clean_citations;

use crate::llm::{ChatMessage, GenerationClient};

/// Preamble of the synthetic system message that carries executor fragments
/// into the generation step.
pub const STRUCTURED_CONTEXT_PREAMBLE: &str =
    "Folgende Informationen wurden aus der strukturierten Kinderbetreuungsdatenbank ermittelt. \
     Du kannst sie für deine Antwort verwenden:";

pub struct ResponseAssembler<G> {
    generator: G,
}

impl<G> ResponseAssembler<G>
where
    G: GenerationClient,
{
    pub fn new(generator: G) -> Self {
        Self { generator }
    }

    /// Appends the fragments (when any exist) as one system-authored context
    /// message, delegates to the generation step, and cleans the returned
    /// text. Without fragments the history is passed through unchanged.
    pub async fn respond(
        &self,
        history: &[ChatMessage],
        fragments: &[String],
    ) -> Result<String> {
        let mut messages = history.to_vec();
        if !fragments.is_empty() {
            messages.push(ChatMessage::system(format!(
                "{STRUCTURED_CONTEXT_PREAMBLE}\n\n{}",
                fragments.join("\n\n")
            )));
        }

        let raw = self.generator.generate(&messages).await?;
        Ok(clean_citations(&raw))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use anyhow::Result;
    use async_trait::async_trait;

    use super::{ResponseAssembler, STRUCTURED_CONTEXT_PREAMBLE};
    use crate::llm::{ChatMessage, GenerationClient, Role};

    struct RecordingGenerator {
        seen: Mutex<Vec<ChatMessage>>,
        answer: &'static str,
    }

    #[async_trait]
    impl GenerationClient for RecordingGenerator {
        async fn generate(&self, messages: &[ChatMessage]) -> Result<String> {
            *self.seen.lock().expect("lock") = messages.to_vec();
            Ok(self.answer.to_string())
        }
    }

    fn generator(answer: &'static str) -> RecordingGenerator {
        RecordingGenerator { seen: Mutex::new(Vec::new()), answer }
    }

    #[tokio::test]
    async fn fragments_become_one_trailing_system_message() {
        let generator = generator("Antwort");
        let assembler = ResponseAssembler::new(generator);

        let history = [ChatMessage::user("Welche Einrichtungen gibt es in Linz?")];
        let fragments =
            vec!["Fragment eins.".to_string(), "Fragment zwei.".to_string()];
        assembler.respond(&history, &fragments).await.expect("respond");

        let seen = assembler.generator.seen.lock().expect("lock").clone();
        assert_eq!(seen.len(), 2);
        let context = &seen[1];
        assert_eq!(context.role, Role::System);
        assert!(context.content.starts_with(STRUCTURED_CONTEXT_PREAMBLE));
        assert!(context.content.contains("Fragment eins.\n\nFragment zwei."));
    }

    #[tokio::test]
    async fn empty_fragments_leave_the_history_untouched() {
        let generator = generator("Antwort");
        let assembler = ResponseAssembler::new(generator);

        let history = [ChatMessage::user("Hallo!")];
        assembler.respond(&history, &[]).await.expect("respond");

        let seen = assembler.generator.seen.lock().expect("lock").clone();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].role, Role::User);
    }

    #[tokio::test]
    async fn generated_text_is_cleaned() {
        let generator = generator("Antwort  mit filecite:abc Marker turn1file2 .");
        let assembler = ResponseAssembler::new(generator);

        let answer = assembler
            .respond(&[ChatMessage::user("Hallo!")], &[])
            .await
            .expect("respond");
        assert_eq!(answer, "Antwort mit Marker .");
    }
}
