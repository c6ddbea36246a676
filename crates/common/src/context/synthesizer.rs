//! LLM Synthesizer - Generates answers from retrieved chunks
//!
//! Uses "compact" synthesis:
//! - Retrieved chunks are packed into as few prompts as fit the context budget
//! - The first prompt answers the question
//! - Every further prompt refines the running answer with more context
//!
//! Without an API key the answer is composed offline from the best chunk.

use crate::config::LlmConfig;
use crate::errors::{AppError, Result};
use crate::store::text_preview;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Answer returned when retrieval produced nothing to synthesize from
pub const EMPTY_RESPONSE: &str = "Empty Response";

/// Characters of the best chunk used for an offline answer
const OFFLINE_ANSWER_CHARS: usize = 500;

/// Separator between chunks packed into one prompt
const CHUNK_SEPARATOR: &str = "\n\n";

/// A retrieved chunk handed to the synthesizer, best match first
#[derive(Debug, Clone)]
pub struct SynthesisContext {
    /// Document the chunk came from, shown to the LLM as its source
    pub doc_id: String,
    pub content: String,
}

/// Synthesizer for generating answers
pub struct Synthesizer {
    config: LlmConfig,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    max_tokens: usize,
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Deserialize)]
struct ChatMessageResponse {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

impl Synthesizer {
    /// Create a new synthesizer
    pub fn new(config: LlmConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::Internal {
                message: format!("Failed to create HTTP client: {}", e)
            })?;

        if !Self::has_llm(&config) {
            tracing::warn!("LLM API key not configured, answers are taken from retrieved text");
        }

        Ok(Self { config, client })
    }

    fn has_llm(config: &LlmConfig) -> bool {
        config.api_key.as_deref().is_some_and(|k| !k.is_empty())
    }

    /// Synthesize an answer from context
    pub async fn synthesize(&self, question: &str, contexts: &[SynthesisContext]) -> Result<String> {
        if contexts.is_empty() {
            return Ok(EMPTY_RESPONSE.to_string());
        }

        if !Self::has_llm(&self.config) {
            return Ok(Self::offline_answer(contexts));
        }

        let start = Instant::now();
        let packs = self.pack_contexts(contexts);
        let mut answer: Option<String> = None;

        for pack in &packs {
            let prompt = match &answer {
                None => build_answer_prompt(question, pack),
                Some(existing) => build_refine_prompt(question, existing, pack),
            };
            answer = Some(self.call_llm(prompt).await?);
        }

        metrics::histogram!("docindex_synthesis_duration_seconds")
            .record(start.elapsed().as_secs_f64());
        tracing::debug!(
            prompts = packs.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Answer synthesized"
        );

        Ok(answer.unwrap_or_else(|| EMPTY_RESPONSE.to_string()))
    }

    /// Pack chunks, each tagged with its document, into as few prompt-sized
    /// windows as possible, keeping order.
    /// A chunk larger than the budget gets a window of its own.
    fn pack_contexts(&self, contexts: &[SynthesisContext]) -> Vec<String> {
        let budget = self.config.context_window_chars.max(1);
        let mut packs: Vec<String> = Vec::new();
        let mut current = String::new();

        for ctx in contexts {
            let content = ctx.content.trim();
            if content.is_empty() {
                continue;
            }
            let entry = format!("doc_id: {}\n{}", ctx.doc_id, content);

            let needed = if current.is_empty() {
                entry.chars().count()
            } else {
                current.chars().count() + CHUNK_SEPARATOR.len() + entry.chars().count()
            };

            if !current.is_empty() && needed > budget {
                packs.push(std::mem::take(&mut current));
            }
            if !current.is_empty() {
                current.push_str(CHUNK_SEPARATOR);
            }
            current.push_str(&entry);
        }

        if !current.is_empty() {
            packs.push(current);
        }
        packs
    }

    /// Answer from the highest scoring chunk when no LLM is available
    fn offline_answer(contexts: &[SynthesisContext]) -> String {
        contexts
            .iter()
            .map(|c| c.content.trim())
            .find(|c| !c.is_empty())
            .map(|c| text_preview(c, OFFLINE_ANSWER_CHARS))
            .unwrap_or_else(|| EMPTY_RESPONSE.to_string())
    }

    /// Call the chat completions API
    async fn call_llm(&self, prompt: String) -> Result<String> {
        let api_key = self.config.api_key.as_deref().unwrap_or_default();
        let url = format!("{}/chat/completions", self.config.api_base.trim_end_matches('/'));

        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: "You answer questions using only the provided document excerpts."
                        .to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        let response = self.client
            .post(&url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::Synthesis {
                message: format!("LLM API request failed: {}", e),
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Synthesis {
                message: format!("LLM API error {}: {}", status, body),
            });
        }

        let chat_response: ChatResponse = response.json().await
            .map_err(|e| AppError::Synthesis {
                message: format!("Failed to parse LLM response: {}", e),
            })?;

        chat_response.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|c| c.trim().to_string())
            .ok_or_else(|| AppError::Synthesis {
                message: "Empty response from LLM".to_string(),
            })
    }
}

/// First prompt of a compact synthesis
fn build_answer_prompt(question: &str, context: &str) -> String {
    format!(
        "Context information is below.\n\
        ---------------------\n\
        {context}\n\
        ---------------------\n\
        Using the context information and no prior knowledge, answer the query.\n\
        Query: {question}\n\
        Answer: "
    )
}

/// Follow-up prompt that refines an existing answer with more context
fn build_refine_prompt(question: &str, existing_answer: &str, context: &str) -> String {
    format!(
        "The original query is: {question}\n\
        An existing answer is: {existing_answer}\n\
        Refine the existing answer (only if needed) with the additional context below.\n\
        ------------\n\
        {context}\n\
        ------------\n\
        If the context is not useful, return the existing answer unchanged.\n\
        Refined Answer: "
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(doc_id: &str, content: &str) -> SynthesisContext {
        SynthesisContext {
            doc_id: doc_id.to_string(),
            content: content.to_string(),
        }
    }

    fn synthesizer(context_window_chars: usize) -> Synthesizer {
        Synthesizer::new(LlmConfig {
            context_window_chars,
            ..LlmConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn test_pack_fits_in_one_prompt() {
        let s = synthesizer(1000);
        let packs = s.pack_contexts(&[ctx("a", "first"), ctx("b", "second")]);
        assert_eq!(packs, vec!["doc_id: a\nfirst\n\ndoc_id: b\nsecond".to_string()]);
    }

    #[test]
    fn test_pack_splits_on_budget() {
        let s = synthesizer(40);
        let packs = s.pack_contexts(&[
            ctx("a", "aaaaaaaa"),
            ctx("b", "bbbbbbbb"),
            ctx("c", "cccccccccccccccccccc"),
        ]);
        assert_eq!(
            packs,
            vec![
                "doc_id: a\naaaaaaaa\n\ndoc_id: b\nbbbbbbbb",
                "doc_id: c\ncccccccccccccccccccc",
            ]
        );
    }

    #[test]
    fn test_pack_skips_blank_chunks() {
        let s = synthesizer(100);
        let packs = s.pack_contexts(&[ctx("a", "  "), ctx("b", "text")]);
        assert_eq!(packs, vec!["doc_id: b\ntext"]);
    }

    #[tokio::test]
    async fn test_empty_context_gives_empty_response() {
        let s = synthesizer(100);
        assert_eq!(s.synthesize("anything", &[]).await.unwrap(), EMPTY_RESPONSE);
    }

    #[tokio::test]
    async fn test_offline_answer_uses_best_chunk() {
        let s = synthesizer(100);
        let answer = s
            .synthesize("hello?", &[ctx("notes.txt", "hello world"), ctx("b", "other")])
            .await
            .unwrap();
        assert_eq!(answer, "hello world");
    }

    #[test]
    fn test_prompts_carry_question_and_context() {
        let first = build_answer_prompt("What is Rust?", "Rust is a language.");
        assert!(first.contains("Query: What is Rust?"));
        assert!(first.contains("Rust is a language."));

        let refine = build_refine_prompt("What is Rust?", "A language.", "It is memory safe.");
        assert!(refine.contains("An existing answer is: A language."));
        assert!(refine.contains("It is memory safe."));
    }
}
