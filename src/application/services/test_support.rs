//! Doubles shared by the service tests.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use crate::application::services::prompt::PromptTemplate;
use crate::application::services::rag::Retriever;
use crate::domain::{
    ports::{EmbeddingService, LlmService},
    Chunk, DomainError, Locator,
};
use crate::infrastructure::{FlatIndex, HashingEmbedding};

/// Answers `answer <n>` for the n-th call, failing on the calls listed.
pub struct ScriptedLlm {
    fail_on: Vec<usize>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedLlm {
    pub fn answering() -> Self {
        Self {
            fail_on: Vec::new(),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_on(call: usize) -> Self {
        Self {
            fail_on: vec![call],
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn always_failing() -> Self {
        Self {
            fail_on: (1..=1000).collect(),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmService for ScriptedLlm {
    async fn complete(&self, prompt: &str) -> Result<String, DomainError> {
        let call = {
            let mut prompts = self.prompts.lock().unwrap();
            prompts.push(prompt.to_string());
            prompts.len()
        };
        if self.fail_on.contains(&call) {
            return Err(DomainError::timeout("scripted failure"));
        }
        Ok(format!("answer {call}"))
    }
}

pub fn template() -> Arc<PromptTemplate> {
    Arc::new(PromptTemplate {
        persona: "You are a test tutor.".to_string(),
        creator: "Test Team".to_string(),
        rules: vec!["Be clear".to_string()],
        no_context: "No textbook material.".to_string(),
    })
}

pub async fn retriever() -> Arc<Retriever> {
    let embedder = HashingEmbedding::new(256);
    let docs = [
        ("maths_ch4.txt", "The quadratic formula solves quadratic equations."),
        ("physics_ch10.txt", "Concave mirrors converge light rays."),
    ];
    let mut entries = Vec::new();
    for (source, text) in docs {
        let embedding = embedder.embed(text).await.unwrap();
        entries.push((Chunk::new(text, source, Locator::Page(0)), embedding));
    }
    let index = FlatIndex::build(embedder.model_id(), entries).unwrap();
    Arc::new(Retriever::new(Arc::new(embedder), Arc::new(index), 1).unwrap())
}
