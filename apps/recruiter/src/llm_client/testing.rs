//! In-memory `LanguageModel` for agent tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use super::{LanguageModel, LlmError, LlmReply};

type Scripted = Result<LlmReply, LlmError>;

/// Replays scripted replies and records every prompt it receives.
///
/// Routing rules (`when`) are checked first, in registration order, against
/// the prompt text; otherwise the next queued reply is popped. An exhausted
/// queue yields `LlmError::EmptyContent`.
#[derive(Default)]
pub struct ScriptedLlm {
    rules: Vec<(String, Mutex<VecDeque<Scripted>>)>,
    queue: Mutex<VecDeque<Scripted>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedLlm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a plain-text reply.
    pub fn reply(self, text: &str) -> Self {
        self.push(Ok(LlmReply::from(text)))
    }

    /// Queues a transport failure.
    pub fn fail(self) -> Self {
        self.push(Err(server_error()))
    }

    pub fn push(self, reply: Scripted) -> Self {
        self.queue.lock().unwrap().push_back(reply);
        self
    }

    /// Answers every prompt containing `needle` with `text`, repeating the
    /// last scripted reply once the rule's own queue would run dry.
    pub fn when(self, needle: &str, text: &str) -> Self {
        self.when_reply(needle, Ok(LlmReply::from(text)))
    }

    /// Fails every prompt containing `needle`.
    pub fn when_fail(self, needle: &str) -> Self {
        self.when_reply(needle, Err(server_error()))
    }

    pub fn when_reply(mut self, needle: &str, reply: Scripted) -> Self {
        if let Some((_, queue)) = self.rules.iter().find(|(n, _)| n == needle) {
            queue.lock().unwrap().push_back(reply);
        } else {
            self.rules
                .push((needle.to_string(), Mutex::new(VecDeque::from([reply]))));
        }
        self
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl LanguageModel for ScriptedLlm {
    async fn invoke(&self, prompt: &str) -> Result<LlmReply, LlmError> {
        self.prompts.lock().unwrap().push(prompt.to_string());

        if let Some((_, queue)) = self.rules.iter().find(|(n, _)| prompt.contains(n.as_str())) {
            let mut queue = queue.lock().unwrap();
            return if queue.len() > 1 {
                queue.pop_front().unwrap_or(Err(LlmError::EmptyContent))
            } else {
                queue.front().map(clone_scripted).unwrap_or(Err(LlmError::EmptyContent))
            };
        }

        self.queue
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(LlmError::EmptyContent))
    }
}

fn server_error() -> LlmError {
    LlmError::Api {
        status: 500,
        message: "scripted failure".to_string(),
    }
}

fn clone_scripted(reply: &Scripted) -> Scripted {
    match reply {
        Ok(r) => Ok(r.clone()),
        Err(LlmError::Api { status, message }) => Err(LlmError::Api {
            status: *status,
            message: message.clone(),
        }),
        Err(_) => Err(LlmError::EmptyContent),
    }
}
