//! Conversation bookkeeping around the retriever. Nothing here feeds back
//! into matching: every question is answered on its own.

use crate::retriever::{Answer, Retriever};
use serde::{Deserialize, Serialize};

pub const BOT_NAME: &str = "Chatbot V0.1";
pub const DEFAULT_USERNAME: &str = "anonymous";

/// Anything that can answer a single question.
pub trait AnswerSource {
    fn find_answer(&self, question: &str) -> Answer;
}

impl AnswerSource for Retriever {
    fn find_answer(&self, question: &str) -> Answer {
        Retriever::find_answer(self, question)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatEntry {
    pub speaker: String,
    pub text: String,
}

/// Ordered transcript of a chat.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Conversation {
    entries: Vec<ChatEntry>,
}

impl Conversation {
    pub fn push(&mut self, speaker: impl Into<String>, text: impl Into<String>) {
        self.entries.push(ChatEntry { speaker: speaker.into(), text: text.into() });
    }

    pub fn entries(&self) -> &[ChatEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub username: String,
    history: Vec<String>,
}

impl Default for User {
    fn default() -> Self {
        Self::new(DEFAULT_USERNAME)
    }
}

impl User {
    pub fn new(username: impl Into<String>) -> Self {
        Self { username: username.into(), history: Vec::new() }
    }

    /// Every question this user asked, oldest first.
    pub fn history(&self) -> &[String] {
        &self.history
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }
}

/// Answer `question` and record the exchange. See [`record`].
pub fn ask<S: AnswerSource + ?Sized>(
    source: &S,
    user: &mut User,
    conversation: &mut Conversation,
    question: &str,
) -> Answer {
    let answer = source.find_answer(question);
    record(user, conversation, question, &answer);
    answer
}

/// Record an answered question: the question goes into the user's history,
/// then the user's line and the bot's reply are appended to the
/// conversation. A document without a snippet is recorded as an empty reply.
///
/// Kept apart from [`ask`] so callers can run the lookup without holding
/// whatever guards the conversation.
pub fn record(user: &mut User, conversation: &mut Conversation, question: &str, answer: &Answer) {
    user.history.push(question.to_string());
    conversation.push(user.username.clone(), question);
    conversation.push(BOT_NAME, answer.answer.clone().unwrap_or_default());
}

/// Normalize a requested username, falling back to [`DEFAULT_USERNAME`].
pub fn username_or_default(username: Option<String>) -> String {
    username
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty())
        .unwrap_or_else(|| DEFAULT_USERNAME.to_string())
}

/// One transcript, owned by a named user. A user may hold several chats and
/// their question history spans all of them.
#[derive(Debug, Clone, Serialize)]
pub struct Chat {
    pub username: String,
    pub conversation: Conversation,
}

impl Chat {
    pub fn new(username: impl Into<String>) -> Self {
        Self { username: username.into(), conversation: Conversation::default() }
    }

    /// Forget the transcript. The user's question history is kept.
    pub fn clear(&mut self) {
        self.conversation.clear();
    }
}
