//! In-memory fakes for the repository and provider traits.
//!
//! Every fake is `Clone` and shares its state, so a test can hand one clone
//! to the code under test and inspect another. Fakes that touch the outside
//! world append to an optional shared [`Journal`] so tests can assert the
//! order of side effects across components.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use ella_types::conversation::{Conversation, Message, MessageUpdate};
use ella_types::error::RepositoryError;
use ella_types::image::{ImageError, ImageGenerationRequest};
use ella_types::job::{JobRun, JobRunStatus, StepLog, StepStatus};
use ella_types::llm::{CompletionRequest, CompletionResponse, LlmError, StopReason, Usage};
use ella_types::search::{SearchError, SearchImage, SearchRequest, SearchResponse, SearchResult};
use ella_types::user::{Plan, User};
use serde_json::Value;
use uuid::Uuid;

use crate::llm::provider::LlmProvider;
use crate::provider::image::ImageGenerator;
use crate::provider::search::WebSearchProvider;
use crate::repository::conversation::ConversationRepository;
use crate::repository::job::JobRepository;
use crate::repository::user::UserRepository;

// ---------------------------------------------------------------------------
// Journal
// ---------------------------------------------------------------------------

#[derive(Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    pub fn record(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn position(&self, prefix: &str) -> Option<usize> {
        self.entries().iter().position(|e| e.starts_with(prefix))
    }
}

// ---------------------------------------------------------------------------
// Providers
// ---------------------------------------------------------------------------

/// Scripted text model. Pops one scripted answer per call; once the script
/// runs out it answers `"fake answer"`.
#[derive(Clone, Default)]
pub struct FakeLlm {
    script: Arc<Mutex<Vec<Result<String, String>>>>,
    requests: Arc<Mutex<Vec<CompletionRequest>>>,
    journal: Option<Journal>,
}

impl FakeLlm {
    pub fn scripted(script: Vec<Result<String, String>>) -> Self {
        let mut script = script;
        script.reverse();
        Self {
            script: Arc::new(Mutex::new(script)),
            ..Self::default()
        }
    }

    pub fn with_journal(mut self, journal: Journal) -> Self {
        self.journal = Some(journal);
        self
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

impl LlmProvider for FakeLlm {
    fn name(&self) -> &str {
        "fake"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        self.requests.lock().unwrap().push(request.clone());
        if let Some(journal) = &self.journal {
            journal.record("llm");
        }
        let next = self.script.lock().unwrap().pop();
        match next.unwrap_or_else(|| Ok("fake answer".to_string())) {
            Ok(content) => Ok(CompletionResponse {
                id: "resp-fake".to_string(),
                content,
                model: request.model.clone(),
                stop_reason: StopReason::EndTurn,
                usage: Usage::default(),
            }),
            Err(message) => Err(LlmError::Provider { message }),
        }
    }
}

#[derive(Clone, Default)]
pub struct FakeSearch {
    failures_left: Arc<Mutex<u32>>,
    requests: Arc<Mutex<Vec<SearchRequest>>>,
    journal: Option<Journal>,
}

impl FakeSearch {
    /// Fail the first `n` calls with a provider error.
    pub fn failing_first(n: u32) -> Self {
        Self {
            failures_left: Arc::new(Mutex::new(n)),
            ..Self::default()
        }
    }

    pub fn with_journal(mut self, journal: Journal) -> Self {
        self.journal = Some(journal);
        self
    }

    pub fn requests(&self) -> Vec<SearchRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn canned_response() -> SearchResponse {
        SearchResponse {
            answer: Some("Rattlesnake Ledge and Mount Si are popular.".to_string()),
            results: vec![
                SearchResult {
                    url: "https://www.wta.org/go-hiking/hikes/rattlesnake-ledge".to_string(),
                    title: "Rattlesnake Ledge".to_string(),
                    content: "A short steep hike".to_string(),
                    raw_content: Some("Rattlesnake Ledge is a 4 mile hike...".to_string()),
                    favicon: Some("https://www.wta.org/favicon.ico".to_string()),
                    score: 0.92,
                },
                SearchResult {
                    url: "https://hikes.example/mount-si".to_string(),
                    title: "Mount Si".to_string(),
                    content: "A classic".to_string(),
                    raw_content: Some("Mount Si rises above North Bend...".to_string()),
                    favicon: None,
                    score: 0.81,
                },
            ],
            images: vec![SearchImage {
                url: "https://img.example/ledge.jpg".to_string(),
                description: None,
            }],
        }
    }
}

impl WebSearchProvider for FakeSearch {
    async fn search(&self, request: &SearchRequest) -> Result<SearchResponse, SearchError> {
        self.requests.lock().unwrap().push(request.clone());
        if let Some(journal) = &self.journal {
            journal.record("search");
        }
        let mut left = self.failures_left.lock().unwrap();
        if *left > 0 {
            *left -= 1;
            return Err(SearchError::Status {
                status: 503,
                body: "upstream unavailable".to_string(),
            });
        }
        Ok(Self::canned_response())
    }
}

#[derive(Clone, Default)]
pub struct FakeImages {
    requests: Arc<Mutex<Vec<ImageGenerationRequest>>>,
    journal: Option<Journal>,
}

impl FakeImages {
    pub fn with_journal(mut self, journal: Journal) -> Self {
        self.journal = Some(journal);
        self
    }

    pub fn requests(&self) -> Vec<ImageGenerationRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

impl ImageGenerator for FakeImages {
    async fn generate(&self, request: &ImageGenerationRequest) -> Result<Vec<String>, ImageError> {
        self.requests.lock().unwrap().push(request.clone());
        if let Some(journal) = &self.journal {
            journal.record("image");
        }
        Ok(vec![
            "https://images.example/generated-1.png".to_string(),
            "https://images.example/generated-2.png".to_string(),
        ])
    }
}

// ---------------------------------------------------------------------------
// Conversations
// ---------------------------------------------------------------------------

#[derive(Default)]
struct ConversationState {
    conversations: HashMap<Uuid, Conversation>,
    messages: Vec<Message>,
    updates: Vec<(Uuid, MessageUpdate)>,
    failing_updates: u32,
}

#[derive(Clone, Default)]
pub struct InMemoryConversations {
    state: Arc<Mutex<ConversationState>>,
    journal: Option<Journal>,
}

impl InMemoryConversations {
    pub fn with_journal(mut self, journal: Journal) -> Self {
        self.journal = Some(journal);
        self
    }

    pub fn message(&self, id: &Uuid) -> Option<Message> {
        let state = self.state.lock().unwrap();
        state.messages.iter().find(|m| &m.id == id).cloned()
    }

    pub fn message_count(&self) -> usize {
        self.state.lock().unwrap().messages.len()
    }

    /// Make the next `n` calls to `update_message` fail without writing.
    pub fn fail_next_updates(&self, n: u32) {
        self.state.lock().unwrap().failing_updates = n;
    }

    /// Every `update_message` call that reached storage, in order.
    pub fn updates(&self) -> Vec<(Uuid, MessageUpdate)> {
        self.state.lock().unwrap().updates.clone()
    }

    fn bump(state: &mut ConversationState, conversation_id: &Uuid) {
        if let Some(conv) = state.conversations.get_mut(conversation_id) {
            conv.updated_at = Utc::now();
        }
    }
}

impl ConversationRepository for InMemoryConversations {
    async fn create_conversation(&self, conversation: &Conversation) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().unwrap();
        state.conversations.insert(conversation.id, conversation.clone());
        Ok(())
    }

    async fn get_conversation(&self, id: &Uuid) -> Result<Option<Conversation>, RepositoryError> {
        Ok(self.state.lock().unwrap().conversations.get(id).cloned())
    }

    async fn list_conversations(&self, clerk_id: &str) -> Result<Vec<Conversation>, RepositoryError> {
        let state = self.state.lock().unwrap();
        let mut out: Vec<Conversation> = state
            .conversations
            .values()
            .filter(|c| c.clerk_id == clerk_id)
            .cloned()
            .collect();
        out.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(out)
    }

    async fn update_conversation_title(&self, id: &Uuid, title: &str) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().unwrap();
        let conv = state.conversations.get_mut(id).ok_or(RepositoryError::NotFound)?;
        conv.title = title.to_string();
        conv.updated_at = Utc::now();
        Ok(())
    }

    async fn delete_conversation(&self, id: &Uuid) -> Result<bool, RepositoryError> {
        let mut state = self.state.lock().unwrap();
        state.messages.retain(|m| &m.conversation_id != id);
        Ok(state.conversations.remove(id).is_some())
    }

    async fn search_conversations(
        &self,
        clerk_id: &str,
        term: &str,
    ) -> Result<Vec<Conversation>, RepositoryError> {
        let term = term.to_lowercase();
        let state = self.state.lock().unwrap();
        let mut out: Vec<Conversation> = state
            .conversations
            .values()
            .filter(|c| c.clerk_id == clerk_id)
            .filter(|c| {
                c.title.to_lowercase().contains(&term)
                    || state.messages.iter().any(|m| {
                        m.conversation_id == c.id
                            && m.clerk_id == clerk_id
                            && m.text.as_deref().is_some_and(|t| t.to_lowercase().contains(&term))
                    })
            })
            .cloned()
            .collect();
        out.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(out)
    }

    async fn create_message(&self, message: &Message) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().unwrap();
        if let Some(journal) = &self.journal {
            journal.record(format!("create_message:{}", message.sender));
        }
        Self::bump(&mut state, &message.conversation_id);
        state.messages.push(message.clone());
        Ok(())
    }

    async fn get_message(&self, id: &Uuid) -> Result<Option<Message>, RepositoryError> {
        Ok(self.message(id))
    }

    async fn update_message(&self, id: &Uuid, update: &MessageUpdate) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().unwrap();
        if state.failing_updates > 0 {
            state.failing_updates -= 1;
            return Err(RepositoryError::Query("database is locked".to_string()));
        }
        if let Some(journal) = &self.journal {
            journal.record(format!("update_message:{}", update.status));
        }
        let msg = state
            .messages
            .iter_mut()
            .find(|m| &m.id == id)
            .ok_or(RepositoryError::NotFound)?;
        msg.status = update.status;
        msg.message_type = update.message_type;
        msg.text = Some(update.text.clone());
        msg.resources = update.resources.clone();
        msg.images = update.images.clone();
        msg.image_url = update.image_url.clone();
        let conversation_id = msg.conversation_id;
        Self::bump(&mut state, &conversation_id);
        state.updates.push((*id, update.clone()));
        Ok(())
    }

    async fn list_messages(&self, conversation_id: &Uuid) -> Result<Vec<Message>, RepositoryError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .messages
            .iter()
            .filter(|m| &m.conversation_id == conversation_id)
            .cloned()
            .collect())
    }

    async fn get_previous_messages(
        &self,
        conversation_id: &Uuid,
        clerk_id: &str,
        limit: u32,
        exclude: Option<&Uuid>,
    ) -> Result<Vec<Message>, RepositoryError> {
        let state = self.state.lock().unwrap();
        let matching: Vec<Message> = state
            .messages
            .iter()
            .filter(|m| &m.conversation_id == conversation_id && m.clerk_id == clerk_id)
            .filter(|m| Some(&m.id) != exclude)
            .cloned()
            .collect();
        let skip = matching.len().saturating_sub(limit as usize);
        Ok(matching.into_iter().skip(skip).collect())
    }

    async fn list_generated_images(&self, clerk_id: &str) -> Result<Vec<Message>, RepositoryError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .messages
            .iter()
            .rev()
            .filter(|m| m.clerk_id == clerk_id && m.message_type == ella_types::tool::Tool::Image)
            .cloned()
            .collect())
    }
}

// ---------------------------------------------------------------------------
// Jobs
// ---------------------------------------------------------------------------

#[derive(Default)]
struct JobState {
    runs: HashMap<Uuid, JobRun>,
    steps: Vec<StepLog>,
    step_starts: Vec<String>,
}

#[derive(Clone, Default)]
pub struct InMemoryJobs {
    state: Arc<Mutex<JobState>>,
}

impl InMemoryJobs {
    pub fn run(&self, id: &Uuid) -> Option<JobRun> {
        self.state.lock().unwrap().runs.get(id).cloned()
    }

    /// Names of every step execution started, in order.
    pub fn step_starts(&self) -> Vec<String> {
        self.state.lock().unwrap().step_starts.clone()
    }

    pub fn step(&self, run_id: &Uuid, name: &str) -> Option<StepLog> {
        let state = self.state.lock().unwrap();
        state
            .steps
            .iter()
            .find(|s| &s.run_id == run_id && s.step_name == name)
            .cloned()
    }
}

impl JobRepository for InMemoryJobs {
    async fn create_run(&self, run: &JobRun) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().unwrap();
        if state.runs.values().any(|r| r.message_id == run.message_id) {
            return Err(RepositoryError::Conflict(format!(
                "message {} already has a job run",
                run.message_id
            )));
        }
        state.runs.insert(run.id, run.clone());
        Ok(())
    }

    async fn get_run(&self, id: &Uuid) -> Result<Option<JobRun>, RepositoryError> {
        Ok(self.run(id))
    }

    async fn start_attempt(&self, id: &Uuid) -> Result<u32, RepositoryError> {
        let mut state = self.state.lock().unwrap();
        let run = state.runs.get_mut(id).ok_or(RepositoryError::NotFound)?;
        run.attempt += 1;
        run.status = JobRunStatus::Running;
        run.updated_at = Utc::now();
        Ok(run.attempt)
    }

    async fn update_run_status(
        &self,
        id: &Uuid,
        status: JobRunStatus,
        error: Option<&str>,
    ) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().unwrap();
        let run = state.runs.get_mut(id).ok_or(RepositoryError::NotFound)?;
        run.status = status;
        run.error = error.map(str::to_string);
        run.updated_at = Utc::now();
        if matches!(status, JobRunStatus::Completed | JobRunStatus::Failed) {
            run.completed_at = Some(Utc::now());
        }
        Ok(())
    }

    async fn list_runs(
        &self,
        status: Option<JobRunStatus>,
        limit: u32,
    ) -> Result<Vec<JobRun>, RepositoryError> {
        let state = self.state.lock().unwrap();
        let mut runs: Vec<JobRun> = state
            .runs
            .values()
            .filter(|r| status.is_none_or(|s| r.status == s))
            .cloned()
            .collect();
        runs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        runs.truncate(limit as usize);
        Ok(runs)
    }

    async fn list_resumable_runs(&self) -> Result<Vec<JobRun>, RepositoryError> {
        let state = self.state.lock().unwrap();
        let mut runs: Vec<JobRun> = state
            .runs
            .values()
            .filter(|r| r.status.is_resumable())
            .cloned()
            .collect();
        runs.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(runs)
    }

    async fn get_step(&self, run_id: &Uuid, step_name: &str) -> Result<Option<StepLog>, RepositoryError> {
        Ok(self.step(run_id, step_name))
    }

    async fn start_step(&self, run_id: &Uuid, step_name: &str, attempt: u32) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().unwrap();
        state.step_starts.push(step_name.to_string());
        state
            .steps
            .retain(|s| !(&s.run_id == run_id && s.step_name == step_name));
        state.steps.push(StepLog {
            id: Uuid::now_v7(),
            run_id: *run_id,
            step_name: step_name.to_string(),
            status: StepStatus::Running,
            attempt,
            output: None,
            error: None,
            started_at: Utc::now(),
            completed_at: None,
        });
        Ok(())
    }

    async fn complete_step(&self, run_id: &Uuid, step_name: &str, output: &Value) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().unwrap();
        let step = state
            .steps
            .iter_mut()
            .find(|s| &s.run_id == run_id && s.step_name == step_name)
            .ok_or(RepositoryError::NotFound)?;
        step.status = StepStatus::Completed;
        step.output = Some(output.clone());
        step.completed_at = Some(Utc::now());
        Ok(())
    }

    async fn fail_step(&self, run_id: &Uuid, step_name: &str, error: &str) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().unwrap();
        let step = state
            .steps
            .iter_mut()
            .find(|s| &s.run_id == run_id && s.step_name == step_name)
            .ok_or(RepositoryError::NotFound)?;
        step.status = StepStatus::Failed;
        step.error = Some(error.to_string());
        step.completed_at = Some(Utc::now());
        Ok(())
    }

    async fn list_steps(&self, run_id: &Uuid) -> Result<Vec<StepLog>, RepositoryError> {
        let state = self.state.lock().unwrap();
        Ok(state.steps.iter().filter(|s| &s.run_id == run_id).cloned().collect())
    }
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

#[derive(Clone, Default)]
pub struct InMemoryUsers {
    users: Arc<Mutex<HashMap<String, (User, Option<String>)>>>,
}

impl UserRepository for InMemoryUsers {
    async fn get_user(&self, clerk_id: &str) -> Result<Option<User>, RepositoryError> {
        Ok(self.users.lock().unwrap().get(clerk_id).map(|(u, _)| u.clone()))
    }

    async fn create_user(&self, user: &User, token_hash: Option<&str>) -> Result<(), RepositoryError> {
        let mut users = self.users.lock().unwrap();
        if users.contains_key(&user.clerk_id) {
            return Err(RepositoryError::Conflict(format!(
                "user '{}' already exists",
                user.clerk_id
            )));
        }
        users.insert(user.clerk_id.clone(), (user.clone(), token_hash.map(str::to_string)));
        Ok(())
    }

    async fn find_by_token_hash(&self, token_hash: &str) -> Result<Option<User>, RepositoryError> {
        let users = self.users.lock().unwrap();
        Ok(users
            .values()
            .find(|(_, hash)| hash.as_deref() == Some(token_hash))
            .map(|(u, _)| u.clone()))
    }

    async fn update_plan(&self, clerk_id: &str, plan: Plan) -> Result<(), RepositoryError> {
        let mut users = self.users.lock().unwrap();
        let (user, _) = users.get_mut(clerk_id).ok_or(RepositoryError::NotFound)?;
        user.plan = plan;
        Ok(())
    }
}
