//! Dialogue engine.
//!
//! Entry point for one conversational turn. The session is locked for the
//! whole turn; the context tiers get the first say, then the intent
//! classifier, and the chosen agent or local handler builds the reply.

use std::sync::Arc;

use tracing::{debug, info, warn};
use trainbot_kb::{KnowledgeStore, MenuKind};

use crate::agents::{
    menu_or_default, recover, AgentKind, AgentServices, CourseAgent, DomainAgent,
    EnrollmentAgent, FaqAgent, HumanServiceAgent, SubsidyAgent,
};
use crate::classifier::{IntentCategory, IntentClassifier, LlmIntentClassifier};
use crate::config::{EngineConfig, ModelSelection};
use crate::context::ConversationContext;
use crate::disambiguator::{self, Resolution};
use crate::llm::{LanguageModel, LlmClient};
use crate::router::{LocalAction, RouteTarget};
use crate::session::{ConversationSession, SessionInfo, SessionStore};
use crate::types::{ChatReply, ChatRequest, MessageRole};

const MAIN_MENU_DEFAULTS: &[&str] = &["課程查詢", "補助諮詢", "報名流程", "聯絡客服"];

const MAIN_MENU_TEXT: &str = "🏠 **主選單**\n\n您好！我是虹宇職訓的智能客服小幫手 👋\n\n\
我可以協助您：\n• 📚 查詢課程資訊\n• 💰 了解補助資格\n• 📝 報名流程說明\n• ☎️ 聯絡真人客服\n\n\
請問有什麼可以幫您的呢？";

const WELCOME_TEXT: &str = "您好！我是虹宇職訓的智能客服小幫手 👋\n\n請問有什麼可以幫您的呢？";

const WELCOME_OPTIONS: [&str; 4] = ["查看課程清單", "補助資格確認", "如何報名", "聯絡客服"];

const UNKNOWN_FALLBACK: &str =
    "抱歉，我不太確定您的問題 🤔\n\n您可以從下方選單選擇想了解的主題，或直接聯絡客服。";

/// The conversational engine.
pub struct ChatEngine {
    sessions: SessionStore,
    knowledge: Arc<KnowledgeStore>,
    classifier: Arc<dyn IntentClassifier>,
    course: CourseAgent,
    subsidy: SubsidyAgent,
    faq: FaqAgent,
    enrollment: EnrollmentAgent,
    human: HumanServiceAgent,
}

impl ChatEngine {
    /// Engine with the model-backed classifier.
    pub fn new(
        knowledge: Arc<KnowledgeStore>,
        llm: Arc<dyn LanguageModel>,
        models: ModelSelection,
        max_history: usize,
    ) -> Self {
        let classifier = Arc::new(LlmIntentClassifier::new(
            llm.clone(),
            models.classification.clone(),
        ));
        Self::with_classifier(knowledge, llm, models, max_history, classifier)
    }

    /// Engine with a caller-supplied classifier.
    pub fn with_classifier(
        knowledge: Arc<KnowledgeStore>,
        llm: Arc<dyn LanguageModel>,
        models: ModelSelection,
        max_history: usize,
        classifier: Arc<dyn IntentClassifier>,
    ) -> Self {
        let services = AgentServices::new(knowledge.clone(), llm, models);
        Self {
            sessions: SessionStore::new(max_history),
            knowledge,
            classifier,
            course: CourseAgent::new(services.clone()),
            subsidy: SubsidyAgent::new(services.clone()),
            faq: FaqAgent::new(services.clone()),
            enrollment: EnrollmentAgent::new(services.clone()),
            human: HumanServiceAgent::new(services),
        }
    }

    /// Build the engine from configuration, reading credentials from the
    /// environment.
    pub fn from_config(config: &EngineConfig) -> Self {
        let client = LlmClient::from_settings(&config.llm);
        let models = config.llm.models(client.provider());
        info!(
            knowledge_dir = %config.knowledge_dir.display(),
            classification_model = %models.classification,
            generation_model = %models.generation,
            model_configured = client.is_configured(),
            "Starting chat engine"
        );

        Self::new(
            Arc::new(KnowledgeStore::new(&config.knowledge_dir)),
            Arc::new(client),
            models,
            config.max_history,
        )
    }

    pub fn knowledge(&self) -> &Arc<KnowledgeStore> {
        &self.knowledge
    }

    /// Serve one turn. Always returns a well-formed reply.
    pub async fn handle(&self, request: ChatRequest) -> ChatReply {
        let handle = self.sessions.get_or_create(&request.session_id);
        let mut session = handle.lock().await;
        session.device = request.device;

        let utterance = request.utterance.trim();
        let reply = if utterance.is_empty() {
            self.main_menu()
        } else {
            self.respond(&mut session, utterance).await
        };

        session.append_message(MessageRole::User, utterance);
        session.append_message(MessageRole::Assistant, reply.content.clone());
        debug!(
            session_id = %request.session_id,
            options = reply.quick_options.len(),
            "Turn complete"
        );
        reply
    }

    /// Clear a conversation and return the welcome message.
    pub async fn reset(&self, session_id: &str) -> ChatReply {
        if let Some(handle) = self.sessions.get(session_id) {
            handle.lock().await.clear();
            info!(session_id, "Session reset");
        }
        ChatReply::new(WELCOME_TEXT, WELCOME_OPTIONS)
    }

    pub async fn session_info(&self, session_id: &str) -> Option<SessionInfo> {
        let handle = self.sessions.get(session_id)?;
        let session = handle.lock().await;
        Some(session.session_info())
    }

    /// Copy of a session's conversation context.
    pub async fn context(&self, session_id: &str) -> Option<ConversationContext> {
        let handle = self.sessions.get(session_id)?;
        let session = handle.lock().await;
        Some(session.context.clone())
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Drop a conversation and its context. Returns whether it existed.
    pub fn end_session(&self, session_id: &str) -> bool {
        let removed = self.sessions.remove(session_id);
        if removed {
            info!(session_id, "Session ended");
        }
        removed
    }

    async fn respond(&self, session: &mut ConversationSession, utterance: &str) -> ChatReply {
        if let Some((tier, resolution)) = disambiguator::resolve(utterance, &session.context) {
            debug!(session_id = %session.id(), tier, "Resolved from context");
            return self.dispatch(session, resolution, utterance).await;
        }

        let category = self.classifier.classify(utterance).await;
        debug!(session_id = %session.id(), category = category.number(), "Classified");
        self.by_category(session, category, utterance).await
    }

    async fn dispatch(
        &self,
        session: &mut ConversationSession,
        resolution: Resolution,
        utterance: &str,
    ) -> ChatReply {
        match resolution {
            Resolution::QuickAction(target) => {
                self.quick_action(session, target, utterance).await
            }
            Resolution::FaqSelection(position) => recover(
                AgentKind::Faq,
                self.faq.select(&mut session.context, position),
            ),
            Resolution::CourseSelection(label) => self.course.select(&mut session.context, label),
            Resolution::Pagination => self.course.paginate(&mut session.context),
            Resolution::Subsidy => self.subsidy.handle(session, utterance).await,
            Resolution::CourseFollowUp => self.course.handle(session, utterance).await,
            Resolution::PromptedSearch(phrase) => recover(
                AgentKind::Course,
                self.course.search(&mut session.context, &phrase),
            ),
        }
    }

    async fn quick_action(
        &self,
        session: &mut ConversationSession,
        target: RouteTarget,
        utterance: &str,
    ) -> ChatReply {
        match target {
            RouteTarget::Local(action) => self.local(session, action),
            RouteTarget::Course(route) => self.course.route(session, route, utterance).await,
            RouteTarget::Subsidy { status, keyword } => {
                self.subsidy.route(session, status, keyword, utterance).await
            }
            RouteTarget::Faq { keyword } => self.faq.handle(session, keyword).await,
            RouteTarget::Enrollment { track } => {
                self.enrollment.route(session, track, utterance).await
            }
            RouteTarget::HumanService => recover(
                AgentKind::HumanService,
                self.human.contact_card(session.device, None),
            ),
        }
    }

    fn local(&self, session: &mut ConversationSession, action: LocalAction) -> ChatReply {
        match action {
            LocalAction::ShowCourseMenu => self.course.menu(),
            LocalAction::ShowSubsidyMenu => self.subsidy.menu(),
            LocalAction::ShowSubsidyHelp => recover(AgentKind::Subsidy, self.subsidy.status_help()),
            LocalAction::ShowMainMenu => self.main_menu(),
            LocalAction::ShowFaqList => {
                recover(AgentKind::Faq, self.faq.browse(&mut session.context))
            }
            LocalAction::PromptCourseSearch => self.course.prompt_search(&mut session.context),
        }
    }

    async fn by_category(
        &self,
        session: &mut ConversationSession,
        category: IntentCategory,
        utterance: &str,
    ) -> ChatReply {
        match category {
            IntentCategory::Greeting => self.greeting(utterance),
            c if c.is_course() => self.course.handle(session, utterance).await,
            IntentCategory::SubsidyEligibility => self.subsidy.handle(session, utterance).await,
            IntentCategory::GeneralFaq => self.faq.handle(session, utterance).await,
            IntentCategory::Enrollment => self.enrollment.handle(session, utterance).await,
            IntentCategory::HumanService => self.human.handle(session, utterance).await,
            _ => self.unknown(&mut session.context, utterance),
        }
    }

    fn main_menu(&self) -> ChatReply {
        ChatReply::new(
            MAIN_MENU_TEXT,
            menu_or_default(&self.knowledge, MenuKind::Main, MAIN_MENU_DEFAULTS),
        )
    }

    fn greeting(&self, utterance: &str) -> ChatReply {
        match self.knowledge.default_responses() {
            Ok(responses) => match responses.greeting(Some(utterance)) {
                Some(greeting) => ChatReply::new(
                    greeting.response.clone(),
                    greeting.quick_options.iter().cloned(),
                ),
                None => self.main_menu(),
            },
            Err(e) => {
                warn!(error = %e, "Greeting responses unavailable");
                self.main_menu()
            }
        }
    }

    /// FAQ search, then the canned unknown response, then the main menu.
    fn unknown(&self, ctx: &mut ConversationContext, utterance: &str) -> ChatReply {
        match self.faq.search_only(ctx, utterance) {
            Ok(Some(reply)) => return reply,
            Ok(None) => {}
            Err(e) => warn!(error = %e, "FAQ search failed for unclassified input"),
        }

        match self.knowledge.default_responses() {
            Ok(responses) => {
                if let Some(unknown) = responses.unknown() {
                    return ChatReply::new(
                        unknown.default.clone(),
                        unknown.quick_options.iter().cloned(),
                    );
                }
            }
            Err(e) => warn!(error = %e, "Unknown response unavailable"),
        }

        ChatReply::new(
            UNKNOWN_FALLBACK,
            menu_or_default(&self.knowledge, MenuKind::Main, MAIN_MENU_DEFAULTS),
        )
    }
}
