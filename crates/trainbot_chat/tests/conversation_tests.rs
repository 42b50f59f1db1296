//! End-to-end conversation tests over the shipped knowledge documents.

use std::path::PathBuf;
use std::sync::Arc;

use trainbot_chat::router;
use trainbot_chat::{
    ChatEngine, ChatRequest, ClientDevice, EmploymentStatus, LastAction, MockLanguageModel,
    ModelSelection,
};
use trainbot_kb::KnowledgeStore;

fn knowledge_dir() -> PathBuf {
    PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/../../knowledge"))
}

fn engine(llm: MockLanguageModel, max_history: usize) -> ChatEngine {
    ChatEngine::new(
        Arc::new(KnowledgeStore::new(knowledge_dir())),
        Arc::new(llm),
        ModelSelection::uniform("test-model"),
        max_history,
    )
}

async fn say(engine: &ChatEngine, text: &str) -> trainbot_chat::ChatReply {
    engine.handle(ChatRequest::new("e2e", text)).await
}

#[tokio::test]
async fn test_list_then_select_then_ask_documents() {
    let engine = engine(MockLanguageModel::new(), 20);

    let list = say(&engine, "待業課程").await;
    assert!(list.content.contains("共 7 門課程"));
    assert_eq!(list.quick_options[..6], ["1", "2", "3", "4", "5", "更多"]);

    let ctx = engine.context("e2e").await.unwrap();
    assert_eq!(ctx.last_action, LastAction::CourseList);
    assert_eq!(ctx.display_offset(), 0);

    let detail = say(&engine, "3").await;
    assert!(detail.content.starts_with("📚 **UI/UX介面設計班**"));
    let again = say(&engine, "3").await;
    assert_eq!(again.content, detail.content);

    let ctx = engine.context("e2e").await.unwrap();
    assert_eq!(ctx.last_course.as_ref().map(|c| c.id), Some(103));

    let prompt = say(&engine, "需要什麼證明文件").await;
    assert_eq!(prompt.quick_options, vec!["我是在職者", "我是待業者", "不確定身份"]);
    let ctx = engine.context("e2e").await.unwrap();
    assert_eq!(ctx.employment_status, EmploymentStatus::Unknown);
    assert_eq!(ctx.last_action, LastAction::SubsidyQuestion);
}

#[tokio::test]
async fn test_pagination_stops_at_end() {
    let engine = engine(MockLanguageModel::new(), 20);
    say(&engine, "待業課程").await;

    let second = say(&engine, "更多").await;
    assert!(second.content.contains("目前顯示第 6-7 門"));
    assert_eq!(second.quick_options[..2], ["1", "2"]);
    assert!(!second.quick_options.contains(&"更多".to_string()));

    let end = say(&engine, "還有嗎").await;
    assert!(end.content.starts_with("📋 已經是最後一頁了"));
    let ctx = engine.context("e2e").await.unwrap();
    assert_eq!(ctx.display_offset(), 5);

    // Labels stay page-relative after paging.
    let detail = say(&engine, "2").await;
    assert!(detail.content.starts_with("📚 **室內設計製圖班**"));
}

#[tokio::test]
async fn test_employment_status_is_sticky() {
    let engine = engine(MockLanguageModel::new(), 20);

    let summary = say(&engine, "我是在職者").await;
    assert!(summary.content.starts_with("💰 **在職者補助資訊**"));

    let documents = say(&engine, "失業的人要準備哪些資料").await;
    assert!(documents.content.starts_with("📋 **在職者補助申請文件**"));
    let ctx = engine.context("e2e").await.unwrap();
    assert_eq!(ctx.employment_status, EmploymentStatus::Employed);

    say(&engine, "我是待業者").await;
    let ctx = engine.context("e2e").await.unwrap();
    assert_eq!(ctx.employment_status, EmploymentStatus::Unemployed);
}

#[tokio::test]
async fn test_search_keyword_after_prompt_with_known_status() {
    let engine = engine(MockLanguageModel::new(), 20);
    say(&engine, "我是在職者").await;

    let prompt = say(&engine, "搜尋課程").await;
    assert!(prompt.content.starts_with("🔍 **課程搜尋**"));

    let results = say(&engine, "資料分析").await;
    assert!(results.content.contains("🔍 **搜尋結果：資料分析**"));
    assert_eq!(results.quick_options[..2], ["1", "2"]);

    let ctx = engine.context("e2e").await.unwrap();
    assert_eq!(ctx.last_action, LastAction::SearchResult);
    assert_eq!(ctx.course_list().len(), 2);
    assert_eq!(ctx.employment_status, EmploymentStatus::Employed);
}

#[tokio::test]
async fn test_faq_quick_action_answers_single_merged_entry() {
    let engine = engine(MockLanguageModel::new(), 20);
    let reply = say(&engine, "如何申請補助").await;
    assert!(reply.content.starts_with("**如何申請補助？**"));
}

#[tokio::test]
async fn test_unknown_with_model_failure_uses_canned_response() {
    let llm = MockLanguageModel::new().simulate_failure("provider down");
    let engine = engine(llm.clone(), 20);

    let reply = say(&engine, "今天天氣如何").await;
    assert!(reply.content.starts_with("抱歉，我不太確定您的問題"));
    assert_eq!(
        reply.quick_options,
        vec!["課程查詢", "補助諮詢", "常見問題", "聯絡客服"]
    );
    // Only the classification call was attempted.
    assert_eq!(llm.call_count(), 1);
}

#[tokio::test]
async fn test_classified_enrollment_uses_track_keyword() {
    let engine = engine(MockLanguageModel::new().add_response("5"), 20);
    let reply = say(&engine, "在職的人怎麼報名").await;
    assert!(reply.content.starts_with("📝 **在職課程報名流程**"));
}

#[tokio::test]
async fn test_human_service_renders_for_device() {
    let engine = engine(MockLanguageModel::new(), 20);

    let desktop = say(&engine, "聯絡客服").await;
    assert!(desktop.content.contains("```\n@ouy9482x\n```"));

    let mobile = engine
        .handle(ChatRequest::new("e2e", "聯絡客服").with_device(ClientDevice::Mobile))
        .await;
    assert!(mobile.content.contains("[加入 LINE 好友]("));
}

#[tokio::test]
async fn test_history_stays_bounded() {
    let engine = engine(MockLanguageModel::new(), 4);
    for text in ["待業課程", "1", "更多", "回到主選單", "在職課程"] {
        say(&engine, text).await;
    }
    let info = engine.session_info("e2e").await.unwrap();
    assert_eq!(info.message_count, 4);
}

#[tokio::test]
async fn test_sessions_are_isolated() {
    let engine = engine(MockLanguageModel::new(), 20);
    say(&engine, "待業課程").await;
    engine.handle(ChatRequest::new("other", "在職課程")).await;

    let first = engine.context("e2e").await.unwrap();
    let second = engine.context("other").await.unwrap();
    assert_eq!(first.course_list().len(), 7);
    assert!(second
        .course_list()
        .iter()
        .all(|c| c.id != first.course_list()[0].id));
    assert_eq!(engine.sessions().len(), 2);
}

#[tokio::test]
async fn test_end_session_forgets_conversation() {
    let engine = engine(MockLanguageModel::new(), 20);
    say(&engine, "待業課程").await;
    assert!(engine.context("e2e").await.is_some());

    assert!(engine.end_session("e2e"));
    assert!(engine.context("e2e").await.is_none());
    assert!(engine.sessions().is_empty());
    assert!(!engine.end_session("e2e"));

    // A later turn starts from a fresh context.
    say(&engine, "3").await;
    let ctx = engine.context("e2e").await.unwrap();
    assert!(ctx.last_course.is_none());
}

#[test]
fn test_routing_is_normalization_invariant() {
    assert_eq!(
        router::match_label(" 我符合 特定身份嗎？"),
        router::match_label("我符合特定身份嗎")
    );
    assert_eq!(router::match_label("python"), router::match_label("Python"));
}

#[test]
fn test_every_knowledge_quick_option_routes() {
    let store = KnowledgeStore::new(knowledge_dir());

    let config = store.quick_options().unwrap();
    for label in config.all_labels() {
        assert!(router::match_label(label).is_some(), "unrouted button: {}", label);
    }

    let responses = store.default_responses().unwrap();
    let canned = responses
        .greetings
        .responses
        .iter()
        .flat_map(|r| r.quick_options.iter())
        .chain(responses.unknown.responses.iter().flat_map(|r| r.quick_options.iter()));
    for label in canned {
        assert!(router::match_label(label).is_some(), "unrouted reply option: {}", label);
    }

    let catalog = store.catalog().unwrap();
    for course in catalog.courses() {
        for label in &course.related_questions {
            assert!(router::match_label(label).is_some(), "unrouted course option: {}", label);
        }
    }

    let faqs = [store.general_faq().unwrap(), store.subsidy_faq().unwrap()];
    for faq in faqs.iter().flat_map(|doc| doc.faqs.iter()) {
        for label in &faq.related_questions {
            assert!(router::match_label(label).is_some(), "unrouted FAQ option: {}", label);
        }
    }
}
