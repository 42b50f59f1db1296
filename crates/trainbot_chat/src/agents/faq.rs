//! FAQ agent.
//!
//! Searches the general and subsidy FAQ documents, answers a single hit
//! directly and offers several hits as a numbered list for selection.

use async_trait::async_trait;
use tracing::{debug, warn};
use trainbot_kb::FaqEntry;

use super::{recover, AgentKind, AgentServices, DomainAgent};
use crate::context::{ConversationContext, LastAction};
use crate::error::ChatResult;
use crate::session::ConversationSession;
use crate::types::ChatReply;

const PERSONA: &str = "你是虹宇職訓的客服助理。你的職責是：
1. 回答學員的一般問題
2. 提供清晰、準確的資訊
3. 必要時引導學員聯絡客服

常見問題包括：
- 如何報名課程
- 上課地點與時間
- 請假規定
- 結業證書取得

請用繁體中文回答，保持友善、耐心的語氣。如果不確定答案，建議學員聯絡客服。";

/// Candidates offered when a search has several hits.
const MAX_CANDIDATES: usize = 5;
/// Entries in the browse list.
const BROWSE_SIZE: usize = 8;
/// Common questions offered when nothing else worked.
const FALLBACK_QUESTIONS: usize = 4;
const MAX_RELATED: usize = 4;

pub struct FaqAgent {
    services: AgentServices,
}

impl FaqAgent {
    pub fn new(services: AgentServices) -> Self {
        Self { services }
    }

    /// Matching entries from both corpora: general first, duplicate
    /// questions dropped, then stably ordered by priority.
    pub fn search(&self, query: &str) -> ChatResult<Vec<FaqEntry>> {
        let general = self.services.knowledge.general_faq()?;
        let subsidy = self.services.knowledge.subsidy_faq()?;

        let mut results: Vec<FaqEntry> = Vec::new();
        for entry in general.faqs.iter().chain(subsidy.faqs.iter()) {
            if entry.matches(query) && !results.iter().any(|r| r.question == entry.question) {
                results.push(entry.clone());
            }
        }
        results.sort_by_key(FaqEntry::sort_key);

        debug!(query, hits = results.len(), "FAQ search");
        Ok(results)
    }

    /// Search only; `None` when nothing matched.
    pub fn search_only(
        &self,
        ctx: &mut ConversationContext,
        query: &str,
    ) -> ChatResult<Option<ChatReply>> {
        let results = self.search(query)?;
        Ok((!results.is_empty()).then(|| present(ctx, results)))
    }

    /// Numbered list of the top general questions.
    pub fn browse(&self, ctx: &mut ConversationContext) -> ChatResult<ChatReply> {
        let mut top = self.services.knowledge.search_general_faq(None)?;
        top.truncate(BROWSE_SIZE);

        let mut content = "❓ **常見問題**\n\n以下是常見的問題，請選擇您想了解的：\n\n".to_string();
        for (index, faq) in top.iter().enumerate() {
            content.push_str(&format!("{}. {}\n", index + 1, faq.question));
        }
        content.push_str("\n💡 您也可以直接輸入您的問題，我會為您查找答案。");

        let options = number_options(top.len());
        ctx.faq_results = top;
        ctx.last_action = LastAction::FaqList;
        Ok(ChatReply::new(content, options))
    }

    /// Answer the cached candidate at a 1-based position.
    pub fn select(&self, ctx: &mut ConversationContext, position: usize) -> ChatResult<ChatReply> {
        if ctx.faq_results.is_empty() {
            return self.browse(ctx);
        }

        let count = ctx.faq_results.len();
        let Some(entry) = position
            .checked_sub(1)
            .and_then(|index| ctx.faq_results.get(index))
            .cloned()
        else {
            return Ok(ChatReply::new(
                format!("❌ 選擇的編號超出範圍，請輸入 1-{} 之間的編號。", count),
                ["常見問題", "課程列表", "聯絡客服"],
            ));
        };

        ctx.clear_faq();
        Ok(answer(&entry, selection_options(&entry)))
    }

    async fn generate(
        &self,
        session: &mut ConversationSession,
        utterance: &str,
    ) -> ChatResult<ChatReply> {
        let info = self.services.knowledge.service_info()?;
        let context = [
            (
                "聯絡資訊",
                format!(
                    "電話：{}，LINE：{}",
                    info.contact.phone.display, info.contact.line.id
                ),
            ),
            ("上課地點", info.contact.address.full.clone()),
            ("營業時間", info.service_hours.weekdays.clone()),
        ];

        match self
            .services
            .generate(PERSONA, &context, session, utterance)
            .await
        {
            Ok(text) => Ok(ChatReply::new(
                format!(
                    "{}\n\n如需更多協助，歡迎聯絡客服：{}",
                    text, info.contact.phone.display
                ),
                ["查看課程", "補助資格", "報名流程", "聯絡客服"],
            )),
            Err(e) => {
                warn!(error = %e, "FAQ answer generation failed, offering common questions");
                self.common_questions(&mut session.context)
            }
        }
    }

    fn common_questions(&self, ctx: &mut ConversationContext) -> ChatResult<ChatReply> {
        let mut common = self.services.knowledge.search_general_faq(None)?;
        common.truncate(FALLBACK_QUESTIONS);

        let mut content =
            "很抱歉，我可能無法完全理解您的問題。\n\n以下是一些常見問題，或許能幫到您：\n\n".to_string();
        for (index, faq) in common.iter().enumerate() {
            content.push_str(&format!("{}. {}\n", index + 1, faq.question));
        }

        ctx.faq_results = common;
        ctx.last_action = LastAction::FaqList;
        Ok(ChatReply::new(
            content.trim_end().to_string(),
            ["聯絡客服", "查看課程", "補助資格"],
        ))
    }
}

#[async_trait]
impl DomainAgent for FaqAgent {
    fn kind(&self) -> AgentKind {
        AgentKind::Faq
    }

    async fn handle(&self, session: &mut ConversationSession, utterance: &str) -> ChatReply {
        let found = match self.search_only(&mut session.context, utterance) {
            Ok(found) => found,
            Err(e) => return recover(self.kind(), Err(e)),
        };
        match found {
            Some(reply) => reply,
            None => {
                let result = self.generate(session, utterance).await;
                recover(self.kind(), result)
            }
        }
    }
}

fn number_options(count: usize) -> Vec<String> {
    (1..=count).map(|n| n.to_string()).collect()
}

fn answer<I, S>(entry: &FaqEntry, options: I) -> ChatReply
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    ChatReply::new(format!("**{}**\n\n{}", entry.question, entry.answer), options)
}

/// One hit answers directly; several become a numbered candidate list.
fn present(ctx: &mut ConversationContext, mut results: Vec<FaqEntry>) -> ChatReply {
    if results.len() == 1 {
        let entry = &results[0];
        let options: Vec<String> = if entry.related_questions.is_empty() {
            ["常見問題", "查看課程", "補助資格", "聯絡客服"].map(String::from).to_vec()
        } else {
            entry.related_questions.iter().take(MAX_RELATED).cloned().collect()
        };
        return answer(entry, options);
    }

    results.truncate(MAX_CANDIDATES);
    let mut content = "我找到以下相關問題：\n\n".to_string();
    for (index, faq) in results.iter().enumerate() {
        content.push_str(&format!("{}. {}\n", index + 1, faq.question));
    }
    content.push_str("\n💡 請選擇您想了解的問題，或直接描述您的問題");

    let options = number_options(results.len());
    ctx.faq_results = results;
    ctx.last_action = LastAction::FaqList;
    ChatReply::new(content, options)
}

/// Related questions, else options picked by the answer's topic.
fn selection_options(entry: &FaqEntry) -> Vec<String> {
    if !entry.related_questions.is_empty() {
        return entry.related_questions.iter().take(MAX_RELATED).cloned().collect();
    }

    let picked = if entry.answer.contains("課程") {
        ["查看課程", "補助資格", "常見問題"]
    } else if entry.answer.contains("補助") || entry.answer.contains("補貼") {
        ["補助資格", "查看課程", "常見問題"]
    } else if entry.answer.contains("報名") {
        ["報名流程", "查看課程", "常見問題"]
    } else {
        ["課程列表", "補助資格", "聯絡客服"]
    };
    picked.map(String::from).to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::test_support::{services, session};
    use crate::mock::MockLanguageModel;

    #[test]
    fn test_merged_search_dedupes_questions() {
        let agent = FaqAgent::new(services(MockLanguageModel::new()));
        let results = agent.search("補助申請").unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].question, "如何申請補助？");
    }

    #[test]
    fn test_results_sorted_by_priority() {
        let agent = FaqAgent::new(services(MockLanguageModel::new()));
        let results = agent.search("準備").unwrap();
        assert!(results.len() > 1);
        let keys: Vec<u32> = results.iter().map(FaqEntry::sort_key).collect();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);
    }

    #[tokio::test]
    async fn test_several_hits_cache_candidates() {
        let agent = FaqAgent::new(services(MockLanguageModel::new()));
        let mut session = session();

        let reply = agent.handle(&mut session, "準備").await;
        assert_eq!(session.context.last_action, LastAction::FaqList);
        assert_eq!(session.context.faq_results.len(), reply.quick_options.len());
        assert!(reply.quick_options.len() <= MAX_CANDIDATES);
        assert_eq!(reply.quick_options[0], "1");
    }

    #[test]
    fn test_selection_and_range() {
        let agent = FaqAgent::new(services(MockLanguageModel::new()));
        let mut ctx = ConversationContext::new();

        let browse = agent.select(&mut ctx, 1).unwrap();
        assert!(browse.content.starts_with("❓ **常見問題**"));
        assert_eq!(ctx.faq_results.len(), BROWSE_SIZE);

        let out_of_range = agent.select(&mut ctx, 9).unwrap();
        assert!(out_of_range.content.contains("1-8"));
        assert_eq!(ctx.faq_results.len(), BROWSE_SIZE);

        let picked = agent.select(&mut ctx, 1).unwrap();
        assert!(picked.content.starts_with("**如何報名課程？**"));
        assert!(ctx.faq_results.is_empty());
        assert_eq!(ctx.last_action, LastAction::None);
    }

    #[tokio::test]
    async fn test_no_match_generates_with_contact() {
        let mock = MockLanguageModel::new().add_response("我們的教室有冷氣。");
        let agent = FaqAgent::new(services(mock.clone()));
        let mut session = session();

        let reply = agent.handle(&mut session, "教室有冷氣嗎").await;
        assert!(reply.content.starts_with("我們的教室有冷氣。"));
        assert!(reply.content.contains("03-4227723"));
        let call = &mock.get_calls()[0];
        assert!(call.messages[1].content.contains("LINE：@ouy9482x"));
    }

    #[tokio::test]
    async fn test_generation_failure_lists_common_questions() {
        let agent = FaqAgent::new(services(MockLanguageModel::new().add_failure("down")));
        let mut session = session();

        let reply = agent.handle(&mut session, "教室有冷氣嗎").await;
        assert!(reply.content.contains("4. "));
        assert_eq!(session.context.faq_results.len(), FALLBACK_QUESTIONS);
    }
}
