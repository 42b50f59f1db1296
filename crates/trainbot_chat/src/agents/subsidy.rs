//! Subsidy agent.
//!
//! Answers depend on the applicant's employment status. The status is only
//! taken from an explicit statement or a quick action and is never guessed;
//! until it is known every answer is the clarifying prompt.

use async_trait::async_trait;
use tracing::info;
use trainbot_kb::{CourseType, MenuKind, SubsidyRuleSet};

use super::{menu_or_default, recover, AgentKind, AgentServices, DomainAgent};
use crate::context::{ConversationContext, EmploymentStatus, LastAction};
use crate::error::ChatResult;
use crate::session::ConversationSession;
use crate::types::ChatReply;
use crate::vocab;

/// Identities listed with their documents.
const MAX_DOCUMENT_IDENTITIES: usize = 5;
/// Identities listed with their criteria.
const MAX_LISTED_IDENTITIES: usize = 8;
/// Identities named in the general summary.
const MAX_SUMMARY_IDENTITIES: usize = 5;
const CRITERIA_CHARS: usize = 40;

const STATUS_OPTIONS: [&str; 3] = ["我是在職者", "我是待業者", "不確定身份"];

const STATUS_EXPLANATION: &str = "為了提供正確的補助資訊，請問您目前的就業狀況是？\n\n\
📋 **補助類型說明**：\n\n\
**在職者補助**\n• 適用：目前有工作，投保勞保/就保\n• 補助：80%（特定身份可100%）\n• 上課：週末上課\n\n\
**待業者補助**\n• 適用：目前失業，待業中\n• 補助：80-100%\n• 上課：週一至週五全日制";

pub struct SubsidyAgent {
    services: AgentServices,
}

impl SubsidyAgent {
    pub fn new(services: AgentServices) -> Self {
        Self { services }
    }

    /// Serve a quick action. A status from the action overwrites the stored
    /// one; a keyword replaces the utterance.
    pub async fn route(
        &self,
        session: &mut ConversationSession,
        status: Option<EmploymentStatus>,
        keyword: Option<&str>,
        utterance: &str,
    ) -> ChatReply {
        if let Some(status) = status {
            info!(session_id = %session.id(), ?status, "Employment status set by quick action");
            session.context.employment_status = status;
        }
        self.handle(session, keyword.unwrap_or(utterance)).await
    }

    /// The subsidy menu shown from the main menu.
    pub fn menu(&self) -> ChatReply {
        ChatReply::new(
            format!("💰 **補助諮詢**\n\n{}", STATUS_EXPLANATION),
            menu_or_default(&self.services.knowledge, MenuKind::Subsidy, &STATUS_OPTIONS),
        )
    }

    /// Guidance for applicants unsure of their status.
    pub fn status_help(&self) -> ChatResult<ChatReply> {
        let info = self.services.knowledge.service_info()?;
        Ok(ChatReply::new(
            format!(
                "💡 **如何判斷您的就業身份**\n\n\
                 **在職者**\n✅ 目前有工作\n✅ 有投保勞保、就保、職災保或農保\n✅ 課程通常在週末上課\n\n\
                 **待業者**\n✅ 目前沒有工作\n✅ 正在找工作或待業中\n✅ 課程通常是全日制（週一至週五）\n\n\
                 **還是不確定？**\n您可以：\n1. 聯絡客服：{}\n2. LINE：{}\n3. 我們會協助您判斷適合的補助類型",
                info.contact.phone.display, info.contact.line.id
            ),
            ["我是在職者", "我是待業者", "聯絡客服"],
        ))
    }

    fn ask_status(&self, ctx: &mut ConversationContext) -> ChatReply {
        ctx.last_action = LastAction::SubsidyQuestion;
        ChatReply::new(STATUS_EXPLANATION, STATUS_OPTIONS)
    }

    fn answer(
        &self,
        ctx: &mut ConversationContext,
        status: CourseType,
        utterance: &str,
    ) -> ChatResult<ChatReply> {
        let rules = self.services.knowledge.subsidy_rules(status)?;

        if vocab::SUBSIDY_DOCUMENT.is_match(utterance) {
            ctx.last_action = LastAction::SubsidyQuestion;
            return Ok(documents_reply(status, &rules));
        }
        if vocab::SPECIAL_IDENTITY.is_match(utterance) {
            ctx.last_action = LastAction::SubsidyQuestion;
            return Ok(identities_reply(status, &rules));
        }

        ctx.last_action = LastAction::SubsidyInfo;
        Ok(summary_reply(status, &rules))
    }
}

#[async_trait]
impl DomainAgent for SubsidyAgent {
    fn kind(&self) -> AgentKind {
        AgentKind::Subsidy
    }

    async fn handle(&self, session: &mut ConversationSession, utterance: &str) -> ChatReply {
        let ctx = &mut session.context;

        if !ctx.employment_status.is_known() {
            match vocab::employment_in(utterance) {
                Some(detected) => {
                    info!(status = detected.label(), "Employment status detected");
                    ctx.employment_status = detected.into();
                }
                None => return self.ask_status(ctx),
            }
        }

        let Some(status) = ctx.employment_status.course_type() else {
            return self.ask_status(ctx);
        };
        recover(self.kind(), self.answer(ctx, status, utterance))
    }
}

fn follow_up_options(status: CourseType) -> [&'static str; 4] {
    match status {
        CourseType::Employed => ["我符合特定身份嗎", "如何申請補助", "查看課程", "聯絡客服"],
        CourseType::Unemployed => ["我符合全額補助嗎", "查看課程", "報名流程", "聯絡客服"],
    }
}

fn summary_reply(status: CourseType, rules: &SubsidyRuleSet) -> ChatReply {
    let mut content = format!("💰 **{}者補助資訊**\n\n", status.label());

    for rule in &rules.rules {
        content.push_str(&format!("**{}**\n補助比例：{}\n", rule.title, rule.subsidy_rate));
        if !rule.description.is_empty() {
            content.push_str(&format!("{}\n", rule.description));
        }

        if !rule.requirements.is_empty() {
            content.push_str("\n📌 **申請條件**：\n");
            for requirement in &rule.requirements {
                content.push_str(&format!("• {}\n", requirement));
            }
        }

        if !rule.special_identities.is_empty() {
            content.push_str("\n✨ **特定身份**（可享100%補助）：\n");
            for identity in rule.special_identities.iter().take(MAX_SUMMARY_IDENTITIES) {
                content.push_str(&format!("• {}\n", identity.name));
            }
            if rule.special_identities.len() > MAX_SUMMARY_IDENTITIES {
                content.push_str("• ...等\n");
            }
        }

        content.push_str(&format!("\n{}\n\n", "-".repeat(30)));
    }

    if let Some(note) = rules.note() {
        content.push_str(&format!("⚠️ **注意事項**：\n{}", note));
    }

    ChatReply::new(content.trim_end().to_string(), follow_up_options(status))
}

fn documents_reply(status: CourseType, rules: &SubsidyRuleSet) -> ChatReply {
    let mut content = format!("📋 **{}者補助申請文件**\n\n", status.label());

    let mut general: Vec<&str> = Vec::new();
    for document in rules.rules.iter().flat_map(|rule| &rule.documents_required) {
        if !general.contains(&document.as_str()) {
            general.push(document);
        }
    }
    if !general.is_empty() {
        content.push_str("**一般應備文件**：\n");
        for document in &general {
            content.push_str(&format!("• {}\n", document));
        }
        content.push('\n');
    }

    let identities: Vec<_> = rules.special_identities().collect();
    if !identities.is_empty() {
        content.push_str("**特定身份證明文件**：\n");
        for (_, identity) in identities.iter().take(MAX_DOCUMENT_IDENTITIES) {
            let documents = if identity.documents.is_empty() {
                "請洽客服確認".to_string()
            } else {
                identity.documents.join("、")
            };
            content.push_str(&format!("• {}：{}\n", identity.name, documents));
        }
        if identities.len() > MAX_DOCUMENT_IDENTITIES {
            content.push_str(&format!(
                "• 另有 {} 種特定身份，所需文件請洽客服\n",
                identities.len() - MAX_DOCUMENT_IDENTITIES
            ));
        }
    }

    let first_option = follow_up_options(status)[0];
    ChatReply::new(
        content.trim_end().to_string(),
        [first_option, "補助多少錢", "何時撥款", "聯絡客服"],
    )
}

fn identities_reply(status: CourseType, rules: &SubsidyRuleSet) -> ChatReply {
    let identities: Vec<_> = rules.special_identities().collect();

    if identities.is_empty() {
        return ChatReply::new(
            format!("目前{}者可享基本補助，如需了解更多請聯絡客服。", status.label()),
            ["查看課程", "報名流程", "聯絡客服"],
        );
    }

    let mut content = format!(
        "✨ **{}者特定身份補助（100%）**\n\n符合以下身份者，可申請**全額補助**：\n\n",
        status.label()
    );
    for (_, identity) in identities.iter().take(MAX_LISTED_IDENTITIES) {
        let criteria = truncate(&identity.criteria, CRITERIA_CHARS);
        if criteria.is_empty() {
            content.push_str(&format!("• **{}**\n", identity.name));
        } else {
            content.push_str(&format!("• **{}**：{}\n", identity.name, criteria));
        }
    }
    if identities.len() > MAX_LISTED_IDENTITIES {
        content.push_str(&format!(
            "• ...另有 {} 種身份\n",
            identities.len() - MAX_LISTED_IDENTITIES
        ));
    }

    ChatReply::new(
        content.trim_end().to_string(),
        ["需要什麼證明文件", "查看課程", "報名流程", "聯絡客服"],
    )
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let mut cut: String = text.chars().take(max).collect();
        cut.push('…');
        cut
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::test_support::{services, session};
    use crate::mock::MockLanguageModel;

    fn agent() -> SubsidyAgent {
        SubsidyAgent::new(services(MockLanguageModel::new()))
    }

    #[tokio::test]
    async fn test_unknown_status_always_asks() {
        let agent = agent();
        let mut session = session();

        let reply = agent.handle(&mut session, "需要什麼證明文件").await;
        assert_eq!(reply.quick_options, STATUS_OPTIONS.map(String::from).to_vec());
        assert_eq!(session.context.employment_status, EmploymentStatus::Unknown);
        assert_eq!(session.context.last_action, LastAction::SubsidyQuestion);
    }

    #[tokio::test]
    async fn test_status_detected_from_text() {
        let agent = agent();
        let mut session = session();

        let reply = agent.handle(&mut session, "我目前失業，可以補助嗎").await;
        assert_eq!(session.context.employment_status, EmploymentStatus::Unemployed);
        assert_eq!(session.context.last_action, LastAction::SubsidyInfo);
        assert!(reply.content.starts_with("💰 **待業者補助資訊**"));
        assert_eq!(reply.quick_options[0], "我符合全額補助嗎");
    }

    #[tokio::test]
    async fn test_status_is_sticky() {
        let agent = agent();
        let mut session = session();
        session.context.employment_status = EmploymentStatus::Employed;

        let reply = agent.handle(&mut session, "我想找工作").await;
        assert_eq!(session.context.employment_status, EmploymentStatus::Employed);
        assert!(reply.content.contains("在職者"));
    }

    #[tokio::test]
    async fn test_quick_action_overwrites_status() {
        let agent = agent();
        let mut session = session();
        session.context.employment_status = EmploymentStatus::Employed;

        agent
            .route(&mut session, Some(EmploymentStatus::Unemployed), None, "我是待業者")
            .await;
        assert_eq!(session.context.employment_status, EmploymentStatus::Unemployed);
    }

    #[tokio::test]
    async fn test_documents_branch_caps_identities() {
        let agent = agent();
        let mut session = session();
        session.context.employment_status = EmploymentStatus::Unemployed;

        let reply = agent.route(&mut session, None, Some("證明"), "需要什麼文件").await;
        assert!(reply.content.contains("**一般應備文件**"));
        assert!(reply.content.contains("另有 4 種特定身份"));
        assert_eq!(session.context.last_action, LastAction::SubsidyQuestion);
    }

    #[tokio::test]
    async fn test_identity_branch() {
        let agent = agent();
        let mut session = session();
        session.context.employment_status = EmploymentStatus::Unemployed;

        let reply = agent.handle(&mut session, "我符合全額補助嗎").await;
        assert!(reply.content.contains("全額補助"));
        assert!(reply.content.contains("另有 1 種身份"));
        assert_eq!(session.context.last_action, LastAction::SubsidyQuestion);
    }

    #[test]
    fn test_truncate_criteria() {
        assert_eq!(truncate("短", 40), "短");
        let long = "長".repeat(45);
        let cut = truncate(&long, 40);
        assert_eq!(cut.chars().count(), 41);
        assert!(cut.ends_with('…'));
    }
}
