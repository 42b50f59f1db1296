//! Human-service agent: hands the user over to a staff contact.

use async_trait::async_trait;
use tracing::{debug, warn};
use trainbot_kb::ServiceInfo;

use super::{recover, AgentKind, AgentServices, DomainAgent};
use crate::error::ChatResult;
use crate::llm::CompletionOptions;
use crate::session::ConversationSession;
use crate::types::{ChatReply, ClientDevice, Message};

const PARAPHRASE_PROMPT: &str =
    "你是客服助理。請用一句話（15字以內）總結用戶想諮詢的問題。只回答總結，不要其他說明。";

pub struct HumanServiceAgent {
    services: AgentServices,
}

impl HumanServiceAgent {
    pub fn new(services: AgentServices) -> Self {
        Self { services }
    }

    /// Every contact channel, optionally headed by the user's need.
    pub fn contact_card(&self, device: ClientDevice, need: Option<&str>) -> ChatResult<ChatReply> {
        let info = self.services.knowledge.service_info()?;

        let mut content = "我會為您轉接真人客服 ☎️\n\n".to_string();
        if let Some(need) = need {
            content.push_str(&format!("**您的需求**：{}\n\n", need));
        }
        content.push_str(&render_channels(&info, device));

        Ok(ChatReply::new(content, ["回到主選單", "查看課程", "補助資格"]))
    }

    /// One-line summary of what the user wants; `None` on any failure.
    async fn paraphrase(&self, utterance: &str) -> Option<String> {
        let messages = [Message::system(PARAPHRASE_PROMPT), Message::user(utterance)];
        match self
            .services
            .llm
            .chat(
                &messages,
                &self.services.models.classification,
                CompletionOptions::PARAPHRASE,
            )
            .await
        {
            Ok(text) => {
                let text = text.trim();
                (!text.is_empty()).then(|| text.to_string())
            }
            Err(e) => {
                warn!(error = %e, "Need paraphrase failed, omitting");
                None
            }
        }
    }
}

#[async_trait]
impl DomainAgent for HumanServiceAgent {
    fn kind(&self) -> AgentKind {
        AgentKind::HumanService
    }

    async fn handle(&self, session: &mut ConversationSession, utterance: &str) -> ChatReply {
        let need = self.paraphrase(utterance).await;
        debug!(has_need = need.is_some(), "Handing over to staff");
        recover(self.kind(), self.contact_card(session.device, need.as_deref()))
    }
}

fn render_channels(info: &ServiceInfo, device: ClientDevice) -> String {
    let contact = &info.contact;
    let mut content = "📞 **聯絡方式**\n\n**電話**：\n".to_string();

    let phones: Vec<&str> = if contact.phone.main.is_empty() {
        vec![contact.phone.display.as_str()]
    } else {
        contact.phone.main.iter().map(String::as_str).collect()
    };
    for phone in phones {
        content.push_str(&format!("• {}\n", phone));
    }
    content.push_str(&format!("服務時間：{}\n\n", contact.phone.available_hours));

    content.push_str("**LINE 官方帳號**：\n");
    match device {
        ClientDevice::Mobile => {
            content.push_str(&format!("• [加入 LINE 好友]({})\n\n", contact.line.link));
        }
        ClientDevice::Desktop => {
            content.push_str(&format!("```\n{}\n```\n\n", contact.line.id));
        }
    }

    content.push_str(&format!("**Email**：\n• {}\n\n", contact.email.general));

    content.push_str(&format!("**地址**：\n{}\n", contact.address.full));
    if !contact.address.note.is_empty() {
        content.push_str(&format!("（{}）\n", contact.address.note));
    }

    content.push_str("\n💡 建議：\n• 電話聯絡最快速\n• LINE 留言我們會盡快回覆\n• 歡迎直接到中心洽詢");
    content
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::test_support::{services, session};
    use crate::mock::MockLanguageModel;

    #[test]
    fn test_desktop_card_uses_code_block() {
        let agent = HumanServiceAgent::new(services(MockLanguageModel::new()));
        let reply = agent.contact_card(ClientDevice::Desktop, None).unwrap();

        assert!(reply.content.starts_with("我會為您轉接真人客服 ☎️\n\n📞"));
        assert!(reply.content.contains("```\n@ouy9482x\n```"));
        assert!(reply.content.contains("• 03-4227724"));
        assert!(reply.content.contains("（近中壢火車站，步行約8分鐘）"));
        assert_eq!(reply.quick_options, vec!["回到主選單", "查看課程", "補助資格"]);
    }

    #[test]
    fn test_mobile_card_uses_link() {
        let agent = HumanServiceAgent::new(services(MockLanguageModel::new()));
        let reply = agent.contact_card(ClientDevice::Mobile, None).unwrap();
        assert!(reply
            .content
            .contains("[加入 LINE 好友](https://line.me/R/ti/p/@ouy9482x)"));
        assert!(!reply.content.contains("```"));
    }

    #[tokio::test]
    async fn test_paraphrase_heads_card() {
        let mock = MockLanguageModel::new().add_response("  詢問退費規定 \n");
        let agent = HumanServiceAgent::new(services(mock.clone()));

        let reply = agent.handle(&mut session(), "我想找人問退費的事").await;
        assert!(reply.content.contains("**您的需求**：詢問退費規定\n\n"));

        let call = &mock.get_calls()[0];
        assert_eq!(call.options, CompletionOptions::PARAPHRASE);
        assert_eq!(call.last_content(), "我想找人問退費的事");
    }

    #[tokio::test]
    async fn test_paraphrase_failure_omitted() {
        let agent = HumanServiceAgent::new(services(MockLanguageModel::new().add_failure("down")));
        let reply = agent.handle(&mut session(), "找真人").await;
        assert!(!reply.content.contains("您的需求"));
        assert!(reply.content.contains("03-4227723"));
    }
}
