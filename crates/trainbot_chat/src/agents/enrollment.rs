//! Enrollment agent: step-by-step application process per course track.

use async_trait::async_trait;
use tracing::debug;
use trainbot_kb::{CourseType, EnrollmentProcess, ServiceInfo};

use super::{recover, AgentKind, AgentServices, DomainAgent};
use crate::error::ChatResult;
use crate::session::ConversationSession;
use crate::types::ChatReply;
use crate::vocab;

pub struct EnrollmentAgent {
    services: AgentServices,
}

impl EnrollmentAgent {
    pub fn new(services: AgentServices) -> Self {
        Self { services }
    }

    /// Serve a quick action, with or without a track.
    pub async fn route(
        &self,
        session: &mut ConversationSession,
        track: Option<CourseType>,
        utterance: &str,
    ) -> ChatReply {
        match track {
            Some(track) => recover(self.kind(), self.process(track)),
            None => self.handle(session, utterance).await,
        }
    }

    /// Track named in the utterance, else the known employment status.
    pub fn detect_track(
        &self,
        session: &ConversationSession,
        utterance: &str,
    ) -> Option<CourseType> {
        vocab::enrollment_track(utterance)
            .or_else(|| session.context.employment_status.course_type())
    }

    pub fn process(&self, track: CourseType) -> ChatResult<ChatReply> {
        let process = self.services.knowledge.enrollment_process(track)?;
        let info = self.services.knowledge.service_info()?;

        let options: &[&str] = match track {
            CourseType::Unemployed => &["甄試準備什麼", "查看待業課程", "補助資格", "聯絡客服"],
            CourseType::Employed => &["查看在職課程", "補助資格", "聯絡客服"],
        };
        Ok(ChatReply::new(render_process(&process, &info), options.iter().copied()))
    }

    fn ask_track(&self) -> ChatReply {
        ChatReply::new(
            "請問您想了解哪種課程的報名流程？\n\n📚 **課程類型**：\n\n\
             **待業課程**\n• 全日制（週一至週五 9:00-17:00）\n• 需參加甄試\n• 政府補助80-100%\n\n\
             **在職課程**\n• 週末上課\n• 線上報名即可\n• 結訓後可申請80%補助",
            ["待業課程報名", "在職課程報名"],
        )
    }
}

#[async_trait]
impl DomainAgent for EnrollmentAgent {
    fn kind(&self) -> AgentKind {
        AgentKind::Enrollment
    }

    async fn handle(&self, session: &mut ConversationSession, utterance: &str) -> ChatReply {
        match self.detect_track(session, utterance) {
            Some(track) => {
                debug!(track = track.label(), "Enrollment track resolved");
                recover(self.kind(), self.process(track))
            }
            None => self.ask_track(),
        }
    }
}

fn render_process(process: &EnrollmentProcess, info: &ServiceInfo) -> String {
    let mut content = format!("📝 **{}**\n\n", process.title);

    for step in &process.steps {
        content.push_str(&format!(
            "**步驟 {}：{}**\n{}\n",
            step.step, step.title, step.description
        ));
        if let Some(url) = &step.url {
            content.push_str(&format!("🔗 {}\n", url));
        }
        if !step.documents.is_empty() {
            content.push_str("📋 需準備：\n");
            for document in &step.documents {
                content.push_str(&format!("  • {}\n", document));
            }
        }
        if let Some(note) = &step.note {
            content.push_str(&format!("⚠️ {}\n", note));
        }
        if let Some(deadline) = &step.deadline {
            content.push_str(&format!("⏰ {}\n", deadline));
        }
        content.push('\n');
    }

    content.push_str(&format!(
        "📞 **聯絡方式**\n電話：{}\nLINE：{}\n地址：{}",
        info.contact.phone.display, info.contact.line.id, info.contact.address.full
    ));
    content
}
