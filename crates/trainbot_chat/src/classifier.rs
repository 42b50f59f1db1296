//! Intent classification for utterances no context rule claimed.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, warn};

use crate::llm::{CompletionOptions, LanguageModel};
use crate::types::Message;

/// The ten intent categories, numbered as the model is asked to reply.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum IntentCategory {
    Greeting = 0,
    CourseDetail = 1,
    CourseList = 2,
    SubsidyEligibility = 3,
    GeneralFaq = 4,
    Enrollment = 5,
    FeaturedCourses = 6,
    CourseSearch = 7,
    HumanService = 8,
    Unknown = 9,
}

impl IntentCategory {
    pub fn from_number(n: u64) -> Self {
        match n {
            0 => Self::Greeting,
            1 => Self::CourseDetail,
            2 => Self::CourseList,
            3 => Self::SubsidyEligibility,
            4 => Self::GeneralFaq,
            5 => Self::Enrollment,
            6 => Self::FeaturedCourses,
            7 => Self::CourseSearch,
            8 => Self::HumanService,
            _ => Self::Unknown,
        }
    }

    pub fn number(&self) -> u8 {
        *self as u8
    }

    /// Read the leading integer of a model reply. Anything unusable is
    /// [`IntentCategory::Unknown`].
    pub fn parse_reply(reply: &str) -> Self {
        let digits: String = reply
            .trim()
            .chars()
            .take_while(char::is_ascii_digit)
            .collect();
        digits
            .parse::<u64>()
            .map(Self::from_number)
            .unwrap_or(Self::Unknown)
    }

    /// Whether the course agent serves this category.
    pub fn is_course(&self) -> bool {
        matches!(
            self,
            Self::CourseDetail | Self::CourseList | Self::FeaturedCourses | Self::CourseSearch
        )
    }
}

/// Maps an utterance to an [`IntentCategory`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IntentClassifier: Send + Sync {
    /// Never fails: problems degrade to [`IntentCategory::Unknown`].
    async fn classify(&self, utterance: &str) -> IntentCategory;
}

const CLASSIFICATION_PROMPT: &str = "你是虹宇職訓的智能客服分類系統。請將用戶問題分類為以下類別之一，只需回覆數字：

0 - 打招呼/閒聊（例如：你好、早安、謝謝）
1 - 課程內容查詢（例如：這個課程教什麼、課程內容、上課地點、報名截止時間）
2 - 課程清單查詢（例如：有哪些課程、待業課程、在職課程、課程列表）
3 - 補助資格判斷（例如：我可以申請補助嗎、補助資格、政府補助）
4 - 常見問題（例如：如何報名、需要準備什麼、上課時間）
5 - 報名流程說明（例如：怎麼報名、報名步驟、報名方式）
6 - 精選課程查詢（例如：推薦課程、熱門課程、最新課程）
7 - 課程搜尋（例如：AI課程、行銷課程、包含關鍵字的搜尋）
8 - 真人客服轉接（例如：我要找客服、轉真人、聯絡客服）
9 - 未知/其他（無法歸類的問題）

請務必只回覆一個數字（0-9），不要有其他說明。";

/// Classifier backed by a language model.
pub struct LlmIntentClassifier {
    llm: Arc<dyn LanguageModel>,
    model: String,
}

impl LlmIntentClassifier {
    pub fn new(llm: Arc<dyn LanguageModel>, model: impl Into<String>) -> Self {
        Self {
            llm,
            model: model.into(),
        }
    }
}

#[async_trait]
impl IntentClassifier for LlmIntentClassifier {
    async fn classify(&self, utterance: &str) -> IntentCategory {
        let messages = [Message::system(CLASSIFICATION_PROMPT), Message::user(utterance)];

        match self
            .llm
            .chat(&messages, &self.model, CompletionOptions::CLASSIFICATION)
            .await
        {
            Ok(reply) => {
                let category = IntentCategory::parse_reply(&reply);
                debug!(?category, reply = %reply.trim(), "Classified utterance");
                category
            }
            Err(e) => {
                warn!(error = %e, "Classification failed, treating as unknown");
                IntentCategory::Unknown
            }
        }
    }
}
