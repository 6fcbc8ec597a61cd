//! LLM 服务 - 业务能力层
//!
//! 只负责"把一章经文改写为流畅版"的能力，不关心缓存和流程
//!
//! ## 技术栈
//! - 使用 `async-openai` crate 进行 API 调用
//! - 支持自定义 API 端点和模型
//! - 兼容 OpenAI API 的服务（如 Azure, Gemini, Doubao 等）
//!
//! ## 错误分类
//! 限流/配额类错误归为 `ProviderError::RateLimited`（可重试），
//! 其余一律为不可重试。优先使用结构化的错误码和 HTTP 状态码，
//! 只有网关不给结构化信息时才回退到匹配错误文本，且只在本模块内部进行。

use std::sync::LazyLock;

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::ProviderError;
use crate::models::{ChapterKey, FluidContent, VerseSet};

/// 限流/配额相关的错误码
const RATE_LIMIT_CODES: &[&str] = &[
    "rate_limit_exceeded",
    "insufficient_quota",
    "resource_exhausted",
    "too_many_requests",
];

/// 网关未返回结构化错误时使用的文本标记
const RATE_LIMIT_MARKERS: &[&str] = &[
    "429",
    "rate limit",
    "rate_limit",
    "quota",
    "resource_exhausted",
    "too many requests",
];

static JSON_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```(?:json)?\s*(.*?)\s*```").unwrap());

/// 生成服务接口
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// 根据经文和目标语言生成流畅版章节
    ///
    /// `verses` 可能为空（原文获取失败），此时只根据章节引用生成。
    async fn generate(
        &self,
        key: &ChapterKey,
        verses: &VerseSet,
    ) -> Result<FluidContent, ProviderError>;
}

/// LLM 服务
///
/// 职责：
/// - 调用 LLM API 生成流畅版章节
/// - 解析模型返回的 JSON
/// - 给出限流/失败的分类
/// - 不读写任何缓存
pub struct LlmService {
    client: Client<OpenAIConfig>,
    model_name: String,
}

impl LlmService {
    /// 创建新的 LLM 服务
    pub fn new(config: &Config) -> Self {
        // 配置 OpenAI 客户端（兼容 OpenAI API 的服务）
        let openai_config = OpenAIConfig::new()
            .with_api_key(&config.llm_api_key)
            .with_api_base(&config.llm_api_base_url);

        let client = Client::with_config(openai_config);

        Self {
            client,
            model_name: config.llm_model_name.clone(),
        }
    }

    /// 通用的 LLM 调用函数
    ///
    /// # 参数
    /// - `user_message`: 用户消息内容
    /// - `system_message`: 系统消息（可选）
    ///
    /// # 返回
    /// 返回 LLM 的响应内容（字符串）
    pub async fn send_to_llm(
        &self,
        user_message: &str,
        system_message: Option<&str>,
    ) -> Result<String, ProviderError> {
        debug!("调用 LLM API，模型: {}", self.model_name);
        debug!("用户消息长度: {} 字符", user_message.len());

        let mut messages = Vec::new();

        if let Some(sys_msg) = system_message {
            let system_msg = ChatCompletionRequestSystemMessageArgs::default()
                .content(sys_msg)
                .build()
                .map_err(classify_openai_error)?;
            messages.push(ChatCompletionRequestMessage::System(system_msg));
        }

        let user_msg = ChatCompletionRequestUserMessageArgs::default()
            .content(user_message)
            .build()
            .map_err(classify_openai_error)?;
        messages.push(ChatCompletionRequestMessage::User(user_msg));

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model_name)
            .messages(messages)
            .temperature(0.7)
            .max_tokens(4096u32)
            .build()
            .map_err(classify_openai_error)?;

        let response = self.client.chat().create(request).await.map_err(|e| {
            let err = classify_openai_error(e);
            warn!("LLM API 调用失败: {}", err);
            err
        })?;

        debug!("LLM API 调用成功");

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| ProviderError::Malformed {
                message: "LLM 返回内容为空".to_string(),
            })?;

        Ok(content.trim().to_string())
    }
}

#[async_trait]
impl GenerationProvider for LlmService {
    async fn generate(
        &self,
        key: &ChapterKey,
        verses: &VerseSet,
    ) -> Result<FluidContent, ProviderError> {
        let (user_message, system_message) = build_fluid_messages(key, verses);
        let response = self.send_to_llm(&user_message, Some(&system_message)).await?;
        parse_fluid_response(&response)
    }
}

/// 目标语言的名称（写进提示词）
pub fn language_label(language: &str) -> &str {
    match language {
        "pt" => "português do Brasil",
        "en" => "English",
        "es" => "español",
        "fr" => "français",
        "it" => "italiano",
        "de" => "Deutsch",
        other => other,
    }
}

/// 构建生成流畅版的消息
///
/// 返回 (user_message, system_message)
pub fn build_fluid_messages(key: &ChapterKey, verses: &VerseSet) -> (String, String) {
    let language = language_label(&key.language);

    let system_message = format!(
        "Você é um escritor cristão que reescreve capítulos da Bíblia em prosa fluida, \
         fiel ao texto, sem acrescentar doutrina nem comentários. \
         Escreva sempre em {}.",
        language
    );

    let source_text = if verses.is_empty() {
        "(texto bíblico indisponível; use o texto canônico do capítulo indicado)".to_string()
    } else {
        verses.to_prompt_text()
    };

    let user_message = format!(
        r#"Reescreva {book} {chapter} como uma leitura fluida em {language}.

Texto bíblico:
{source}

Regras:
- Mantenha a ordem dos acontecimentos e todos os versículos.
- Divida o texto em parágrafos naturais, sem números de versículos.
- Dê um título curto ao capítulo.

Responda apenas com JSON no formato:
{{"title": "...", "paragraphs": ["...", "..."]}}"#,
        book = key.display_name(),
        chapter = key.chapter,
        language = language,
        source = source_text,
    );

    (user_message, system_message)
}

#[derive(Debug, Deserialize)]
struct RawFluid {
    title: String,
    #[serde(default)]
    paragraphs: Vec<String>,
}

/// 解析模型返回的 JSON
///
/// 兼容 ```json 代码块和 JSON 前后的多余文字。段落为空时原样返回，
/// 是否接受由调用方决定。
pub fn parse_fluid_response(response: &str) -> Result<FluidContent, ProviderError> {
    let body = JSON_FENCE
        .captures(response)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .unwrap_or(response);

    let json = match (body.find('{'), body.rfind('}')) {
        (Some(start), Some(end)) if start < end => &body[start..=end],
        _ => {
            return Err(ProviderError::Malformed {
                message: format!("响应中没有 JSON 对象: {}", crate::utils::truncate_text(response, 80)),
            })
        }
    };

    let raw: RawFluid = serde_json::from_str(json).map_err(|e| ProviderError::Malformed {
        message: format!("JSON 解析失败: {}", e),
    })?;

    Ok(FluidContent::new(raw.title, raw.paragraphs).normalized())
}

/// 把 async-openai 的错误归类为可重试/不可重试
pub fn classify_openai_error(err: OpenAIError) -> ProviderError {
    match &err {
        OpenAIError::ApiError(api) => {
            let code = api.code.as_ref().map(|c| c.to_string());
            let kind = api.r#type.as_ref().map(|t| t.to_string());
            classify(None, code.as_deref(), kind.as_deref(), &api.message)
        }
        OpenAIError::Reqwest(e) => {
            let status = e.status().map(|s| s.as_u16());
            classify(status, None, None, &e.to_string())
        }
        other => classify(None, None, None, &other.to_string()),
    }
}

/// 分类规则
///
/// 1. HTTP 429 → 限流
/// 2. 错误码或错误类型属于限流/配额 → 限流
/// 3. 没有任何结构化信息时，错误文本含限流标记 → 限流
/// 4. 其余 → 失败
pub fn classify(
    status: Option<u16>,
    code: Option<&str>,
    kind: Option<&str>,
    message: &str,
) -> ProviderError {
    let message = message.to_string();

    if status == Some(429) {
        return ProviderError::RateLimited { message };
    }

    let structured = [code, kind].into_iter().flatten().collect::<Vec<_>>();
    if structured
        .iter()
        .any(|value| RATE_LIMIT_CODES.iter().any(|c| value.to_lowercase().contains(c)))
    {
        return ProviderError::RateLimited { message };
    }

    if status.is_none() && structured.is_empty() {
        let lowered = message.to_lowercase();
        if RATE_LIMIT_MARKERS.iter().any(|m| lowered.contains(m)) {
            return ProviderError::RateLimited { message };
        }
    }

    ProviderError::Failed { message }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Verse;

    fn key() -> ChapterKey {
        ChapterKey::new("pt", "Gênesis", 1).unwrap()
    }

    #[test]
    fn parses_plain_json() {
        let content =
            parse_fluid_response(r#"{"title": "A criação", "paragraphs": ["p1", "p2"]}"#).unwrap();
        assert_eq!(content.title, "A criação");
        assert_eq!(content.paragraphs, vec!["p1", "p2"]);
    }

    #[test]
    fn parses_fenced_json_with_chatter() {
        let response = "Claro! Aqui está:\n```json\n{\"title\": \"T\", \"paragraphs\": [\"a\", \" \"]}\n```\nBoa leitura.";
        let content = parse_fluid_response(response).unwrap();
        assert_eq!(content.title, "T");
        assert_eq!(content.paragraphs, vec!["a"]);
    }

    #[test]
    fn empty_paragraphs_are_returned_for_caller_to_reject() {
        let content = parse_fluid_response(r#"{"title": "X", "paragraphs": []}"#).unwrap();
        assert!(content.is_empty());
    }

    #[test]
    fn malformed_responses() {
        assert!(matches!(
            parse_fluid_response("desculpe, não posso"),
            Err(ProviderError::Malformed { .. })
        ));
        assert!(matches!(
            parse_fluid_response(r#"{"paragraphs": ["sem título"]}"#),
            Err(ProviderError::Malformed { .. })
        ));
    }

    #[test]
    fn classification_prefers_structured_signals() {
        assert!(classify(Some(429), None, None, "Too Many Requests").is_transient());
        assert!(classify(None, Some("rate_limit_exceeded"), None, "slow down").is_transient());
        assert!(classify(None, None, Some("insufficient_quota"), "billing").is_transient());
        assert!(classify(None, Some("\"RESOURCE_EXHAUSTED\""), None, "x").is_transient());

        // 有结构化信息且不是限流时，不看文本
        assert!(!classify(Some(401), None, None, "quota of keys exceeded").is_transient());
        assert!(!classify(None, Some("invalid_api_key"), None, "429").is_transient());
    }

    #[test]
    fn classification_falls_back_to_markers_without_structure() {
        assert!(classify(None, None, None, "upstream said: 429 Too Many Requests").is_transient());
        assert!(classify(None, None, None, "You exceeded your current quota").is_transient());
        assert!(!classify(None, None, None, "connection reset by peer").is_transient());
    }

    #[test]
    fn prompt_embeds_verses_and_language() {
        let verses = VerseSet::new(vec![Verse {
            number: 1,
            text: "No princípio criou Deus os céus e a terra.".into(),
        }])
        .unwrap();
        let (user, system) = build_fluid_messages(&key(), &verses);
        assert!(user.contains("Gênesis 1"));
        assert!(user.contains("1 No princípio criou Deus"));
        assert!(user.contains("português do Brasil"));
        assert!(system.contains("português do Brasil"));
    }

    #[test]
    fn prompt_without_verses_uses_reference() {
        let key = ChapterKey::new("en", "john", 3).unwrap();
        let (user, _) = build_fluid_messages(&key, &VerseSet::empty());
        assert!(user.contains("João 3"));
        assert!(user.contains("indisponível"));
        assert!(user.contains("English"));
    }

    #[tokio::test]
    #[ignore] // 需要真实的 LLM 服务：cargo test -- --ignored
    async fn test_generate_against_live_service() {
        let _ = tracing_subscriber::fmt::try_init();
        let config = Config::from_env();
        let service = LlmService::new(&config);
        let verses = VerseSet::new(vec![Verse {
            number: 1,
            text: "O Senhor é o meu pastor, nada me faltará.".into(),
        }])
        .unwrap();
        let key = ChapterKey::new("pt", "salmos", 23).unwrap();

        let content = service.generate(&key, &verses).await.unwrap();
        println!("{}", content.to_markdown());
        assert!(!content.is_empty());
    }
}
