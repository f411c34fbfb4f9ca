//! 模型档案数据结构模块
//!
//! 定义模型档案、旧版记录及其迁移、字段级合并等核心数据结构。
//! 磁盘格式使用 camelCase 字段名，与原有 config.json 保持兼容。

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};

/// 下游工具读取的 Base URL 环境变量名（固定值）
pub const BASE_URL_VAR: &str = "ANTHROPIC_BASE_URL";

/// 下游工具读取的凭据环境变量名（固定值，与档案自身的 apiKeyName 无关）
pub const API_KEY_VAR: &str = "ANTHROPIC_API_KEY";

/// 模型档案结构体
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelProfile {
    /// 唯一标识符（同时作为目录的 map key）
    #[serde(default)]
    pub key: String,
    /// 显示名称
    pub name: String,
    /// API 端点地址
    pub base_url: String,
    /// 凭据环境变量名；None 表示无需凭据（如本地模型）
    pub api_key_name: Option<String>,
    /// 凭据；空字符串表示未配置
    #[serde(default)]
    pub api_key: String,
    /// 默认模型 ID
    pub default_model: String,
    /// 是否为用户自定义档案；内置档案不可删除
    #[serde(default)]
    pub is_custom: bool,
    /// 备注信息（自定义档案）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// 用户指定的模型版本，覆盖 defaultModel
    #[serde(rename = "userSelectedModel", skip_serializing_if = "Option::is_none")]
    pub user_model: Option<String>,
}

impl ModelProfile {
    /// 实际生效的模型 ID（用户覆盖优先）
    pub fn resolved_model(&self) -> &str {
        self.user_model.as_deref().unwrap_or(&self.default_model)
    }

    /// 是否需要凭据
    pub fn requires_api_key(&self) -> bool {
        self.api_key_name.is_some()
    }

    /// 凭据是否已配置
    pub fn has_api_key(&self) -> bool {
        !self.api_key.is_empty()
    }

    /// 是否为本地端点（Base URL 主机为回环地址）
    pub fn is_local(&self) -> bool {
        match url::Url::parse(&self.base_url) {
            Ok(parsed) => matches!(
                parsed.host_str(),
                Some("localhost") | Some("127.0.0.1") | Some("::1") | Some("[::1]")
            ),
            Err(_) => false,
        }
    }
}

/// 旧版档案记录
///
/// 旧格式把凭据和 Base URL 回显一并放在 envVars 键值包中，
/// 而不是类型化字段。仅在加载时出现，迁移后不再落盘。
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyProfile {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub base_url: String,
    pub env_vars: IndexMap<String, String>,
    #[serde(default)]
    pub default_model: String,
}

/// 磁盘档案的部分记录
///
/// 所有字段可选，用于字段级合并：磁盘上出现的字段覆盖内置默认值，
/// 缺失的字段保留内置值。apiKeyName 需要区分"缺失"与"显式 null"。
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfilePatch {
    pub name: Option<String>,
    pub base_url: Option<String>,
    #[serde(default, deserialize_with = "nullable_field")]
    pub api_key_name: Option<Option<String>>,
    pub api_key: Option<String>,
    pub default_model: Option<String>,
    pub is_custom: Option<bool>,
    pub description: Option<String>,
    #[serde(rename = "userSelectedModel")]
    pub user_model: Option<String>,
}

/// 磁盘上的单条档案记录：旧版或当前格式
///
/// untagged 顺序依赖 envVars 字段：有则为旧版，无则按当前格式解析。
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ProfileRecord {
    Legacy(LegacyProfile),
    Current(ProfilePatch),
}

/// 区分 JSON 中"字段缺失"与"字段为 null"
fn nullable_field<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

/// 迁移磁盘记录到当前格式（纯函数）
///
/// 旧版记录：取 envVars 中唯一一个非 Base URL 回显的键，
/// 键名作为凭据环境变量名，值作为凭据；不存在则凭据变量名为 null、
/// 凭据为空。当前格式记录原样返回，因此重复迁移是无操作。
pub fn migrate(record: ProfileRecord) -> ProfilePatch {
    match record {
        ProfileRecord::Current(patch) => patch,
        ProfileRecord::Legacy(legacy) => {
            let api_key_name = legacy
                .env_vars
                .keys()
                .find(|k| k.as_str() != BASE_URL_VAR)
                .cloned();

            let api_key = api_key_name
                .as_ref()
                .and_then(|k| legacy.env_vars.get(k))
                .cloned()
                .unwrap_or_default();

            // baseUrl 字段缺失时退回 envVars 中的回显值
            let base_url = if legacy.base_url.is_empty() {
                legacy.env_vars.get(BASE_URL_VAR).cloned()
            } else {
                Some(legacy.base_url)
            };

            ProfilePatch {
                name: Some(legacy.name),
                base_url,
                api_key_name: Some(api_key_name),
                api_key: Some(api_key),
                default_model: Some(legacy.default_model),
                is_custom: None,
                description: None,
                user_model: None,
            }
        }
    }
}

/// 字段级合并：磁盘记录覆盖内置默认值
///
/// 优先级：磁盘上出现的字段 > 内置字段；内置键永远存在；
/// 内置档案不会因磁盘记录而变为自定义。
pub fn reconcile(builtin: &ModelProfile, patch: ProfilePatch) -> ModelProfile {
    ModelProfile {
        key: builtin.key.clone(),
        name: patch.name.unwrap_or_else(|| builtin.name.clone()),
        base_url: patch.base_url.unwrap_or_else(|| builtin.base_url.clone()),
        api_key_name: patch
            .api_key_name
            .unwrap_or_else(|| builtin.api_key_name.clone()),
        api_key: patch.api_key.unwrap_or_else(|| builtin.api_key.clone()),
        default_model: patch
            .default_model
            .unwrap_or_else(|| builtin.default_model.clone()),
        is_custom: builtin.is_custom,
        description: patch.description.or_else(|| builtin.description.clone()),
        user_model: patch.user_model.or_else(|| builtin.user_model.clone()),
    }
}

impl ProfilePatch {
    /// 将仅存在于磁盘的记录还原为完整档案
    ///
    /// 缺失的字段取空值。缺少 baseUrl 的记录照样保留，
    /// 使其在保存回写时不丢失；可用性在切换时再校验。
    pub fn into_profile(self, key: &str) -> ModelProfile {
        ModelProfile {
            key: key.to_string(),
            name: self.name.unwrap_or_else(|| key.to_string()),
            base_url: self.base_url.unwrap_or_default(),
            api_key_name: self.api_key_name.unwrap_or(None),
            api_key: self.api_key.unwrap_or_default(),
            default_model: self.default_model.unwrap_or_default(),
            is_custom: self.is_custom.unwrap_or(false),
            description: self.description,
            user_model: self.user_model,
        }
    }
}
