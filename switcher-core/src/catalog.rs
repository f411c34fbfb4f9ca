//! 模型目录模块
//!
//! 内置模型定义与目录的加载、合并、保存。加载永不向上抛错：
//! 读取或解析失败时退回内置默认值，保证系统其余部分可继续工作。

use indexmap::IndexMap;

use crate::config::{get_catalog_path, read_json_file, write_json_file};
use crate::error::{AppError, Result};
use crate::profile::{migrate, reconcile, ModelProfile, ProfileRecord};

/// 目录类型别名：key -> 档案，保持插入顺序
pub type Catalog = IndexMap<String, ModelProfile>;

/// 内置模型的固定键集合
pub const BUILTIN_KEYS: &[&str] = &["claude", "gemini", "deepseek", "qwen", "kimi", "glm", "ollama"];

fn builtin(
    key: &str,
    name: &str,
    base_url: &str,
    api_key_name: Option<&str>,
    api_key: &str,
    default_model: &str,
) -> ModelProfile {
    ModelProfile {
        key: key.to_string(),
        name: name.to_string(),
        base_url: base_url.to_string(),
        api_key_name: api_key_name.map(str::to_string),
        api_key: api_key.to_string(),
        default_model: default_model.to_string(),
        is_custom: false,
        description: None,
        user_model: None,
    }
}

/// 构建内置模型目录
///
/// 每次调用返回全新副本，调用方可自由修改。
pub fn builtin_catalog() -> Catalog {
    let mut catalog = Catalog::new();
    catalog.insert(
        "claude".into(),
        builtin(
            "claude",
            "Claude (Anthropic)",
            "https://api.anthropic.com",
            Some("ANTHROPIC_API_KEY"),
            "",
            "claude-3-5-sonnet-20241022",
        ),
    );
    catalog.insert(
        "gemini".into(),
        builtin(
            "gemini",
            "Gemini (Google)",
            "https://generativelanguage.googleapis.com/v1beta",
            Some("GEMINI_API_KEY"),
            "",
            "gemini-2.0-flash-exp",
        ),
    );
    catalog.insert(
        "deepseek".into(),
        builtin(
            "deepseek",
            "DeepSeek",
            "https://api.deepseek.com/anthropic",
            Some("DEEPSEEK_API_KEY"),
            "",
            "deepseek-chat",
        ),
    );
    catalog.insert(
        "qwen".into(),
        builtin(
            "qwen",
            "Qwen (Alibaba)",
            "https://dashscope.aliyuncs.com/apps/anthropic",
            Some("QWEN_API_KEY"),
            "",
            "qwen3-coder-plus",
        ),
    );
    catalog.insert(
        "kimi".into(),
        builtin(
            "kimi",
            "Kimi (Moonshot)",
            "https://api.moonshot.cn/anthropic",
            Some("MOONSHOT_API_KEY"),
            "",
            "kimi-k2-0905-preview",
        ),
    );
    catalog.insert(
        "glm".into(),
        builtin(
            "glm",
            "GLM 4.5 (ZhipuAI)",
            "https://open.bigmodel.cn/api/anthropic",
            Some("GLM_API_KEY"),
            "",
            "glm-4.5",
        ),
    );
    catalog.insert(
        "ollama".into(),
        builtin(
            "ollama",
            "Ollama (Local)",
            "http://localhost:11434/v1",
            None,
            "ollama",
            "llama3.2",
        ),
    );
    catalog
}

/// 创建自定义模型的输入参数
#[derive(Debug, Clone)]
pub struct CustomProfileInput {
    pub key: String,
    pub base_url: String,
    pub api_key_name: Option<String>,
    pub api_key: String,
    pub default_model: String,
    pub description: Option<String>,
}

/// 模型目录服务
pub struct CatalogService;

impl CatalogService {
    /// 加载模型目录
    ///
    /// 磁盘记录先迁移旧格式，再按字段合并到内置默认值上；
    /// 仅存在于磁盘的自定义键原样保留。任何读取或解析失败
    /// 都降级为内置默认值并记录错误，不会抛给调用方。
    pub fn load() -> Catalog {
        let path = get_catalog_path();
        if !path.exists() {
            return builtin_catalog();
        }

        let records: IndexMap<String, ProfileRecord> = match read_json_file(&path) {
            Ok(records) => records,
            Err(e) => {
                log::error!("加载模型目录失败，使用内置默认值: {}", e);
                return builtin_catalog();
            }
        };

        let mut catalog = builtin_catalog();
        for (key, record) in records {
            let patch = migrate(record);
            if let Some(base) = catalog.get(&key) {
                let merged = reconcile(base, patch);
                catalog.insert(key, merged);
            } else {
                // 仅存在于磁盘的自定义键原样保留，即便记录不完整
                let profile = patch.into_profile(&key);
                catalog.insert(key, profile);
            }
        }

        catalog
    }

    /// 保存完整目录（内置 + 自定义）到磁盘
    ///
    /// 切换路径上的调用方必须将失败视为整个切换操作失败。
    pub fn save(catalog: &Catalog) -> Result<()> {
        write_json_file(&get_catalog_path(), catalog)
    }

    /// 判断键是否为内置模型
    pub fn is_builtin(key: &str) -> bool {
        BUILTIN_KEYS.contains(&key)
    }

    /// 创建自定义模型
    pub fn create_custom(input: CustomProfileInput) -> Result<ModelProfile> {
        let key = input.key.trim().to_string();
        if key.is_empty() {
            return Err(AppError::InvalidInput("模型标识不能为空".to_string()));
        }
        if Self::is_builtin(&key) {
            return Err(AppError::InvalidInput(format!(
                "模型标识与内置模型冲突: {}",
                key
            )));
        }
        validate_base_url(&input.base_url)?;

        let mut catalog = Self::load();
        if catalog.contains_key(&key) {
            return Err(AppError::InvalidInput(format!("模型已存在: {}", key)));
        }

        // 首字母大写作为默认显示名
        let mut name: Vec<char> = key.chars().collect();
        name[0] = name[0].to_ascii_uppercase();

        let profile = ModelProfile {
            key: key.clone(),
            name: name.into_iter().collect(),
            base_url: input.base_url,
            api_key_name: input
                .api_key_name
                .or_else(|| Some("ANTHROPIC_API_KEY".to_string())),
            api_key: input.api_key,
            default_model: if input.default_model.is_empty() {
                "gpt-3.5-turbo".to_string()
            } else {
                input.default_model
            },
            is_custom: true,
            description: input.description,
            user_model: None,
        };

        catalog.insert(key, profile.clone());
        Self::save(&catalog)?;
        Ok(profile)
    }

    /// 删除自定义模型
    ///
    /// 内置模型不可删除，只能修改其可变字段。
    pub fn delete(key: &str) -> Result<()> {
        let mut catalog = Self::load();
        match catalog.get(key) {
            None => return Err(AppError::ModelNotFound(key.to_string())),
            Some(profile) if !profile.is_custom => {
                return Err(AppError::InvalidInput(format!(
                    "内置模型不可删除: {}",
                    key
                )));
            }
            Some(_) => {}
        }

        catalog.shift_remove(key);
        Self::save(&catalog)
    }

    /// 更新模型的可变字段（Base URL、凭据）
    pub fn update(key: &str, base_url: Option<String>, api_key: Option<String>) -> Result<ModelProfile> {
        let mut catalog = Self::load();
        let profile = catalog
            .get_mut(key)
            .ok_or_else(|| AppError::ModelNotFound(key.to_string()))?;

        if let Some(url) = base_url {
            validate_base_url(&url)?;
            profile.base_url = url;
        }
        if let Some(api_key) = api_key {
            profile.api_key = api_key;
        }

        let updated = profile.clone();
        Self::save(&catalog)?;
        Ok(updated)
    }

    /// 设置模型版本覆盖
    pub fn set_model_override(key: &str, model: &str) -> Result<()> {
        let model = model.trim();
        if model.is_empty() {
            return Err(AppError::InvalidInput("模型版本不能为空".to_string()));
        }

        let mut catalog = Self::load();
        let profile = catalog
            .get_mut(key)
            .ok_or_else(|| AppError::ModelNotFound(key.to_string()))?;
        profile.user_model = Some(model.to_string());

        Self::save(&catalog)
    }

    /// 保存指定模型的凭据
    pub fn set_api_key(key: &str, api_key: &str) -> Result<()> {
        let mut catalog = Self::load();
        let profile = catalog
            .get_mut(key)
            .ok_or_else(|| AppError::ModelNotFound(key.to_string()))?;
        profile.api_key = api_key.trim().to_string();

        Self::save(&catalog)
    }
}

/// 校验 Base URL 为绝对 http(s) 地址
fn validate_base_url(base_url: &str) -> Result<()> {
    let parsed = url::Url::parse(base_url)
        .map_err(|e| AppError::InvalidInput(format!("无效的 Base URL: {}: {}", base_url, e)))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(AppError::InvalidInput(format!(
            "Base URL 必须为 http(s) 地址: {}",
            base_url
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::tempdir;

    fn with_temp_home<F: FnOnce()>(f: F) {
        let dir = tempdir().unwrap();
        std::env::set_var("CLAUDE_SWITCHER_HOME", dir.path());
        std::env::remove_var("CLAUDE_SWITCHER_CONFIG_DIR");
        f();
        std::env::remove_var("CLAUDE_SWITCHER_HOME");
    }

    #[test]
    #[serial]
    fn test_load_empty_dir_returns_builtins() {
        with_temp_home(|| {
            let catalog = CatalogService::load();
            let keys: Vec<&str> = catalog.keys().map(String::as_str).collect();
            assert_eq!(keys, BUILTIN_KEYS);

            for profile in catalog.values().filter(|p| p.key != "ollama") {
                assert!(profile.api_key.is_empty());
            }
        });
    }

    #[test]
    #[serial]
    fn test_save_and_reload_edited_builtin() {
        with_temp_home(|| {
            let mut catalog = CatalogService::load();
            catalog.get_mut("kimi").unwrap().api_key = "sk-edited".to_string();
            CatalogService::save(&catalog).unwrap();

            let reloaded = CatalogService::load();
            let kimi = reloaded.get("kimi").unwrap();
            assert_eq!(kimi.api_key, "sk-edited");
            // 其余内置字段保持不变
            assert_eq!(kimi.base_url, "https://api.moonshot.cn/anthropic");
            assert_eq!(kimi.api_key_name.as_deref(), Some("MOONSHOT_API_KEY"));
            assert!(!kimi.is_custom);
        });
    }

    #[test]
    #[serial]
    fn test_load_migrates_legacy_records() {
        with_temp_home(|| {
            let legacy = serde_json::json!({
                "deepseek": {
                    "name": "DeepSeek",
                    "baseUrl": "https://api.deepseek.com/anthropic",
                    "envVars": {
                        "ANTHROPIC_BASE_URL": "https://api.deepseek.com/anthropic",
                        "DEEPSEEK_API_KEY": "sk-legacy"
                    },
                    "defaultModel": "deepseek-chat"
                }
            });
            crate::config::write_json_file(&get_catalog_path(), &legacy).unwrap();

            let catalog = CatalogService::load();
            let deepseek = catalog.get("deepseek").unwrap();
            assert_eq!(deepseek.api_key, "sk-legacy");
            assert_eq!(deepseek.api_key_name.as_deref(), Some("DEEPSEEK_API_KEY"));
        });
    }

    #[test]
    #[serial]
    fn test_partial_custom_record_survives_roundtrip() {
        with_temp_home(|| {
            // 手工编辑产生的不完整记录：没有 baseUrl
            let partial = serde_json::json!({
                "mycustom": {
                    "name": "My Custom",
                    "apiKey": "sk-partial",
                    "isCustom": true
                }
            });
            crate::config::write_json_file(&get_catalog_path(), &partial).unwrap();

            let catalog = CatalogService::load();
            let record = catalog.get("mycustom").unwrap();
            assert_eq!(record.name, "My Custom");
            assert_eq!(record.api_key, "sk-partial");
            assert!(record.base_url.is_empty());

            // 保存回写后记录依然在盘上，字段不丢失
            CatalogService::save(&catalog).unwrap();
            let raw = std::fs::read_to_string(get_catalog_path()).unwrap();
            assert!(raw.contains("mycustom"));
            assert!(raw.contains("sk-partial"));
            assert!(CatalogService::load().contains_key("mycustom"));
        });
    }

    #[test]
    #[serial]
    fn test_load_corrupt_file_falls_back_to_builtins() {
        with_temp_home(|| {
            let path = get_catalog_path();
            crate::config::atomic_write(&path, b"{ not valid json").unwrap();

            let catalog = CatalogService::load();
            assert_eq!(catalog.len(), BUILTIN_KEYS.len());
        });
    }

    #[test]
    #[serial]
    fn test_delete_builtin_rejected_custom_removed() {
        with_temp_home(|| {
            let err = CatalogService::delete("claude").unwrap_err();
            assert!(matches!(err, AppError::InvalidInput(_)));

            CatalogService::create_custom(CustomProfileInput {
                key: "myproxy".into(),
                base_url: "https://proxy.example.com".into(),
                api_key_name: None,
                api_key: "sk-proxy".into(),
                default_model: "claude-3-5-sonnet-20241022".into(),
                description: Some("内网代理".into()),
            })
            .unwrap();
            assert!(CatalogService::load().contains_key("myproxy"));

            CatalogService::delete("myproxy").unwrap();
            assert!(!CatalogService::load().contains_key("myproxy"));
        });
    }

    #[test]
    #[serial]
    fn test_create_custom_validation() {
        with_temp_home(|| {
            // 与内置键冲突
            let err = CatalogService::create_custom(CustomProfileInput {
                key: "claude".into(),
                base_url: "https://api.example.com".into(),
                api_key_name: None,
                api_key: String::new(),
                default_model: String::new(),
                description: None,
            })
            .unwrap_err();
            assert!(matches!(err, AppError::InvalidInput(_)));

            // 非法 URL
            let err = CatalogService::create_custom(CustomProfileInput {
                key: "bad".into(),
                base_url: "not a url".into(),
                api_key_name: None,
                api_key: String::new(),
                default_model: String::new(),
                description: None,
            })
            .unwrap_err();
            assert!(matches!(err, AppError::InvalidInput(_)));
        });
    }

    #[test]
    #[serial]
    fn test_set_model_override() {
        with_temp_home(|| {
            CatalogService::set_model_override("glm", "glm-4.6").unwrap();

            let catalog = CatalogService::load();
            let glm = catalog.get("glm").unwrap();
            assert_eq!(glm.resolved_model(), "glm-4.6");
            assert_eq!(glm.default_model, "glm-4.5");
        });
    }
}
