//! 切换编排服务模块
//!
//! 单条线性路径的状态机：校验键 → (不存在时) 提议创建自定义模型 →
//! 确保凭据 → 持久化激活记录 → 环境投影 → 连通性探测。
//! 无重试；探测失败不中止，只影响上报状态。

use crate::active::ActiveService;
use crate::catalog::{CatalogService, CustomProfileInput};
use crate::error::Result;
use crate::profile::ModelProfile;
use crate::services::probe::ProbeService;
use crate::services::projector::{EnvironmentSnapshot, ProjectionReport, ProjectorService};

/// 交互协作方的接口
///
/// 核心库不直接读终端；CLI 实现该 trait，测试使用桩实现。
pub trait SwitchPrompt {
    /// 目标键不存在：询问是否创建自定义模型，返回创建参数或 None（放弃）
    fn offer_custom_creation(&self, key: &str) -> Option<CustomProfileInput>;

    /// 模型需要凭据但未配置：请求凭据，返回 None 表示放弃
    fn request_api_key(&self, profile: &ModelProfile) -> Option<String>;
}

/// 切换结果
#[derive(Debug)]
pub enum SwitchOutcome {
    /// 切换完成
    Completed {
        profile: ModelProfile,
        snapshot: EnvironmentSnapshot,
        report: ProjectionReport,
        /// 连通性探测结果，失败不影响切换本身
        probe_ok: bool,
    },
    /// 用户放弃（未知键拒绝创建，或拒绝补充凭据）
    Aborted { reason: String },
}

/// 切换编排服务
pub struct SwitchService;

impl SwitchService {
    /// 切换到指定模型
    ///
    /// 目录/激活记录的写入失败是硬错误；投影的部分失败
    /// 与探测失败只反映在结果中。
    pub async fn switch(prompt: &dyn SwitchPrompt, key: &str) -> Result<SwitchOutcome> {
        let mut catalog = CatalogService::load();

        // VALIDATE_KEY → 不存在时提议创建自定义模型
        if !catalog.contains_key(key) {
            match prompt.offer_custom_creation(key) {
                Some(input) => {
                    CatalogService::create_custom(input)?;
                    catalog = CatalogService::load();
                }
                None => {
                    return Ok(SwitchOutcome::Aborted {
                        reason: format!("未知模型: {}", key),
                    });
                }
            }
        }

        // ENSURE_CREDENTIAL
        let profile = catalog
            .get(key)
            .ok_or_else(|| crate::error::AppError::ModelNotFound(key.to_string()))?;
        // 磁盘上的不完整记录会被原样保留，但不可切换
        if profile.base_url.is_empty() {
            return Err(crate::error::AppError::InvalidInput(format!(
                "模型 {} 缺少 baseUrl，请先编辑补全",
                key
            )));
        }
        if profile.requires_api_key() && !profile.has_api_key() {
            match prompt.request_api_key(profile) {
                Some(api_key) => {
                    // 凭据写盘失败时中止切换，避免投影与目录不一致
                    CatalogService::set_api_key(key, &api_key)?;
                    catalog = CatalogService::load();
                }
                None => {
                    return Ok(SwitchOutcome::Aborted {
                        reason: format!("{} 需要配置 API Key", profile.name),
                    });
                }
            }
        }

        let profile = catalog
            .get(key)
            .ok_or_else(|| crate::error::AppError::ModelNotFound(key.to_string()))?
            .clone();

        // PERSIST_ACTIVE
        ActiveService::set(key)?;

        // PROJECT_ENVIRONMENT（部分失败容忍，已在报告中体现）
        let (snapshot, report) = ProjectorService::project(&profile);

        // PROBE（永不中止切换）
        let probe_ok = ProbeService::test(&profile).await;

        Ok(SwitchOutcome::Completed {
            profile,
            snapshot,
            report,
            probe_ok,
        })
    }
}
