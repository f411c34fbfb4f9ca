//! 连通性探测服务模块
//!
//! 对本地端点做轻量可达性探测；远端模型不做真实网络请求，
//! 固定返回可用（占位行为，避免对计费端点发起无意义调用）。

use std::time::Duration;

use crate::catalog::Catalog;
use crate::profile::ModelProfile;

/// 探测超时（秒）
const PROBE_TIMEOUT_SECS: u64 = 3;

/// 单个模型的状态
#[derive(Debug, Clone)]
pub struct ModelStatus {
    pub key: String,
    pub name: String,
    pub connected: bool,
    pub has_api_key: bool,
}

/// 连通性探测服务
pub struct ProbeService;

impl ProbeService {
    /// 探测单个档案的可达性
    ///
    /// 本地端点：请求 Ollama 健康路径 `/api/tags`，以 HTTP 成功为准；
    /// 其余端点无条件返回 true。所有异常吞掉并折算为 false。
    pub async fn test(profile: &ModelProfile) -> bool {
        if !profile.is_local() {
            return true;
        }

        Self::probe_local(&profile.base_url).await
    }

    async fn probe_local(base_url: &str) -> bool {
        let health_url = format!("{}/api/tags", base_url.trim_end_matches("/v1"));

        let client = match reqwest::Client::builder()
            .timeout(Duration::from_secs(PROBE_TIMEOUT_SECS))
            .connect_timeout(Duration::from_secs(PROBE_TIMEOUT_SECS))
            .build()
        {
            Ok(client) => client,
            Err(e) => {
                log::warn!("构建探测客户端失败: {}", e);
                return false;
            }
        };

        match client.get(&health_url).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(e) => {
                log::debug!("本地端点探测失败: {}: {}", health_url, e);
                false
            }
        }
    }

    /// 并发探测目录中的所有模型
    ///
    /// 各探测之间无共享状态、无顺序要求，结果按目录顺序返回。
    pub async fn status_all(catalog: &Catalog) -> Vec<ModelStatus> {
        let futures: Vec<_> = catalog
            .values()
            .map(|profile| async {
                ModelStatus {
                    key: profile.key.clone(),
                    name: profile.name.clone(),
                    connected: Self::test(profile).await,
                    has_api_key: profile.has_api_key(),
                }
            })
            .collect();

        futures::future::join_all(futures).await
    }
}
