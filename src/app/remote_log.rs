// ==========================================
// 禽场生产跟踪系统 - 远程活动日志
// ==========================================
// 职责: 将活动事件 POST 到配置的端点
// 语义: fire-and-forget，不读取响应，失败仅告警
// 退出: 进程结束前调用 flush 等待未完成的请求
// ==========================================

use crate::engine::{ActivityEvent, ActivityPublisher};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

const USER_AGENT: &str = concat!("poultry-farm-tracker/", env!("CARGO_PKG_VERSION"));

/// 未完成请求计数，归零时唤醒等待者
#[derive(Default)]
struct InFlight {
    count: AtomicUsize,
    idle: Notify,
}

impl InFlight {
    fn start(&self) {
        self.count.fetch_add(1, Ordering::SeqCst);
    }

    fn finish(&self) {
        if self.count.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.idle.notify_waiters();
        }
    }

    fn pending(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}

pub struct HttpActivityPublisher {
    http_client: reqwest::Client,
    endpoint: String,
    in_flight: Arc<InFlight>,
}

impl HttpActivityPublisher {
    /// # 参数
    /// - endpoint: 接收 {action, payload} 的 URL
    /// - timeout_secs: 单次请求超时
    pub fn new(endpoint: &str, timeout_secs: u64) -> Result<Self, reqwest::Error> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;

        Ok(Self {
            http_client,
            endpoint: endpoint.to_string(),
            in_flight: Arc::new(InFlight::default()),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// 尚未完成的请求数
    pub fn pending(&self) -> usize {
        self.in_flight.pending()
    }

    /// 等待所有已发出的请求完成
    ///
    /// # 返回
    /// - true: 全部完成
    /// - false: 超时，仍有请求未完成
    pub async fn flush(&self, timeout: Duration) -> bool {
        let wait_idle = async {
            loop {
                // 先登记等待再检查计数，避免错过归零通知
                let notified = self.in_flight.idle.notified();
                if self.in_flight.pending() == 0 {
                    return;
                }
                notified.await;
            }
        };

        let flushed = tokio::time::timeout(timeout, wait_idle).await.is_ok();
        if !flushed {
            tracing::warn!(pending = self.pending(), "活动日志未在时限内发送完毕");
        }
        flushed
    }
}

impl ActivityPublisher for HttpActivityPublisher {
    fn publish(&self, event: ActivityEvent) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!(
                action = event.action.as_str(),
                "无可用的异步运行时，活动日志未发送"
            );
            return;
        };

        let request = self.http_client.post(&self.endpoint).json(&event.wire_body());
        let action = event.action.as_str();
        let event_id = event.event_id;
        let in_flight = self.in_flight.clone();

        in_flight.start();
        runtime.spawn(async move {
            if let Err(e) = request.send().await {
                tracing::warn!(event_id = %event_id, action, error = %e, "活动日志发送失败");
            }
            in_flight.finish();
        });
    }
}
