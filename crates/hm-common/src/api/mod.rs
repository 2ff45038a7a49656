//! HTTP 边界共享的请求/响应 DTO。

use serde::{Deserialize, Serialize};

use crate::assignment::records::{AssignmentRecord, TaskRecord, UserRecord};

#[derive(Debug, Clone, Deserialize)]
pub struct AssignBatchRequest {
    pub task_ids: Vec<String>,
    /// 缺省为 true；false 时仅返回最佳匹配预览，不落库。
    #[serde(default = "default_auto_assign")]
    pub auto_assign: bool,
}

const fn default_auto_assign() -> bool {
    true
}

/// 对外展示的用户摘要。密码散列在 `UserRecord` 上已标记
/// skip_serializing，这里再显式收窄一层字段面。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: String,
    pub name: String,
}

impl From<&UserRecord> for UserSummary {
    fn from(user: &UserRecord) -> Self {
        Self {
            id: user.id.clone(),
            name: user.name.clone(),
        }
    }
}

/// 手动指派/自选任务的响应：assignment 连同任务与用户摘要。
#[derive(Debug, Clone, Serialize)]
pub struct AssignmentResponse {
    pub assignment: AssignmentRecord,
    pub task: TaskRecord,
    pub user: UserSummary,
}
