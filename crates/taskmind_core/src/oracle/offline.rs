//! Templated replies used when the remote chat backend is unavailable.
//!
//! # Invariants
//! - Output depends only on the input text, the task snapshot and the error;
//!   no I/O happens here.
//! - Suggestion categories are checked in order view, add, delete/complete,
//!   statistics, help.

use crate::model::task::{Priority, Task, DATE_FORMAT};
use crate::oracle::OracleError;
use crate::repo::task_repo::TaskStatistics;

/// Pending tasks listed in a context snapshot.
pub const CONTEXT_TASK_LIMIT: usize = 10;

const VIEW_WORDS: &[&str] = &["查看", "显示", "列出", "所有", "任务"];
const ADD_WORDS: &[&str] = &["添加", "新增", "创建", "加"];
const CHANGE_WORDS: &[&str] = &["删除", "移除", "完成"];
const STATISTICS_WORDS: &[&str] = &["统计", "分析", "汇总"];

/// Task snapshot rendered into chat prompts and offline replies.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskContext {
    pub statistics: TaskStatistics,
    /// Pending tasks in listing order.
    pub pending: Vec<Task>,
}

impl TaskContext {
    pub fn new(statistics: TaskStatistics, pending: Vec<Task>) -> Self {
        Self {
            statistics,
            pending,
        }
    }

    /// Plain-text summary: totals, quadrant split and the first pending tasks.
    pub fn render(&self) -> String {
        let stats = &self.statistics;
        let mut lines = vec![
            "=== 📊 数据库状态 ===".to_string(),
            format!(
                "总任务:{} | 待处理:{} | 已完成:{} | 完成率:{:.1}%",
                stats.total,
                stats.pending,
                stats.completed,
                stats.completion_rate()
            ),
            format!(
                "四象限分布: {}",
                Priority::ALL
                    .iter()
                    .map(|priority| format!("{}:{}", priority.label(), stats.pending_in(*priority)))
                    .collect::<Vec<_>>()
                    .join(" | ")
            ),
        ];

        if !self.pending.is_empty() {
            lines.push(String::new());
            lines.push(format!("=== ⏳ 待处理任务 ({}个) ===", self.pending.len()));
            for (position, task) in self.pending.iter().take(CONTEXT_TASK_LIMIT).enumerate() {
                let mut line = format!(
                    "{}. ID:{} | {} | {} | {} | {}",
                    position + 1,
                    task.id,
                    task.title,
                    task.project,
                    task.priority.label(),
                    task.gtd_tag.label()
                );
                if let Some(due_date) = task.due_date {
                    line.push_str(&format!(" | 截止:{}", due_date.format(DATE_FORMAT)));
                }
                lines.push(line);
            }
        }

        lines.join("\n")
    }
}

/// Builds keyword-driven help replies from a task snapshot.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineResponder;

impl OfflineResponder {
    pub fn new() -> Self {
        Self
    }

    /// Renders an offline reply. `error` is the oracle failure that caused
    /// the fallback; `NotConfigured` is shown as plain offline mode.
    pub fn reply(&self, text: &str, context: &TaskContext, error: Option<&OracleError>) -> String {
        let lowered = text.to_lowercase();
        let mut reply = match error {
            Some(OracleError::NotConfigured) | None => "🤖 智能助手（离线模式）为您服务：\n\n".to_string(),
            Some(err) => format!("⚠️ {err}\n\n🔄 切换到离线模式为您服务：\n\n"),
        };

        reply.push_str(&format!("📊 当前状态：\n{}\n\n", context.render()));
        reply.push_str(suggestions(&lowered));
        reply.push_str(
            "\n🔧 要启用完整对话功能，请在配置文件的 assistant.api_key 中填写有效的 API Key，\
或设置环境变量 TASKMIND_API_KEY，然后重新发送您的指令。",
        );
        reply
    }
}

fn suggestions(lowered: &str) -> &'static str {
    let contains_any = |words: &[&str]| words.iter().any(|word| lowered.contains(word));

    if contains_any(VIEW_WORDS) {
        "💡 建议操作：\n\
• 上方列出了按优先级排序的待处理任务\n\
• 用“完成第1个”或“删除任务ID:3”直接操作列表中的任务\n"
    } else if contains_any(ADD_WORDS) {
        "📝 添加任务建议：\n\
• 直接说“添加任务：明天下午3点提交周报”\n\
• 系统会自动进行智能分类（四象限+GTD标签+项目）\n\
• 支持“明天”“3天后”“5月1日”等日期和“上午9点”“14:30”等时间\n"
    } else if contains_any(CHANGE_WORDS) {
        "🗑️ 任务操作建议：\n\
• 按编号：“完成任务ID:3”“删除#5”\n\
• 按位置：“完成第2个”\n\
• 按标题：“删除“整理季度报表””\n"
    } else if contains_any(STATISTICS_WORDS) {
        "📈 统计信息：\n\
• 上方状态包含总数、完成率和四象限分布\n\
• 项目分布与GTD标签分布可在汇总视图中查看\n"
    } else {
        "💡 可用功能：\n\
• 查看任务：“查看所有待办事项”\n\
• 添加任务：“添加任务：…”\n\
• 任务操作：“删除任务ID:3”“完成第1个”\n\
• 查看统计：“显示任务统计”\n"
    }
}
