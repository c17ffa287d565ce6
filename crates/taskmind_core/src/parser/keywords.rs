//! Static keyword tables.
//!
//! # Invariants
//! - Tables are read-only and never reordered at runtime.
//! - Category order is a tie-break contract: the first category with a hit wins
//!   for GTD tags, projects and intents. Do not sort these tables.
//! - Importance and urgency tables are disjoint.

use crate::model::task::GtdTag;

/// Weighted scoring table: negative phrases are matched (and masked) first.
#[derive(Debug, Clone, Copy)]
pub struct ScoreTable {
    pub negative: &'static [&'static str],
    pub strong: &'static [&'static str],
    pub ordinary: &'static [&'static str],
}

pub const STRONG_WEIGHT: i32 = 2;
pub const ORDINARY_WEIGHT: i32 = 1;
pub const NEGATIVE_WEIGHT: i32 = -1;
/// Urgency weight when the due date is today or tomorrow.
pub const NEAR_DUE_WEIGHT: i32 = 2;
/// Urgency weight for "N小时内" / "N分钟内" windows.
pub const SHORT_WINDOW_WEIGHT: i32 = 2;

/// Fallback project when neither keywords nor the role context resolve one.
pub const FALLBACK_PROJECT: &str = "default";

pub const NEXT_ACTION_TRIGGERS: &[&str] = &[
    "立即", "马上", "现在", "今天", "今日", "当前", "急需", "赶紧", "立刻", "即刻", "尽快", "优先",
    "首先", "先做", "开始",
];

pub const WAITING_FOR_TRIGGERS: &[&str] = &[
    "等待", "依赖", "等别人", "等回复", "等确认", "等通知", "等审批", "等结果", "等消息", "等反馈",
];

pub const SOMEDAY_MAYBE_TRIGGERS: &[&str] = &[
    "将来", "以后", "有空", "有时间", "考虑", "想要", "希望", "计划", "打算", "学习", "研究", "了解",
    "可能", "也许",
];

/// GTD trigger sets in precedence order. `Inbox` has no triggers.
pub const GTD_TABLE: &[(GtdTag, &[&str])] = &[
    (GtdTag::NextAction, NEXT_ACTION_TRIGGERS),
    (GtdTag::WaitingFor, WAITING_FOR_TRIGGERS),
    (GtdTag::SomedayMaybe, SOMEDAY_MAYBE_TRIGGERS),
];

pub const IMPORTANCE_TABLE: ScoreTable = ScoreTable {
    negative: &["不重要", "随便", "无所谓", "次要", "可有可无"],
    strong: &["bug", "故障", "会议", "开会", "汇报", "事故"],
    ordinary: &[
        "重要", "关键", "核心", "主要", "必须", "必要", "重点", "首要", "战略", "目标", "项目", "报告",
        "演示", "方案", "处理", "修复",
    ],
};

pub const URGENCY_TABLE: ScoreTable = ScoreTable {
    negative: &["不紧急", "不急", "慢慢", "有空", "以后", "将来", "有时间"],
    strong: &["紧急", "火急", "立即", "立刻", "马上", "截止", "deadline"],
    ordinary: &[
        "急", "现在", "今天", "今日", "赶紧", "即刻", "尽快", "及时", "本周", "这周",
    ],
};

/// Built-in project vocabulary in declared scan order.
pub const PROJECT_TABLE: &[(&str, &[&str])] = &[
    (
        "work",
        &[
            "工作", "公司", "办公", "会议", "开会", "汇报", "报告", "项目", "业务", "客户", "同事",
            "开发", "编程", "服务器", "上线",
        ],
    ),
    (
        "study",
        &[
            "学习", "课程", "阅读", "研究", "书", "教程", "培训", "考试", "复习", "技能",
        ],
    ),
    ("personal", &["个人", "私人", "自己", "生活", "购物", "买"]),
    (
        "health",
        &["健康", "运动", "锻炼", "医院", "体检", "养生", "跑步", "健身"],
    ),
    ("family", &["家庭", "家人", "父母", "孩子", "家事", "家务"]),
    (
        "finance",
        &["理财", "投资", "财务", "钱", "账单", "支付", "银行"],
    ),
    (
        "hobby",
        &["爱好", "兴趣", "娱乐", "游戏", "电影", "音乐", "绘画"],
    ),
    ("social", &["社交", "朋友", "聚会", "约会", "活动"]),
    (
        "travel",
        &["旅行", "旅游", "出差", "度假", "机票", "酒店"],
    ),
];

pub const ADD_VERBS: &[&str] = &["添加", "新增", "创建", "加入", "新建"];
pub const DELETE_VERBS: &[&str] = &["删除", "移除", "去掉", "清除"];
pub const COMPLETE_VERBS: &[&str] = &["完成", "标记完成", "做完", "结束"];
pub const UPDATE_VERBS: &[&str] = &["修改", "更新", "编辑", "改变"];

/// Returns every keyword of `keywords` contained in `text`, in table order.
pub fn matching<'a>(text: &str, keywords: &'a [&'a str]) -> Vec<&'a str> {
    keywords
        .iter()
        .copied()
        .filter(|keyword| text.contains(keyword))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{IMPORTANCE_TABLE, PROJECT_TABLE, URGENCY_TABLE};
    use std::collections::HashSet;

    #[test]
    fn importance_and_urgency_tables_are_disjoint() {
        let importance: HashSet<&str> = IMPORTANCE_TABLE
            .negative
            .iter()
            .chain(IMPORTANCE_TABLE.strong)
            .chain(IMPORTANCE_TABLE.ordinary)
            .copied()
            .collect();
        for keyword in URGENCY_TABLE
            .negative
            .iter()
            .chain(URGENCY_TABLE.strong)
            .chain(URGENCY_TABLE.ordinary)
        {
            assert!(!importance.contains(keyword), "`{keyword}` is in both tables");
        }
    }

    #[test]
    fn project_order_is_declared_order() {
        let ids: Vec<&str> = PROJECT_TABLE.iter().map(|(id, _)| *id).collect();
        assert_eq!(
            ids,
            vec![
                "work", "study", "personal", "health", "family", "finance", "hobby", "social",
                "travel"
            ]
        );
    }
}
