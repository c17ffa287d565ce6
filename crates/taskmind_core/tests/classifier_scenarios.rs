use chrono::{NaiveDate, NaiveDateTime};
use std::thread;
use taskmind_core::model::preference::{PreferenceHints, PreferenceSignal, PREFERRED_PROJECT_KEY};
use taskmind_core::{
    classify, reparse, CustomProject, GtdTag, ParseError, Priority, Responsibility, RoleContext,
};

fn now() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(8, 0, 0)
        .unwrap()
}

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

#[test]
fn meeting_tomorrow_is_urgent_and_important() {
    let draft = classify("明天上午9点开会讨论项目进展，很重要", now(), &RoleContext::default()).unwrap();

    assert_eq!(draft.title, "上午9点开会讨论项目进展");
    assert_eq!(draft.gtd_tag, GtdTag::Inbox);
    assert!(draft.importance);
    assert!(draft.urgency);
    assert_eq!(draft.priority(), Priority::UrgentImportant);
    assert_eq!(draft.project, "work");
    assert_eq!(draft.due_date, Some(date(2024, 1, 2)));
    assert_eq!(
        draft.reminder_time,
        Some(date(2024, 1, 2).and_hms_opt(9, 0, 0).unwrap())
    );
    assert!(draft.signals.importance_keywords.contains(&"开会".to_string()));
    assert!(draft.description.starts_with("原始输入: 明天上午9点开会讨论项目进展，很重要"));
    assert!(draft.description.contains("- 截止日期: 2024-01-02"));
    assert!(draft.description.contains("- 提醒时间: 2024-01-02 09:00"));
}

#[test]
fn someday_learning_is_low_priority_study() {
    let draft = classify("以后有空再学习一下新技术", now(), &RoleContext::default()).unwrap();

    assert_eq!(draft.gtd_tag, GtdTag::SomedayMaybe);
    assert!(!draft.importance);
    assert!(!draft.urgency);
    assert_eq!(draft.signals.urgency_score, -2);
    assert_eq!(draft.priority(), Priority::Neither);
    assert_eq!(draft.project, "study");
    assert_eq!(draft.due_date, None);
    assert_eq!(draft.reminder_time, None);
}

#[test]
fn too_short_input_is_rejected() {
    let err = classify("等", now(), &RoleContext::default()).unwrap_err();
    assert_eq!(err, ParseError::TitleExtraction { input_chars: 1 });
    assert!(!err.user_message().is_empty());

    assert_eq!(
        classify("   ", now(), &RoleContext::default()).unwrap_err(),
        ParseError::EmptyInput
    );
}

#[test]
fn production_incident_is_next_action_in_first_quadrant() {
    let draft = classify("紧急：服务器故障需要立即处理", now(), &RoleContext::default()).unwrap();

    assert_eq!(draft.gtd_tag, GtdTag::NextAction);
    assert!(draft.importance);
    assert!(draft.urgency);
    assert_eq!(draft.priority(), Priority::UrgentImportant);
    assert_eq!(draft.project, "work");
    assert!(draft.signals.importance_keywords.contains(&"故障".to_string()));
    assert!(draft.signals.urgency_keywords.contains(&"紧急".to_string()));
}

#[test]
fn unmatched_text_falls_back_to_inbox_neither_default() {
    let draft = classify("随手记下这个想法", now(), &RoleContext::default()).unwrap();

    assert_eq!(draft.title, "随手记下这个想法");
    assert_eq!(draft.gtd_tag, GtdTag::Inbox);
    assert_eq!(draft.priority(), Priority::Neither);
    assert_eq!(draft.project, "default");
    assert_eq!(draft.responsibility, Responsibility::Owner);
    assert!(draft.signals.project_keywords.is_empty());
}

#[test]
fn gtd_tags_follow_precedence() {
    let cases = [
        ("现在等一下再处理", GtdTag::NextAction),
        ("等待回复后立即处理合同", GtdTag::NextAction),
        ("等待审批结果后再考虑方案", GtdTag::WaitingFor),
        ("依赖对方接口数据", GtdTag::WaitingFor),
        ("也许可以换个键盘", GtdTag::SomedayMaybe),
    ];
    for (text, expected) in cases {
        let draft = classify(text, now(), &RoleContext::default()).unwrap();
        assert_eq!(draft.gtd_tag, expected, "input: {text}");
    }
}

#[test]
fn negated_keywords_do_not_count_as_positive() {
    let draft = classify("整理旧照片，不重要也不紧急", now(), &RoleContext::default()).unwrap();

    assert!(!draft.importance);
    assert!(!draft.urgency);
    assert!(draft.signals.importance_score < 0);
    assert_eq!(draft.priority(), Priority::Neither);
}

#[test]
fn near_due_date_makes_task_urgent() {
    let draft = classify("明天交水电费账单", now(), &RoleContext::default()).unwrap();
    assert!(draft.urgency);
    assert_eq!(draft.project, "finance");

    let later = classify("3天后交水电费账单", now(), &RoleContext::default()).unwrap();
    assert!(!later.urgency);
    assert_eq!(later.due_date, Some(date(2024, 1, 4)));
}

#[test]
fn classification_is_deterministic_across_threads() {
    let text = "明天下午3点和客户开会，很重要";
    let expected = classify(text, now(), &RoleContext::default()).unwrap();

    let handles: Vec<_> = (0..4)
        .map(|_| thread::spawn(move || classify(text, now(), &RoleContext::default()).unwrap()))
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), expected);
    }
}

#[test]
fn reparse_matches_fresh_classification() {
    let context = RoleContext::default();
    let draft = classify("  下周提交项目报告  ", now(), &context).unwrap();
    assert_eq!(draft.source_text, "下周提交项目报告");

    let again = reparse(&draft.source_text, now(), &context).unwrap();
    assert_eq!(again, draft);
    assert_eq!(again.due_date, Some(date(2024, 1, 8)));
}

#[test]
fn custom_projects_win_over_builtin_table() {
    let context = RoleContext {
        custom_projects: vec![CustomProject {
            id: "renovation".to_string(),
            keywords: vec!["装修".to_string()],
        }],
        ..RoleContext::default()
    };

    let draft = classify("和同事讨论装修项目预算", now(), &context).unwrap();
    assert_eq!(draft.project, "renovation");
    assert_eq!(draft.signals.project_keywords, vec!["装修".to_string()]);

    let other = classify("和同事讨论季度项目预算", now(), &context).unwrap();
    assert_eq!(other.project, "work");
}

#[test]
fn role_context_supplies_defaults() {
    let context = RoleContext {
        default_project: Some("side".to_string()),
        default_responsibility: Some(Responsibility::Supporter),
        custom_projects: Vec::new(),
    };

    let draft = classify("随手记下这个想法", now(), &context).unwrap();
    assert_eq!(draft.project, "side");
    assert_eq!(draft.responsibility, Responsibility::Supporter);

    let keyword_hit = classify("下午去健身房锻炼", now(), &context).unwrap();
    assert_eq!(keyword_hit.project, "health");
}

#[test]
fn confident_hints_only_fill_unset_defaults() {
    let mut signal = PreferenceSignal::first(PREFERRED_PROJECT_KEY, "family");
    for _ in 0..6 {
        signal = signal.observe("family");
    }
    let hints = PreferenceHints::from_signals([signal]);

    let hinted = RoleContext::default().with_preference_hints(&hints);
    assert_eq!(hinted.default_project.as_deref(), Some("family"));
    let draft = classify("随手记下这个想法", now(), &hinted).unwrap();
    assert_eq!(draft.project, "family");

    let explicit = RoleContext {
        default_project: Some("side".to_string()),
        ..RoleContext::default()
    }
    .with_preference_hints(&hints);
    assert_eq!(explicit.default_project.as_deref(), Some("side"));

    let weak = PreferenceHints::from_signals([PreferenceSignal::first(PREFERRED_PROJECT_KEY, "family")]);
    assert_eq!(RoleContext::default().with_preference_hints(&weak).default_project, None);
}
