use chrono::NaiveDate;
use taskmind_core::db::open_db_in_memory;
use taskmind_core::{
    FinalTask, GtdTag, Priority, RepoError, Responsibility, SqliteTaskStore, TaskStatus, TaskStore,
};

fn final_task(title: &str, importance: bool, urgency: bool) -> FinalTask {
    FinalTask {
        title: title.to_string(),
        description: format!("原始输入: {title}"),
        project: "work".to_string(),
        responsibility: Responsibility::Owner,
        importance,
        urgency,
        gtd_tag: GtdTag::Inbox,
        due_date: None,
        reminder_time: None,
    }
}

#[test]
fn insert_and_get_round_trip() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteTaskStore::new(&conn);

    let due = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    let task = FinalTask {
        due_date: Some(due),
        reminder_time: due.and_hms_opt(9, 0, 0),
        gtd_tag: GtdTag::NextAction,
        responsibility: Responsibility::Participant,
        ..final_task("  上午开会讨论项目进展  ", true, true)
    };
    let id = store.insert(&task).unwrap();

    let stored = store.get(id).unwrap().expect("task should exist");
    assert_eq!(stored.id, id);
    assert_eq!(stored.title, "上午开会讨论项目进展");
    assert_eq!(stored.priority, Priority::UrgentImportant);
    assert_eq!(stored.gtd_tag, GtdTag::NextAction);
    assert_eq!(stored.responsibility, Responsibility::Participant);
    assert_eq!(stored.due_date, Some(due));
    assert_eq!(stored.reminder_time, due.and_hms_opt(9, 0, 0));
    assert_eq!(stored.status, TaskStatus::Pending);
    assert_eq!(stored.completed_at, None);
    assert!(stored.validate().is_ok());

    assert!(store.get(id + 100).unwrap().is_none());
}

#[test]
fn blank_title_is_rejected_before_insert() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteTaskStore::new(&conn);

    let err = store.insert(&final_task("   ", false, false)).unwrap_err();
    assert!(matches!(err, RepoError::Validation(_)));
}

#[test]
fn listing_orders_pending_by_priority_then_due_date() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteTaskStore::new(&conn);

    let low = store.insert(&final_task("整理旧照片", false, false)).unwrap();
    let late = store
        .insert(&FinalTask {
            due_date: NaiveDate::from_ymd_opt(2024, 2, 1),
            ..final_task("准备季度汇报", true, false)
        })
        .unwrap();
    let early = store
        .insert(&FinalTask {
            due_date: NaiveDate::from_ymd_opt(2024, 1, 10),
            ..final_task("提交项目方案", true, false)
        })
        .unwrap();
    let top = store.insert(&final_task("修复线上故障", true, true)).unwrap();
    let done = store.insert(&final_task("回复客户邮件", true, true)).unwrap();
    store.update_status(done, TaskStatus::Completed).unwrap();

    let ids: Vec<i64> = store.get_all().unwrap().iter().map(|task| task.id).collect();
    assert_eq!(ids, vec![top, early, late, low, done]);

    let pending: Vec<i64> = store.pending().unwrap().iter().map(|task| task.id).collect();
    assert_eq!(pending, vec![top, early, late, low]);
}

#[test]
fn completing_sets_completed_at_and_reopening_clears_it() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteTaskStore::new(&conn);
    let id = store.insert(&final_task("写周报", false, false)).unwrap();

    store.update_status(id, TaskStatus::Completed).unwrap();
    let completed = store.get(id).unwrap().unwrap();
    assert_eq!(completed.status, TaskStatus::Completed);
    assert!(completed.completed_at.is_some());

    store.update_status(id, TaskStatus::Pending).unwrap();
    let reopened = store.get(id).unwrap().unwrap();
    assert_eq!(reopened.status, TaskStatus::Pending);
    assert_eq!(reopened.completed_at, None);
}

#[test]
fn missing_ids_are_reported() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteTaskStore::new(&conn);

    assert!(matches!(
        store.update_status(42, TaskStatus::Completed),
        Err(RepoError::NotFound(42))
    ));
    assert!(!store.delete(42).unwrap());

    let id = store.insert(&final_task("写周报", false, false)).unwrap();
    assert!(store.delete(id).unwrap());
    assert!(store.get(id).unwrap().is_none());
}

#[test]
fn statistics_cover_status_quadrant_gtd_and_projects() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteTaskStore::new(&conn);

    store.insert(&final_task("修复线上故障", true, true)).unwrap();
    store
        .insert(&FinalTask {
            project: "study".to_string(),
            gtd_tag: GtdTag::SomedayMaybe,
            ..final_task("学习新框架", false, false)
        })
        .unwrap();
    let done = store.insert(&final_task("提交周报", true, false)).unwrap();
    store.update_status(done, TaskStatus::Completed).unwrap();
    let dropped = store.insert(&final_task("旧需求评审", false, true)).unwrap();
    store.update_status(dropped, TaskStatus::Cancelled).unwrap();

    let stats = store.statistics().unwrap();
    assert_eq!(stats.total, 4);
    assert_eq!(stats.pending, 2);
    assert_eq!(stats.completed, 1);
    assert_eq!(stats.cancelled, 1);
    assert_eq!(stats.completion_rate(), 25.0);
    assert_eq!(stats.pending_in(Priority::UrgentImportant), 1);
    assert_eq!(stats.pending_in(Priority::Neither), 1);
    assert_eq!(stats.pending_in(Priority::ImportantNotUrgent), 0);
    assert!(stats.pending_by_gtd.contains(&(GtdTag::SomedayMaybe, 1)));
    assert_eq!(
        stats.top_projects,
        vec![("study".to_string(), 1), ("work".to_string(), 1)]
    );
}

#[test]
fn due_reminders_match_pending_tasks_at_the_minute() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteTaskStore::new(&conn);
    let day = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();

    let nine = store
        .insert(&FinalTask {
            due_date: Some(day),
            reminder_time: day.and_hms_opt(9, 0, 0),
            ..final_task("晨会", true, true)
        })
        .unwrap();
    let done = store
        .insert(&FinalTask {
            due_date: Some(day),
            reminder_time: day.and_hms_opt(9, 0, 0),
            ..final_task("发日报", false, true)
        })
        .unwrap();
    store.update_status(done, TaskStatus::Completed).unwrap();
    store
        .insert(&FinalTask {
            due_date: Some(day),
            reminder_time: day.and_hms_opt(10, 0, 0),
            ..final_task("客户电话", true, false)
        })
        .unwrap();

    let hits = store.due_reminders(day.and_hms_opt(9, 0, 30).unwrap()).unwrap();
    assert_eq!(hits.iter().map(|task| task.id).collect::<Vec<_>>(), vec![nine]);
    assert!(store
        .due_reminders(day.and_hms_opt(9, 1, 0).unwrap())
        .unwrap()
        .is_empty());
}

#[test]
fn rows_with_inconsistent_priority_are_rejected_on_read() {
    let conn = open_db_in_memory().unwrap();
    conn.execute(
        "INSERT INTO tasks (id, title, priority, urgency, importance) VALUES (7, '手工插入', 1, 0, 0);",
        [],
    )
    .unwrap();
    let store = SqliteTaskStore::new(&conn);

    match store.get(7) {
        Err(RepoError::InvalidData(message)) => assert!(message.contains("task 7")),
        other => panic!("expected invalid data, got {other:?}"),
    }
    assert!(matches!(store.get_all(), Err(RepoError::InvalidData(_))));
}

#[test]
fn unknown_enum_literals_are_rejected_on_read() {
    let conn = open_db_in_memory().unwrap();
    conn.execute(
        "INSERT INTO tasks (id, title, priority, gtd_tag) VALUES (3, '手工插入', 4, 'later');",
        [],
    )
    .unwrap();
    let store = SqliteTaskStore::new(&conn);

    assert!(matches!(store.get(3), Err(RepoError::InvalidData(_))));
}
