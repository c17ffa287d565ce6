use taskmind_core::{extract_task_references, route_intent, Intent};

#[test]
fn commands_route_in_fixed_order() {
    let cases = [
        ("添加任务：明天提交周报", Intent::Add),
        ("新建一个待办", Intent::Add),
        ("删除任务ID:3", Intent::Delete),
        ("把第2个去掉", Intent::Delete),
        ("完成第1个", Intent::Complete),
        ("结束会议记录", Intent::Complete),
        ("修改任务3的截止日期", Intent::Update),
        ("今天天气怎么样", Intent::Chat),
        ("查看所有待办事项", Intent::Chat),
    ];
    for (text, expected) in cases {
        assert_eq!(route_intent(text), expected, "input: {text}");
    }
}

#[test]
fn explicit_ids_are_collected_in_order() {
    let refs = extract_task_references("删除任务ID:12 和 #7");
    assert_eq!(refs.ids, vec![12, 7]);
    assert!(refs.ordinals.is_empty());
    assert!(refs.titles.is_empty());

    let refs = extract_task_references("完成编号：5，任务8");
    assert_eq!(refs.ids, vec![8, 5]);
}

#[test]
fn bare_numbers_only_count_without_explicit_references() {
    let refs = extract_task_references("把 5 和 8 都删掉");
    assert_eq!(refs.ids, vec![5, 8]);

    let refs = extract_task_references("完成第3个，预计20分钟");
    assert_eq!(refs.ordinals, vec![3]);
    assert!(refs.ids.is_empty());
}

#[test]
fn duplicates_are_removed() {
    let refs = extract_task_references("完成第3条和第3条，还有#4 #4");
    assert_eq!(refs.ordinals, vec![3]);
    assert_eq!(refs.ids, vec![4]);
}

#[test]
fn quoted_titles_are_extracted() {
    let refs = extract_task_references("删除“整理报表”和《读书笔记》以及「周会纪要」");
    assert_eq!(
        refs.titles,
        vec![
            "整理报表".to_string(),
            "读书笔记".to_string(),
            "周会纪要".to_string()
        ]
    );
    assert!(refs.ids.is_empty());
}

#[test]
fn text_without_references_is_empty() {
    let refs = extract_task_references("删除那个任务");
    assert!(refs.is_empty());
}
