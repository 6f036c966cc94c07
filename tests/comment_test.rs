mod common;

use common::seeded_store;
use forge_daemon::issue::{
    add_comment, delete_comment, edit_posting, CommentForm, IssueAppError, Reply, RequestContext,
};
use forge_daemon::model::{Attachment, AttachmentContainer};
use forge_daemon::store::Store;

fn comment_form(body: &str) -> CommentForm {
    CommentForm {
        body: body.to_string(),
    }
}

async fn comment_count(f: &common::Fixture, issue_id: u64) -> u32 {
    f.store
        .find_issue(issue_id)
        .await
        .unwrap()
        .unwrap()
        .num_of_comments
}

#[tokio::test]
async fn test_add_comment_redirects_to_issue() {
    let f = seeded_store().await;

    let reply = add_comment(
        f.store(),
        &f.ctx(&f.bob),
        "owner",
        "forge",
        f.issue_a.id,
        &comment_form("I can reproduce this"),
    )
    .await
    .expect("Should add comment");

    match reply {
        Reply::Redirect(url) => assert_eq!(url, format!("/owner/forge/issue/{}", f.issue_a.id)),
        other => panic!("expected redirect, got {:?}", other),
    }

    let comments = f.store.comments_for_issue(f.issue_a.id).await.unwrap();
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0].body, "I can reproduce this");
    assert_eq!(comments[0].author_login_id, "bob");
    assert_eq!(comment_count(&f, f.issue_a.id).await, 1);
}

#[tokio::test]
async fn test_comments_are_ordered_by_creation() {
    let f = seeded_store().await;
    for body in ["first", "second", "third"] {
        add_comment(
            f.store(),
            &f.ctx(&f.alice),
            "owner",
            "forge",
            f.issue_b.id,
            &comment_form(body),
        )
        .await
        .unwrap();
    }

    let bodies: Vec<String> = f
        .store
        .comments_for_issue(f.issue_b.id)
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.body)
        .collect();
    assert_eq!(bodies, vec!["first", "second", "third"]);
    assert_eq!(comment_count(&f, f.issue_b.id).await, 3);
}

#[tokio::test]
async fn test_add_comment_moves_pending_attachments() {
    let f = seeded_store().await;
    f.store
        .insert_attachment(Attachment::pending(f.bob.id, "screen.png", b"\x89PNG"))
        .await
        .unwrap();

    add_comment(
        f.store(),
        &f.ctx(&f.bob),
        "owner",
        "forge",
        f.issue_a.id,
        &comment_form("Screenshot attached"),
    )
    .await
    .unwrap();

    let comment = &f.store.comments_for_issue(f.issue_a.id).await.unwrap()[0];
    let attachments = f
        .store
        .attachments_for(AttachmentContainer::Comment(comment.id))
        .await
        .unwrap();
    assert_eq!(attachments.len(), 1);
    assert_eq!(attachments[0].mime_type, "image/png");
}

#[tokio::test]
async fn test_blank_comment_is_rejected() {
    let f = seeded_store().await;
    let result = add_comment(
        f.store(),
        &f.ctx(&f.bob),
        "owner",
        "forge",
        f.issue_a.id,
        &comment_form("   "),
    )
    .await;

    match result {
        Err(IssueAppError::InvalidComment(errors)) => assert!(errors.has_field("body")),
        other => panic!("expected validation failure, got {:?}", other),
    }
    assert_eq!(comment_count(&f, f.issue_a.id).await, 0);
}

#[tokio::test]
async fn test_anonymous_cannot_comment() {
    let f = seeded_store().await;
    let result = add_comment(
        f.store(),
        &RequestContext::anonymous(),
        "owner",
        "forge",
        f.issue_a.id,
        &comment_form("drive-by"),
    )
    .await;

    assert!(matches!(result, Err(IssueAppError::Unauthorized { .. })));
    assert_eq!(comment_count(&f, f.issue_a.id).await, 0);
}

#[tokio::test]
async fn test_comment_on_missing_issue_is_not_found() {
    let f = seeded_store().await;
    let result = add_comment(
        f.store(),
        &f.ctx(&f.bob),
        "owner",
        "forge",
        999,
        &comment_form("hello?"),
    )
    .await;
    assert!(matches!(result, Err(IssueAppError::IssueNotFound { id: 999, .. })));
}

#[tokio::test]
async fn test_author_deletes_comment() {
    let f = seeded_store().await;
    let ctx = f.ctx(&f.bob);
    add_comment(f.store(), &ctx, "owner", "forge", f.issue_a.id, &comment_form("oops"))
        .await
        .unwrap();
    let comment = f.store.comments_for_issue(f.issue_a.id).await.unwrap()[0].clone();

    let reply = delete_comment(f.store(), &ctx, "owner", "forge", f.issue_a.id, comment.id)
        .await
        .expect("Should delete comment");

    assert!(matches!(reply, Reply::Redirect(ref url) if url == &format!("/owner/forge/issue/{}", f.issue_a.id)));
    assert!(f.store.find_comment(comment.id).await.unwrap().is_none());
    assert_eq!(comment_count(&f, f.issue_a.id).await, 0);
}

#[tokio::test]
async fn test_others_cannot_delete_comment() {
    let f = seeded_store().await;
    add_comment(
        f.store(),
        &f.ctx(&f.bob),
        "owner",
        "forge",
        f.issue_a.id,
        &comment_form("mine"),
    )
    .await
    .unwrap();
    let comment = f.store.comments_for_issue(f.issue_a.id).await.unwrap()[0].clone();

    // alice authored the issue, not the comment
    let result = delete_comment(
        f.store(),
        &f.ctx(&f.alice),
        "owner",
        "forge",
        f.issue_a.id,
        comment.id,
    )
    .await;
    assert!(matches!(result, Err(IssueAppError::Unauthorized { .. })));
    assert_eq!(comment_count(&f, f.issue_a.id).await, 1);

    // the project owner manages everything
    delete_comment(
        f.store(),
        &f.ctx(&f.owner),
        "owner",
        "forge",
        f.issue_a.id,
        comment.id,
    )
    .await
    .unwrap();
    assert_eq!(comment_count(&f, f.issue_a.id).await, 0);
}

#[tokio::test]
async fn test_comment_of_other_issue_is_not_found() {
    let f = seeded_store().await;
    add_comment(
        f.store(),
        &f.ctx(&f.bob),
        "owner",
        "forge",
        f.issue_a.id,
        &comment_form("on A"),
    )
    .await
    .unwrap();
    let comment = f.store.comments_for_issue(f.issue_a.id).await.unwrap()[0].clone();

    let result = delete_comment(
        f.store(),
        &f.ctx(&f.owner),
        "owner",
        "forge",
        f.issue_b.id,
        comment.id,
    )
    .await;
    assert!(matches!(result, Err(IssueAppError::CommentNotFound { .. })));
    assert!(f.store.find_comment(comment.id).await.unwrap().is_some());

    let result = delete_comment(f.store(), &f.ctx(&f.owner), "owner", "forge", f.issue_a.id, 999).await;
    assert!(matches!(result, Err(IssueAppError::CommentNotFound { id: 999, .. })));
}

#[tokio::test]
async fn test_edit_posting_keeps_comment_identity() {
    let f = seeded_store().await;
    let ctx = f.ctx(&f.bob);
    add_comment(f.store(), &ctx, "owner", "forge", f.issue_a.id, &comment_form("typo"))
        .await
        .unwrap();
    let original = f.store.comments_for_issue(f.issue_a.id).await.unwrap()[0].clone();

    let mut updated = original.clone();
    updated.body = "fixed".to_string();
    updated.author_id = f.alice.id;

    let saved = edit_posting(f.store(), &ctx, &f.project, &original, updated, |mut c| {
        c.body = format!("{} (edited)", c.body);
        c
    })
    .await
    .unwrap();

    assert_eq!(saved.body, "fixed (edited)");
    assert_eq!(saved.author_id, f.bob.id);
    assert_eq!(saved.issue_id, f.issue_a.id);

    let result = edit_posting(f.store(), &f.ctx(&f.alice), &f.project, &saved, saved.clone(), |c| c).await;
    assert!(matches!(result, Err(IssueAppError::Unauthorized { .. })));
}

#[tokio::test]
async fn test_anonymous_blank_comment_on_private_issue_is_unauthorized() {
    let f = seeded_store().await;
    let result = add_comment(
        f.store(),
        &RequestContext::anonymous(),
        "owner",
        "secret",
        f.secret_issue.id,
        &comment_form(""),
    )
    .await;
    assert!(matches!(result, Err(IssueAppError::Unauthorized { .. })));

    let result = add_comment(
        f.store(),
        &RequestContext::anonymous(),
        "owner",
        "secret",
        999,
        &comment_form(""),
    )
    .await;
    assert!(matches!(result, Err(IssueAppError::Unauthorized { .. })));

    let result = delete_comment(
        f.store(),
        &RequestContext::anonymous(),
        "owner",
        "secret",
        999,
        1,
    )
    .await;
    assert!(matches!(result, Err(IssueAppError::Unauthorized { .. })));
    assert_eq!(comment_count(&f, f.secret_issue.id).await, 0);
}

#[tokio::test]
async fn test_anonymous_blank_comment_on_public_issue_is_unauthorized() {
    let f = seeded_store().await;
    let result = add_comment(
        f.store(),
        &RequestContext::anonymous(),
        "owner",
        "forge",
        f.issue_a.id,
        &comment_form("  "),
    )
    .await;
    assert!(matches!(result, Err(IssueAppError::Unauthorized { .. })));
}
