#![allow(dead_code)]

use chrono::{Duration, Utc};
use forge_daemon::issue::{RequestContext, SearchCondition};
use forge_daemon::model::{
    Assignee, Issue, IssueLabel, Milestone, NewIssue, Project, ProjectMember, ProjectRole, State,
    User,
};
use forge_daemon::store::{InMemoryStore, Store};
use std::collections::BTreeSet;
use std::sync::Arc;
use tempfile::TempDir;

pub fn create_test_dir() -> TempDir {
    tempfile::tempdir().expect("Should create temp dir")
}

/// Seeded store.
///
/// Public project `owner/forge` holds issue A (OPEN, labelled bug, by alice,
/// milestone v1.0) and issue B (CLOSED, labelled bug + urgent, by owner,
/// assigned to alice). Private project `owner/secret` holds one issue.
pub struct Fixture {
    pub store: Arc<InMemoryStore>,
    pub project: Project,
    pub private_project: Project,
    pub owner: User,
    pub alice: User,
    pub bob: User,
    pub admin: User,
    pub bug: IssueLabel,
    pub urgent: IssueLabel,
    pub foreign_label: IssueLabel,
    pub milestone: Milestone,
    pub issue_a: Issue,
    pub issue_b: Issue,
    pub secret_issue: Issue,
}

impl Fixture {
    pub fn ctx(&self, user: &User) -> RequestContext {
        RequestContext::new(user.clone())
    }

    pub fn store(&self) -> &dyn Store {
        self.store.as_ref()
    }

    /// Ids of the issues of the public project matching `condition`, ascending
    pub async fn search(&self, condition: &SearchCondition) -> Vec<u64> {
        let query = condition
            .build_query(&self.project, self.store())
            .await
            .expect("Should build query");
        let mut ids: Vec<u64> = self
            .store
            .find_issues(&query)
            .await
            .expect("Should find issues")
            .into_iter()
            .map(|i| i.id)
            .collect();
        ids.sort_unstable();
        ids
    }

    pub async fn issue_count(&self) -> usize {
        self.store.snapshot().await.issues.len()
    }
}

pub fn new_issue(project: &Project, author: &User, title: &str, state: State) -> NewIssue {
    NewIssue {
        title: title.to_string(),
        body: format!("Details about {}", title.to_lowercase()),
        created_date: Utc::now(),
        author_id: author.id,
        author_login_id: author.login_id.clone(),
        author_name: author.name.clone(),
        project_id: project.id,
        state,
        milestone_id: None,
        assignee: None,
        label_ids: BTreeSet::new(),
    }
}

pub async fn seeded_store() -> Fixture {
    seed(InMemoryStore::new()).await
}

/// Seed `store`, which may be backed by a snapshot file
pub async fn seed(store: InMemoryStore) -> Fixture {
    let owner = User::new(1, "owner", "Project Owner");
    let alice = User::new(2, "alice", "Alice Kim");
    let bob = User::new(3, "bob", "Bob Lee");
    let admin = User {
        site_admin: true,
        ..User::new(4, "admin", "Site Admin")
    };
    for user in [&owner, &alice, &bob, &admin] {
        store.insert_user(user.clone()).await.expect("Should insert user");
    }

    let project = Project {
        id: 1,
        owner: "owner".to_string(),
        name: "forge".to_string(),
        is_public: true,
        members: vec![ProjectMember {
            user_id: alice.id,
            role: ProjectRole::Member,
        }],
    };
    let private_project = Project {
        id: 2,
        owner: "owner".to_string(),
        name: "secret".to_string(),
        is_public: false,
        members: Vec::new(),
    };
    store.insert_project(project.clone()).await.expect("Should insert project");
    store
        .insert_project(private_project.clone())
        .await
        .expect("Should insert project");

    let bug = IssueLabel {
        id: 1,
        project_id: project.id,
        category: "type".to_string(),
        name: "bug".to_string(),
        color: "#d73a4a".to_string(),
    };
    let urgent = IssueLabel {
        id: 2,
        project_id: project.id,
        category: "priority".to_string(),
        name: "urgent".to_string(),
        color: "#b60205".to_string(),
    };
    let foreign_label = IssueLabel {
        id: 3,
        project_id: private_project.id,
        category: "type".to_string(),
        name: "internal".to_string(),
        color: "#cccccc".to_string(),
    };
    for label in [&bug, &urgent, &foreign_label] {
        store.insert_label(label.clone()).await.expect("Should insert label");
    }

    let milestone = Milestone {
        id: 1,
        project_id: project.id,
        title: "v1.0".to_string(),
    };
    store
        .insert_milestone(milestone.clone())
        .await
        .expect("Should insert milestone");

    let mut a = new_issue(&project, &alice, "Login fails", State::Open);
    a.created_date = Utc::now() - Duration::days(2);
    a.label_ids = BTreeSet::from([bug.id]);
    a.milestone_id = Some(milestone.id);
    let issue_a = store.insert_issue(a).await.expect("Should insert issue A");

    let mut b = new_issue(&project, &owner, "Crash on save", State::Closed);
    b.created_date = Utc::now() - Duration::days(1);
    b.label_ids = BTreeSet::from([bug.id, urgent.id]);
    b.assignee = Some(Assignee {
        user_id: alice.id,
        project_id: project.id,
    });
    let issue_b = store.insert_issue(b).await.expect("Should insert issue B");

    let mut secret = new_issue(&private_project, &owner, "Login fails internally", State::Open);
    secret.label_ids = BTreeSet::from([foreign_label.id]);
    let secret_issue = store
        .insert_issue(secret)
        .await
        .expect("Should insert secret issue");

    Fixture {
        store: Arc::new(store),
        project,
        private_project,
        owner,
        alice,
        bob,
        admin,
        bug,
        urgent,
        foreign_label,
        milestone,
        issue_a,
        issue_b,
        secret_issue,
    }
}
