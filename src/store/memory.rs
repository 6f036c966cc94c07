use super::query::IssueQuery;
use super::{Store, StoreError};
use crate::model::{
    Attachment, AttachmentContainer, Issue, IssueComment, IssueLabel, Milestone, NewComment,
    NewIssue, Project, User,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

const SCHEMA_VERSION: u32 = 1;

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// Everything the in-memory store holds, in the shape written to disk
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreSnapshot {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    #[serde(default)]
    pub users: BTreeMap<u64, User>,
    #[serde(default)]
    pub projects: BTreeMap<u64, Project>,
    #[serde(default)]
    pub labels: BTreeMap<u64, IssueLabel>,
    #[serde(default)]
    pub milestones: BTreeMap<u64, Milestone>,
    #[serde(default)]
    pub issues: BTreeMap<u64, Issue>,
    #[serde(default)]
    pub comments: BTreeMap<u64, IssueComment>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    #[serde(default)]
    pub next_issue_id: u64,
    #[serde(default)]
    pub next_comment_id: u64,
}

impl Default for StoreSnapshot {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            users: BTreeMap::new(),
            projects: BTreeMap::new(),
            labels: BTreeMap::new(),
            milestones: BTreeMap::new(),
            issues: BTreeMap::new(),
            comments: BTreeMap::new(),
            attachments: Vec::new(),
            next_issue_id: 1,
            next_comment_id: 1,
        }
    }
}

/// Hand out the next id, never reusing one that is already taken
fn next_id(counter: &mut u64, highest_taken: Option<u64>) -> u64 {
    let id = (*counter).max(highest_taken.map_or(1, |max| max + 1));
    *counter = id + 1;
    id
}

/// Store backed by maps in memory, optionally mirrored to a JSON snapshot
pub struct InMemoryStore {
    data: RwLock<StoreSnapshot>,
    snapshot_path: Option<PathBuf>,
    /// Serializes snapshot writes so the file always reflects the latest state
    write_lock: Mutex<()>,
}

impl InMemoryStore {
    /// Ephemeral store; nothing is written to disk
    pub fn new() -> Self {
        Self::from_snapshot(StoreSnapshot::default())
    }

    pub fn from_snapshot(snapshot: StoreSnapshot) -> Self {
        Self {
            data: RwLock::new(snapshot),
            snapshot_path: None,
            write_lock: Mutex::new(()),
        }
    }

    /// Load the snapshot at `path` (if present) and keep it updated on every change
    pub async fn open(path: &Path) -> Result<Self, StoreError> {
        let snapshot = if path.exists() {
            let content = fs::read_to_string(path).await?;
            let snapshot: StoreSnapshot = serde_json::from_str(&content)?;
            info!(
                path = %path.display(),
                issues = snapshot.issues.len(),
                "Loaded store snapshot"
            );
            snapshot
        } else {
            debug!(path = %path.display(), "No snapshot found, starting empty");
            StoreSnapshot::default()
        };

        Ok(Self {
            data: RwLock::new(snapshot),
            snapshot_path: Some(path.to_path_buf()),
            write_lock: Mutex::new(()),
        })
    }

    /// Copy of the current state
    pub async fn snapshot(&self) -> StoreSnapshot {
        self.data.read().await.clone()
    }

    // ========== Seeding (users, projects and labels are managed elsewhere) ==========

    pub async fn insert_user(&self, user: User) -> Result<(), StoreError> {
        self.mutate(|data| {
            data.users.insert(user.id, user);
            Ok(())
        })
        .await
    }

    pub async fn insert_project(&self, project: Project) -> Result<(), StoreError> {
        self.mutate(|data| {
            data.projects.insert(project.id, project);
            Ok(())
        })
        .await
    }

    pub async fn insert_label(&self, label: IssueLabel) -> Result<(), StoreError> {
        self.mutate(|data| {
            data.labels.insert(label.id, label);
            Ok(())
        })
        .await
    }

    pub async fn remove_label(&self, id: u64) -> Result<(), StoreError> {
        self.mutate(|data| {
            data.labels.remove(&id);
            Ok(())
        })
        .await
    }

    pub async fn insert_milestone(&self, milestone: Milestone) -> Result<(), StoreError> {
        self.mutate(|data| {
            data.milestones.insert(milestone.id, milestone);
            Ok(())
        })
        .await
    }

    pub async fn insert_attachment(&self, attachment: Attachment) -> Result<(), StoreError> {
        self.mutate(|data| {
            data.attachments.push(attachment);
            Ok(())
        })
        .await
    }

    /// Run a mutation under the write lock. With a snapshot file the change
    /// is applied to a copy and only becomes visible once the file is written.
    async fn mutate<T>(
        &self,
        f: impl FnOnce(&mut StoreSnapshot) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let _guard = self.write_lock.lock().await;

        let Some(path) = &self.snapshot_path else {
            let mut data = self.data.write().await;
            return f(&mut *data);
        };

        let mut staged = self.data.read().await.clone();
        let result = f(&mut staged)?;
        let content = serde_json::to_string_pretty(&staged)?;
        if let Err(err) = write_snapshot(path, &content).await {
            warn!(path = %path.display(), error = %err, "Snapshot write failed, change discarded");
            return Err(err);
        }

        *self.data.write().await = staged;
        Ok(result)
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Write atomically using temp file + rename
async fn write_snapshot(path: &Path, content: &str) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }

    let temp_path = path.with_extension("json.tmp");
    fs::write(&temp_path, content).await?;
    fs::rename(&temp_path, path).await?;
    Ok(())
}

#[async_trait]
impl Store for InMemoryStore {
    async fn find_user(&self, id: u64) -> Result<Option<User>, StoreError> {
        Ok(self.data.read().await.users.get(&id).cloned())
    }

    async fn find_user_by_login_id(&self, login_id: &str) -> Result<Option<User>, StoreError> {
        let data = self.data.read().await;
        Ok(data.users.values().find(|u| u.login_id == login_id).cloned())
    }

    async fn find_users_by_login_fragment(
        &self,
        fragment: &str,
    ) -> Result<Vec<User>, StoreError> {
        let needle = fragment.to_lowercase();
        let data = self.data.read().await;
        Ok(data
            .users
            .values()
            .filter(|u| u.login_id.to_lowercase().contains(&needle))
            .cloned()
            .collect())
    }

    async fn find_project(&self, owner: &str, name: &str) -> Result<Option<Project>, StoreError> {
        let data = self.data.read().await;
        Ok(data
            .projects
            .values()
            .find(|p| p.owner == owner && p.name == name)
            .cloned())
    }

    async fn find_label(&self, id: u64) -> Result<Option<IssueLabel>, StoreError> {
        Ok(self.data.read().await.labels.get(&id).cloned())
    }

    async fn labels_for_project(&self, project_id: u64) -> Result<Vec<IssueLabel>, StoreError> {
        let data = self.data.read().await;
        let mut labels: Vec<IssueLabel> = data
            .labels
            .values()
            .filter(|l| l.project_id == project_id)
            .cloned()
            .collect();
        labels.sort_by(|a, b| a.category.cmp(&b.category).then(a.name.cmp(&b.name)));
        Ok(labels)
    }

    async fn find_milestone(&self, id: u64) -> Result<Option<Milestone>, StoreError> {
        Ok(self.data.read().await.milestones.get(&id).cloned())
    }

    async fn milestones_for_project(&self, project_id: u64) -> Result<Vec<Milestone>, StoreError> {
        let data = self.data.read().await;
        Ok(data
            .milestones
            .values()
            .filter(|m| m.project_id == project_id)
            .cloned()
            .collect())
    }

    async fn find_issue(&self, id: u64) -> Result<Option<Issue>, StoreError> {
        Ok(self.data.read().await.issues.get(&id).cloned())
    }

    async fn find_issues(&self, query: &IssueQuery) -> Result<Vec<Issue>, StoreError> {
        let mut issues: Vec<Issue> = {
            let data = self.data.read().await;
            data.issues
                .values()
                .filter(|issue| query.matches(issue))
                .cloned()
                .collect()
        };
        query.sort(&mut issues);
        debug!(matched = issues.len(), order = ?query.order, "Evaluated issue query");
        Ok(issues)
    }

    async fn insert_issue(&self, issue: NewIssue) -> Result<Issue, StoreError> {
        self.mutate(|data| {
            let highest = data.issues.keys().next_back().copied();
            let id = next_id(&mut data.next_issue_id, highest);
            let issue = issue.into_issue(id);
            data.issues.insert(id, issue.clone());
            Ok(issue)
        })
        .await
    }

    async fn update_issue(&self, mut issue: Issue) -> Result<Issue, StoreError> {
        self.mutate(|data| {
            let stored = data
                .issues
                .get_mut(&issue.id)
                .ok_or(StoreError::IssueNotFound(issue.id))?;
            issue.num_of_comments = stored.num_of_comments;
            *stored = issue.clone();
            Ok(issue)
        })
        .await
    }

    async fn delete_issue(&self, id: u64) -> Result<(), StoreError> {
        self.mutate(|data| {
            data.issues
                .remove(&id)
                .ok_or(StoreError::IssueNotFound(id))?;

            let comment_ids: BTreeSet<u64> = data
                .comments
                .values()
                .filter(|c| c.issue_id == id)
                .map(|c| c.id)
                .collect();
            data.comments.retain(|comment_id, _| !comment_ids.contains(comment_id));

            data.attachments.retain(|a| match a.container {
                AttachmentContainer::Issue(issue_id) => issue_id != id,
                AttachmentContainer::Comment(comment_id) => !comment_ids.contains(&comment_id),
                AttachmentContainer::UserTemp(_) => true,
            });

            debug!(issue_id = id, comments = comment_ids.len(), "Deleted issue");
            Ok(())
        })
        .await
    }

    async fn find_comment(&self, id: u64) -> Result<Option<IssueComment>, StoreError> {
        Ok(self.data.read().await.comments.get(&id).cloned())
    }

    async fn comments_for_issue(&self, issue_id: u64) -> Result<Vec<IssueComment>, StoreError> {
        let data = self.data.read().await;
        let mut comments: Vec<IssueComment> = data
            .comments
            .values()
            .filter(|c| c.issue_id == issue_id)
            .cloned()
            .collect();
        comments.sort_by(|a, b| a.created_date.cmp(&b.created_date).then(a.id.cmp(&b.id)));
        Ok(comments)
    }

    async fn insert_comment(&self, comment: NewComment) -> Result<IssueComment, StoreError> {
        self.mutate(|data| {
            let parent = data
                .issues
                .get_mut(&comment.issue_id)
                .ok_or(StoreError::IssueNotFound(comment.issue_id))?;
            parent.num_of_comments += 1;

            let highest = data.comments.keys().next_back().copied();
            let id = next_id(&mut data.next_comment_id, highest);
            let comment = comment.into_comment(id);
            data.comments.insert(id, comment.clone());
            Ok(comment)
        })
        .await
    }

    async fn update_comment(&self, comment: IssueComment) -> Result<IssueComment, StoreError> {
        self.mutate(|data| {
            let stored = data
                .comments
                .get_mut(&comment.id)
                .ok_or(StoreError::CommentNotFound(comment.id))?;
            stored.body = comment.body;
            Ok(stored.clone())
        })
        .await
    }

    async fn delete_comment(&self, id: u64) -> Result<(), StoreError> {
        self.mutate(|data| {
            let comment = data
                .comments
                .remove(&id)
                .ok_or(StoreError::CommentNotFound(id))?;
            if let Some(parent) = data.issues.get_mut(&comment.issue_id) {
                parent.num_of_comments = parent.num_of_comments.saturating_sub(1);
            }
            data.attachments
                .retain(|a| a.container != AttachmentContainer::Comment(id));
            Ok(())
        })
        .await
    }

    async fn attach_files(
        &self,
        user_id: u64,
        container: AttachmentContainer,
    ) -> Result<usize, StoreError> {
        self.mutate(|data| {
            let mut moved = 0;
            for attachment in data
                .attachments
                .iter_mut()
                .filter(|a| a.container == AttachmentContainer::UserTemp(user_id))
            {
                attachment.container = container;
                moved += 1;
            }
            Ok(moved)
        })
        .await
    }

    async fn attachments_for(
        &self,
        container: AttachmentContainer,
    ) -> Result<Vec<Attachment>, StoreError> {
        let data = self.data.read().await;
        Ok(data
            .attachments
            .iter()
            .filter(|a| a.container == container)
            .cloned()
            .collect())
    }
}
