//! URL builders for issue pages. Mirrors the routing table in `server`.

use super::search::{SearchCondition, DEFAULT_STATE};
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};

const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

fn project_base(owner: &str, project: &str) -> String {
    format!(
        "/{}/{}",
        utf8_percent_encode(owner, PATH_SEGMENT),
        utf8_percent_encode(project, PATH_SEGMENT)
    )
}

fn with_query<K: AsRef<str>, V: AsRef<str>>(path: String, params: &[(K, V)]) -> String {
    if params.is_empty() {
        return path;
    }
    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    for (key, value) in params {
        serializer.append_pair(key.as_ref(), value.as_ref());
    }
    format!("{}?{}", path, serializer.finish())
}

/// Listing URL without any filter besides state, format and page
pub fn issues_url(owner: &str, project: &str, state: &str, format: &str, page_num: usize) -> String {
    with_query(
        format!("{}/issues", project_base(owner, project)),
        &[
            ("state", state.to_string()),
            ("format", format.to_string()),
            ("pageNum", page_num.to_string()),
        ],
    )
}

/// First page of the default HTML listing
pub fn default_issues_url(owner: &str, project: &str) -> String {
    issues_url(owner, project, DEFAULT_STATE, "html", 1)
}

/// Listing URL carrying every criterion of `condition`. `page_num` is 1-based.
pub fn search_url(
    owner: &str,
    project: &str,
    condition: &SearchCondition,
    format: &str,
    page_num: Option<usize>,
) -> String {
    let mut params = condition.to_params();
    params.push(("format", format.to_string()));
    if let Some(page_num) = page_num {
        params.push(("pageNum", page_num.to_string()));
    }
    with_query(format!("{}/issues", project_base(owner, project)), &params)
}

pub fn new_issue_url(owner: &str, project: &str) -> String {
    format!("{}/issues/new", project_base(owner, project))
}

pub fn create_issue_url(owner: &str, project: &str) -> String {
    format!("{}/issues", project_base(owner, project))
}

pub fn issue_url(owner: &str, project: &str, issue_id: u64) -> String {
    format!("{}/issue/{}", project_base(owner, project), issue_id)
}

pub fn edit_issue_url(owner: &str, project: &str, issue_id: u64) -> String {
    format!("{}/edit", issue_url(owner, project, issue_id))
}

pub fn delete_issue_url(owner: &str, project: &str, issue_id: u64) -> String {
    format!("{}/delete", issue_url(owner, project, issue_id))
}

pub fn new_comment_url(owner: &str, project: &str, issue_id: u64) -> String {
    format!("{}/comments", issue_url(owner, project, issue_id))
}

pub fn delete_comment_url(owner: &str, project: &str, issue_id: u64, comment_id: u64) -> String {
    format!(
        "{}/comment/{}/delete",
        issue_url(owner, project, issue_id),
        comment_id
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issues_url() {
        assert_eq!(
            issues_url("alice", "forge", "open", "html", 1),
            "/alice/forge/issues?state=open&format=html&pageNum=1"
        );
        assert_eq!(
            default_issues_url("alice", "forge"),
            issues_url("alice", "forge", "open", "html", 1)
        );
    }

    #[test]
    fn test_path_segments_are_encoded() {
        assert_eq!(issue_url("a b", "x/y", 7), "/a%20b/x%2Fy/issue/7");
    }

    #[test]
    fn test_search_url_keeps_criteria() {
        let condition = SearchCondition {
            filter: Some("crash & burn".to_string()),
            label_ids: [1, 2].into_iter().collect(),
            ..Default::default()
        };
        assert_eq!(
            search_url("alice", "forge", &condition, "xls", None),
            "/alice/forge/issues?state=open&filter=crash+%26+burn&labelIds=1&labelIds=2&format=xls"
        );
    }

    #[test]
    fn test_comment_urls() {
        assert_eq!(new_comment_url("o", "p", 3), "/o/p/issue/3/comments");
        assert_eq!(
            delete_comment_url("o", "p", 3, 9),
            "/o/p/issue/3/comment/9/delete"
        );
    }
}
