//! Class roster import.
//!
//! ```text
//! Group 1
//! 14000001 Ada King Lovelace abc123
//! 14000002 Alan Turing at456
//! Group 2
//! ...
//! ```

use crate::error::ServiceError;
use db::models::{group, student};
use sea_orm::{DatabaseConnection, TransactionTrait};
use serde::Serialize;
use std::collections::HashMap;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RosterEntry {
    pub drexel_id: String,
    pub name: String,
    pub user_id: String,
    pub group_number: i32,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct RosterImport {
    pub groups_created: usize,
    pub students_created: usize,
}

pub fn parse_roster(text: &str) -> Vec<RosterEntry> {
    let mut entries = Vec::new();
    let mut current_group: Option<i32> = None;

    for (lineno, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if line.starts_with("Group") {
            current_group = line.split_whitespace().last().and_then(|n| n.parse().ok());
            if current_group.is_none() {
                warn!("Roster line {}: bad group header '{line}'", lineno + 1);
            }
            continue;
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 3 {
            warn!("Roster line {}: expected '<id> <name...> <user id>'", lineno + 1);
            continue;
        }
        let Some(group_number) = current_group else {
            warn!("Roster line {}: student listed outside a group", lineno + 1);
            continue;
        };

        entries.push(RosterEntry {
            drexel_id: parts[0].to_string(),
            name: parts[1..parts.len() - 1].join(" "),
            user_id: parts[parts.len() - 1].to_string(),
            group_number,
        });
    }

    entries
}

/// Creates missing groups and every listed student in one transaction.
///
/// A duplicate student rolls the whole import back and surfaces as
/// [`ServiceError::Conflict`].
pub async fn import_roster(
    db: &DatabaseConnection,
    entries: &[RosterEntry],
) -> Result<RosterImport, ServiceError> {
    let txn = db.begin().await?;
    let mut summary = RosterImport::default();
    let mut group_ids: HashMap<i32, i64> = HashMap::new();

    for entry in entries {
        let group_id = match group_ids.get(&entry.group_number) {
            Some(id) => *id,
            None => {
                let id = match group::Model::get_by_number(&txn, entry.group_number).await? {
                    Some(existing) => existing.id,
                    None => {
                        summary.groups_created += 1;
                        group::Model::create(&txn, entry.group_number).await?.id
                    }
                };
                group_ids.insert(entry.group_number, id);
                id
            }
        };

        student::Model::create(
            &txn,
            &entry.user_id,
            &entry.name,
            &entry.drexel_id,
            Some(group_id),
        )
        .await?;
        summary.students_created += 1;
    }

    txn.commit().await?;
    info!(
        groups = summary.groups_created,
        students = summary.students_created,
        "Roster imported"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use db::test_utils::setup_test_db;

    const ROSTER: &str = "Group 1\n\
                          14000001 Ada King Lovelace abc123\n\
                          14000002 Alan Turing at456\n\
                          \n\
                          Group 2\n\
                          14000003 Grace Hopper gh789\n\
                          broken line\n";

    #[test]
    fn parses_groups_and_multi_word_names() {
        let entries = parse_roster(ROSTER);
        assert_eq!(entries.len(), 3);
        assert_eq!(
            entries[0],
            RosterEntry {
                drexel_id: "14000001".into(),
                name: "Ada King Lovelace".into(),
                user_id: "abc123".into(),
                group_number: 1,
            }
        );
        assert_eq!(entries[2].group_number, 2);
        assert_eq!(entries[2].name, "Grace Hopper");
    }

    #[test]
    fn students_before_any_group_are_skipped() {
        let entries = parse_roster("14000001 Ada Lovelace abc123\nGroup 3\n1 B C d\n");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].group_number, 3);
    }

    #[tokio::test]
    async fn import_creates_groups_and_students() {
        let db = setup_test_db().await;

        let summary = import_roster(&db, &parse_roster(ROSTER)).await.unwrap();

        assert_eq!(summary.groups_created, 2);
        assert_eq!(summary.students_created, 3);
        let ada = student::Model::get_by_user_id(&db, "abc123")
            .await
            .unwrap()
            .unwrap();
        let g1 = group::Model::get_by_number(&db, 1).await.unwrap().unwrap();
        assert_eq!(ada.group_id, Some(g1.id));
    }

    #[tokio::test]
    async fn duplicate_student_rolls_back_everything() {
        let db = setup_test_db().await;
        let roster = "Group 1\n1 Ada Lovelace abc123\n2 Ada Again abc123\n";

        let err = import_roster(&db, &parse_roster(roster)).await.unwrap_err();

        assert!(matches!(err, ServiceError::Conflict(_)), "{err:?}");
        assert!(group::Model::get_by_number(&db, 1).await.unwrap().is_none());
        assert!(
            student::Model::get_by_user_id(&db, "abc123")
                .await
                .unwrap()
                .is_none()
        );
    }
}
