//! One-to-one contacts: everyone the caller has exchanged a direct message
//! with, in either direction. Derived on every request, never stored.
//!
//! The scan is linear in the caller's direct messages. A busy deployment
//! would keep a contacts table updated on each new direct message instead.

use std::collections::BTreeSet;

use axum::{Extension, Json, extract::State};
use campus_db::models::UserRow;
use campus_db::{Database, DbError};
use campus_types::api::ContactResponse;

use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::state::{AppState, blocking};

/// Distinct counterparts of `user_id` over (sender, receiver) pairs. Pairs
/// the user is not part of and messages to self are ignored.
pub fn derive_contacts<I>(user_id: &str, pairs: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = (String, String)>,
{
    pairs
        .into_iter()
        .filter_map(|(sender, receiver)| {
            if sender == user_id {
                Some(receiver)
            } else if receiver == user_id {
                Some(sender)
            } else {
                None
            }
        })
        .filter(|other| other != user_id)
        .collect()
}

/// Contacts of `user_id` as user rows, ordered by username.
pub fn contacts_for(db: &Database, user_id: &str) -> Result<Vec<UserRow>, DbError> {
    let pairs = db.get_direct_pairs(user_id)?;
    let ids: Vec<String> = derive_contacts(user_id, pairs).into_iter().collect();
    db.get_users_by_ids(&ids)
}

pub async fn get_contacts(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<ContactResponse>>, ApiError> {
    let rows = blocking(&state, move |s| Ok(contacts_for(&s.db, &user.id.to_string())?)).await?;

    Ok(Json(
        rows.into_iter()
            .map(|u| ContactResponse {
                username: u.username,
            })
            .collect(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use campus_db::queries::NewMessage;

    fn pair(a: &str, b: &str) -> (String, String) {
        (a.to_string(), b.to_string())
    }

    #[test]
    fn counterparts_are_deduplicated() {
        let contacts = derive_contacts(
            "a",
            vec![pair("a", "b"), pair("b", "a"), pair("a", "b"), pair("c", "a")],
        );
        assert_eq!(contacts.into_iter().collect::<Vec<_>>(), ["b", "c"]);
    }

    #[test]
    fn no_messages_means_no_contacts() {
        assert!(derive_contacts("a", Vec::new()).is_empty());
    }

    #[test]
    fn self_and_unrelated_pairs_are_skipped() {
        let contacts = derive_contacts("a", vec![pair("a", "a"), pair("b", "c")]);
        assert!(contacts.is_empty());
    }

    #[test]
    fn contacts_resolve_to_users_on_both_sides() {
        let db = Database::open_in_memory().unwrap();
        for name in ["alice", "bob", "carol"] {
            db.create_user(name, name, &format!("{}@x.com", name), "hash", "MIT")
                .unwrap();
        }
        for (i, (from, to)) in [("alice", "bob"), ("bob", "alice"), ("carol", "alice")]
            .into_iter()
            .enumerate()
        {
            db.create_message(&NewMessage::direct(&format!("m{}", i), from, to, "hi"))
                .unwrap();
        }

        let names = |id: &str| -> Vec<String> {
            contacts_for(&db, id)
                .unwrap()
                .into_iter()
                .map(|u| u.username)
                .collect()
        };
        assert_eq!(names("alice"), ["bob", "carol"]);
        assert_eq!(names("bob"), ["alice"]);
        assert_eq!(names("carol"), ["alice"]);
    }
}
