//! Access-check lookups (spec §4.4 "Access check rules"): friendship for
//! DM rooms, membership rows for group rooms. These tables are read-only
//! from the core's perspective; the core never writes them.

mod common;

#[tokio::test]
async fn accepted_friendship_is_direction_agnostic() {
    let (warm, _db) = common::warm().await;
    common::seed_friendship(&warm, "alice", "bob", "accepted").await;

    assert!(warm.friendships().is_accepted("alice", "bob").await.unwrap());
    assert!(warm.friendships().is_accepted("bob", "alice").await.unwrap());
}

#[tokio::test]
async fn pending_friendship_does_not_grant_access() {
    let (warm, _db) = common::warm().await;
    common::seed_friendship(&warm, "alice", "bob", "pending").await;

    assert!(!warm.friendships().is_accepted("alice", "bob").await.unwrap());
}

#[tokio::test]
async fn unrelated_users_have_no_friendship() {
    let (warm, _db) = common::warm().await;
    assert!(!warm.friendships().is_accepted("alice", "carol").await.unwrap());
}

#[tokio::test]
async fn accepted_friend_ids_covers_both_sides_of_the_row() {
    let (warm, _db) = common::warm().await;
    common::seed_friendship(&warm, "alice", "bob", "accepted").await;
    common::seed_friendship(&warm, "carol", "alice", "accepted").await;
    common::seed_friendship(&warm, "alice", "dave", "pending").await;

    let mut friends = warm.friendships().accepted_friend_ids("alice").await.unwrap();
    friends.sort();
    assert_eq!(friends, vec!["bob".to_string(), "carol".to_string()]);
}

#[tokio::test]
async fn group_membership_gates_access() {
    let (warm, _db) = common::warm().await;
    common::seed_group_member(&warm, "g1", "alice").await;

    assert!(warm.groups().is_member("g1", "alice").await.unwrap());
    assert!(!warm.groups().is_member("g1", "bob").await.unwrap());
}

#[tokio::test]
async fn display_name_lookup_is_none_for_unknown_user() {
    let (warm, _db) = common::warm().await;
    common::seed_user(&warm, "alice", "Alice A.").await;

    assert_eq!(warm.users().display_name("alice").await.unwrap(), Some("Alice A.".to_string()));
    assert_eq!(warm.users().display_name("ghost").await.unwrap(), None);
}
