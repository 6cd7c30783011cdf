use super::*;
use crate::directory::LoadPhase;
use shared::error::Failure;

fn ready(users: Vec<UserRecord>) -> ViewState {
    ViewState::from_parts(users, LoadPhase::Ready)
}

#[test]
fn loading_phases_render_only_the_spinner() {
    for phase in [
        LoadPhase::Initializing,
        LoadPhase::HydratingRemote,
        LoadPhase::HydratingLocal,
    ] {
        let state = ViewState::from_parts(vec![UserRecord::new("u1", "Mr A B", "img1")], phase);
        assert_eq!(render(&state), ViewTree::Loading);
    }
}

#[test]
fn ready_state_renders_header_and_one_card_per_user() {
    let state = ready(vec![
        UserRecord::new("u1", "Mr A B", "img1"),
        UserRecord::new("u2", "Ms C D", "img2"),
    ]);

    let ViewTree::Directory { header, cards } = render(&state) else {
        panic!("expected directory view");
    };
    assert_eq!(header.title, "Users");
    assert_eq!(header.count_label, "2 Users");
    assert_eq!(header.refresh, Action::Refresh);
    assert_eq!(cards.len(), 2);
    assert_eq!(
        cards[1],
        Card {
            id: UserKey::from("u2"),
            name: "Ms C D".to_string(),
            image: "img2".to_string(),
            delete: Action::Delete(UserKey::from("u2")),
        }
    );
}

#[test]
fn empty_ready_state_still_shows_header() {
    let ViewTree::Directory { header, cards } = render(&ready(Vec::new())) else {
        panic!("expected directory view");
    };
    assert_eq!(header.count_label, "0 Users");
    assert!(cards.is_empty());
}

#[test]
fn failed_state_renders_retry() {
    let state = ViewState::from_parts(
        Vec::new(),
        LoadPhase::Failed(Failure::new(ErrorKind::Network, "profile endpoint returned HTTP 503")),
    );
    assert_eq!(
        render(&state),
        ViewTree::LoadFailed {
            kind: ErrorKind::Network,
            message: "profile endpoint returned HTTP 503".to_string(),
            retry: Action::Retry,
        }
    );
}

#[test]
fn grid_is_responsive_at_breakpoints() {
    assert_eq!(cards_per_row(320.0), 2);
    assert_eq!(cards_per_row(599.0), 2);
    assert_eq!(cards_per_row(600.0), 4);
    assert_eq!(cards_per_row(899.0), 4);
    assert_eq!(cards_per_row(900.0), 6);
    assert_eq!(cards_per_row(1920.0), 6);
    assert_eq!(grid_spacing(500.0), 16.0);
    assert_eq!(grid_spacing(1280.0), 24.0);
}
