use futures::executor::block_on;
use name_tree::{names::NameStore, view::NameBoard};

use crate::common::test_utils::{FakeStore, names};

mod common;

#[test]
fn startup_fetch_fills_the_board() {
    let store = FakeStore::with_rows(&["Ana", "Luz"]);
    let mut board = NameBoard::default();

    board.apply_loaded(block_on(store.list_names()));

    assert!(board.is_loaded());
    assert_eq!(board.names(), names(&["Ana", "Luz"]).as_slice());
    assert_eq!(store.calls().list, 1);
}

#[test]
fn failed_fetch_still_counts_as_loaded() {
    let store = FakeStore::failing();
    let mut board = NameBoard::default();

    board.apply_loaded(block_on(store.list_names()));

    assert!(board.is_loaded());
    assert!(board.names().is_empty());
}

#[test]
fn submissions_append_after_fetched_names_in_order() {
    let store = FakeStore::with_rows(&["Ana"]);
    let mut board = NameBoard::default();
    board.apply_loaded(block_on(store.list_names()));

    for text in ["Luz", "Pedro", "Luz"] {
        board.set_pending(text);
        assert!(board.submit().is_some());
    }

    assert_eq!(board.names(), names(&["Ana", "Luz", "Pedro", "Luz"]).as_slice());
    assert_eq!(board.pending(), "");
}

#[test]
fn empty_submit_leaves_the_board_alone() {
    let store = FakeStore::with_rows(&["Ana"]);
    let mut board = NameBoard::default();
    board.apply_loaded(block_on(store.list_names()));

    assert!(board.submit().is_none());

    assert_eq!(board.names(), names(&["Ana"]).as_slice());
}

#[test]
fn fake_store_appends_inserted_rows() {
    let store = FakeStore::with_rows(&["Ana"]);

    assert!(block_on(store.add_name("Luz".into())).is_ok());

    assert_eq!(store.rows(), names(&["Ana", "Luz"]));
    assert_eq!(store.calls().add, 1);
}
