//! End-to-end behaviour of the catalog against a private in-memory store:
//! search/restore, the stock rule for transactions, and cascading deletes.

use library_ledger::{db, Catalog, LedgerError, Mode, Record, TransactionKind};

fn catalog() -> Catalog {
    Catalog::new(db::open_in_memory().unwrap())
}

fn stock_of(catalog: &Catalog, book_id: i64) -> i64 {
    db::fetch_book(catalog.connection(), book_id)
        .unwrap()
        .unwrap()
        .stock
}

fn logs(catalog: &Catalog) -> i64 {
    db::count_logs(catalog.connection()).unwrap()
}

fn titles(catalog: &Catalog) -> Vec<String> {
    catalog.items().iter().map(Record::describe).collect()
}

#[test]
fn borrowing_down_to_zero_then_rejected() {
    let mut catalog = catalog();
    let dune = catalog.add_book("Dune", 2).unwrap().unwrap();
    let ann = catalog.add_client("Ann", "Lee").unwrap().unwrap();
    catalog.switch_mode(Mode::Book).unwrap();

    let entry = catalog
        .record_transaction(dune.id, ann.id, TransactionKind::Borrowing)
        .unwrap();
    assert_eq!(entry.kind, TransactionKind::Borrowing);
    assert_eq!(stock_of(&catalog, dune.id), 1);
    assert_eq!(logs(&catalog), 1);

    catalog
        .record_transaction(dune.id, ann.id, TransactionKind::Borrowing)
        .unwrap();
    assert_eq!(stock_of(&catalog, dune.id), 0);

    let err = catalog
        .record_transaction(dune.id, ann.id, TransactionKind::Borrowing)
        .unwrap_err();
    assert!(matches!(err, LedgerError::OutOfStock { book_id, .. } if book_id == dune.id));
    assert_eq!(stock_of(&catalog, dune.id), 0);
    assert_eq!(logs(&catalog), 2);
}

#[test]
fn returning_is_allowed_at_zero_stock() {
    let mut catalog = catalog();
    let dune = catalog.add_book("Dune", 1).unwrap().unwrap();
    let ann = catalog.add_client("Ann", "Lee").unwrap().unwrap();
    catalog
        .record_transaction(dune.id, ann.id, TransactionKind::Borrowing)
        .unwrap();

    catalog
        .record_transaction(dune.id, ann.id, TransactionKind::Returning)
        .unwrap();
    assert_eq!(stock_of(&catalog, dune.id), 1);
}

#[test]
fn stock_never_goes_negative_over_mixed_sequences() {
    let mut catalog = catalog();
    let dune = catalog.add_book("Dune", 3).unwrap().unwrap();
    let ann = catalog.add_client("Ann", "Lee").unwrap().unwrap();

    let pattern = "BBRBBBBRRBBBBBRB";
    for step in pattern.chars() {
        let kind = if step == 'B' {
            TransactionKind::Borrowing
        } else {
            TransactionKind::Returning
        };
        match catalog.record_transaction(dune.id, ann.id, kind) {
            Ok(_) | Err(LedgerError::OutOfStock { .. }) => {}
            Err(other) => panic!("unexpected error: {other}"),
        }
        assert!(stock_of(&catalog, dune.id) >= 0);
    }
}

#[test]
fn adding_a_book_with_empty_title_changes_nothing() {
    let mut catalog = catalog();
    catalog.add_book("Emma", 1).unwrap();
    catalog.switch_mode(Mode::Book).unwrap();
    let before = catalog.items().to_vec();

    assert_eq!(catalog.add_book("", 5).unwrap(), None);
    assert_eq!(catalog.items(), before.as_slice());
    assert_eq!(db::fetch_books(catalog.connection()).unwrap().len(), 1);
}

#[test]
fn search_always_filters_the_fetched_set() {
    let mut catalog = catalog();
    for (first, last) in [("Ann", "Lee"), ("Bob", "Lee"), ("Cleo", "Park")] {
        catalog.add_client(first, last).unwrap();
    }
    catalog.switch_mode(Mode::Client).unwrap();
    let fetched = catalog.items().to_vec();

    let predicates = ["ann", "lee", "LEE", "o", "park", "x", "e"];
    for first in predicates {
        for second in predicates {
            catalog.search(first);
            catalog.search(second);

            let needle = second.to_lowercase();
            let expected: Vec<Record> = fetched
                .iter()
                .filter(|record| record.matches(&needle))
                .cloned()
                .collect();
            assert_eq!(catalog.items(), expected.as_slice(), "{first} then {second}");

            catalog.search("");
            assert_eq!(catalog.items(), fetched.as_slice());
        }
    }
}

#[test]
fn narrowing_then_widening_keeps_everyone() {
    let mut catalog = catalog();
    catalog.add_client("Ann", "Lee").unwrap();
    catalog.add_client("Bob", "Lee").unwrap();
    catalog.switch_mode(Mode::Client).unwrap();

    catalog.search("ann");
    assert_eq!(titles(&catalog), ["Ann Lee"]);
    catalog.search("lee");
    assert_eq!(titles(&catalog), ["Ann Lee", "Bob Lee"]);
}

#[test]
fn history_search_covers_titles_and_names() {
    let mut catalog = catalog();
    let dune = catalog.add_book("Dune", 2).unwrap().unwrap();
    let emma = catalog.add_book("Emma", 2).unwrap().unwrap();
    let ann = catalog.add_client("Ann", "Lee").unwrap().unwrap();
    let bob = catalog.add_client("Bob", "Park").unwrap().unwrap();
    catalog
        .record_transaction(dune.id, ann.id, TransactionKind::Borrowing)
        .unwrap();
    catalog
        .record_transaction(emma.id, bob.id, TransactionKind::Borrowing)
        .unwrap();
    catalog.switch_mode(Mode::Log).unwrap();

    catalog.search("park");
    assert_eq!(catalog.len(), 1);
    catalog.search("dune");
    assert_eq!(catalog.len(), 1);
    catalog.search("borrowing");
    assert!(catalog.is_empty());
}

#[test]
fn deleting_a_book_removes_its_transactions() {
    let mut catalog = catalog();
    let dune = catalog.add_book("Dune", 3).unwrap().unwrap();
    let emma = catalog.add_book("Emma", 3).unwrap().unwrap();
    let ann = catalog.add_client("Ann", "Lee").unwrap().unwrap();
    for book in [dune.id, dune.id, emma.id] {
        catalog
            .record_transaction(book, ann.id, TransactionKind::Borrowing)
            .unwrap();
    }
    catalog.switch_mode(Mode::Book).unwrap();

    catalog.delete_book(dune.id).unwrap();
    assert_eq!(logs(&catalog), 1);
    assert!(db::fetch_logs(catalog.connection())
        .unwrap()
        .iter()
        .all(|entry| entry.book_id == emma.id));
    assert_eq!(titles(&catalog), ["Emma"]);
}

#[test]
fn deleting_a_client_removes_their_transactions() {
    let mut catalog = catalog();
    let dune = catalog.add_book("Dune", 3).unwrap().unwrap();
    let ann = catalog.add_client("Ann", "Lee").unwrap().unwrap();
    let bob = catalog.add_client("Bob", "Lee").unwrap().unwrap();
    for client in [ann.id, bob.id, ann.id] {
        catalog
            .record_transaction(dune.id, client, TransactionKind::Borrowing)
            .unwrap();
    }

    catalog.delete_client(ann.id).unwrap();
    let remaining = db::fetch_logs(catalog.connection()).unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].client_id, bob.id);
    assert_eq!(db::fetch_client(catalog.connection(), ann.id).unwrap(), None);
}

#[test]
fn deleting_a_transaction_keeps_the_stock() {
    let mut catalog = catalog();
    let dune = catalog.add_book("Dune", 1).unwrap().unwrap();
    let ann = catalog.add_client("Ann", "Lee").unwrap().unwrap();
    let entry = catalog
        .record_transaction(dune.id, ann.id, TransactionKind::Borrowing)
        .unwrap();
    catalog.switch_mode(Mode::Log).unwrap();

    catalog.delete_transaction(entry.id).unwrap();
    assert!(catalog.is_empty());
    assert_eq!(stock_of(&catalog, dune.id), 0);
}

#[test]
fn deleting_an_unknown_id_is_not_found() {
    let mut catalog = catalog();
    catalog.add_book("Dune", 1).unwrap();
    catalog.switch_mode(Mode::Book).unwrap();

    let err = catalog.delete_book(404).unwrap_err();
    assert!(matches!(err, LedgerError::NotFound { entity: "book", id: 404 }));
    assert_eq!(catalog.len(), 1);
}

#[test]
fn refresh_drops_the_filter() {
    let mut catalog = catalog();
    catalog.add_book("Dune", 1).unwrap();
    catalog.add_book("Emma", 1).unwrap();
    catalog.switch_mode(Mode::Book).unwrap();
    catalog.search("dune");
    assert!(catalog.is_filtering());

    catalog.refresh().unwrap();
    assert!(!catalog.is_filtering());
    assert_eq!(catalog.len(), 2);
}

#[test]
fn returning_at_the_stock_ceiling_is_rejected() {
    let mut catalog = catalog();
    let dune = catalog.add_book("Dune", i64::MAX).unwrap().unwrap();
    let ann = catalog.add_client("Ann", "Lee").unwrap().unwrap();
    catalog.switch_mode(Mode::Book).unwrap();

    let err = catalog
        .record_transaction(dune.id, ann.id, TransactionKind::Returning)
        .unwrap_err();
    assert!(matches!(err, LedgerError::StockOverflow { book_id, .. } if book_id == dune.id));
    assert_eq!(stock_of(&catalog, dune.id), i64::MAX);
    assert_eq!(logs(&catalog), 0);

    catalog
        .record_transaction(dune.id, ann.id, TransactionKind::Borrowing)
        .unwrap();
    assert_eq!(stock_of(&catalog, dune.id), i64::MAX - 1);
}
