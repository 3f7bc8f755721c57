//! Read/write scenarios across all three strategies

use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use ormherit::model_catalog::OrderingTerm;
use ormherit::session::{DerivedValue, ManualClock, Session};
use ormherit::storage::{row, Filter, StorageError, Value};

use super::migrated_sample;

#[test]
fn test_parent_delete_cascades_to_child() {
    let (registry, engine) = migrated_sample();
    let mut session = Session::new(&registry, engine);

    let pk = session
        .create(
            "ISBN",
            row([
                ("title", Value::from("Middlemarch")),
                ("ISBN", Value::from("978-0141439549")),
            ]),
        )
        .unwrap();
    assert_eq!(session.engine().row_count("orm_isbn"), Some(1));

    session.delete("Books", pk).unwrap();
    assert_eq!(session.engine().row_count("orm_books"), Some(0));
    assert_eq!(session.engine().row_count("orm_isbn"), Some(0));
    assert!(matches!(
        session.get("ISBN", pk),
        Err(StorageError::RowNotFound { .. })
    ));
}

#[test]
fn test_child_fetch_joins_parent_fields() {
    let (registry, engine) = migrated_sample();
    let mut session = Session::new(&registry, engine);
    let pk = session
        .create(
            "ISBN",
            row([("title", Value::from("Emma")), ("ISBN", Value::from("978-1"))]),
        )
        .unwrap();

    let fetched = session.get("ISBN", pk).unwrap();
    for field in ["title", "created", "ISBN"] {
        assert!(fetched.contains_key(field), "missing {field}");
    }
    assert_eq!(fetched["books_ptr"], Value::from(pk));
    assert_eq!(session.display("ISBN", &fetched).unwrap(), "Emma");
}

#[test]
fn test_proxy_orders_by_creation_and_reports_elapsed() {
    let (registry, engine) = migrated_sample();
    let start = Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap();
    let clock = Arc::new(ManualClock::new(start));
    let mut session = Session::with_clock(&registry, engine, clock.clone());

    for title in ["Walden", "Arcadia", "Ulysses"] {
        session
            .create("BookContent", row([("title", Value::from(title))]))
            .unwrap();
        clock.advance(Duration::days(1));
    }

    let orders = session.list("BookOrders", None).unwrap();
    let titles: Vec<&str> = orders.iter().filter_map(|r| r["title"].as_text()).collect();
    assert_eq!(titles, vec!["Walden", "Arcadia", "Ulysses"]);

    let content = session.list("BookContent", None).unwrap();
    assert_eq!(content.len(), 3);

    let elapsed = session
        .evaluate_derived("BookOrders", &orders[0], "created_on")
        .unwrap();
    assert_eq!(elapsed, DerivedValue::Duration(Duration::days(3)));
}

#[test]
fn test_item_defaults_validation_and_ordering() {
    let (registry, engine) = migrated_sample();
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let clock = Arc::new(ManualClock::new(start));
    let mut session = Session::with_clock(&registry, engine, clock.clone());

    for title in ["first", "second"] {
        session
            .create(
                "ItemA",
                row([("title", Value::from(title)), ("content", Value::from("..."))]),
            )
            .unwrap();
        clock.advance(Duration::seconds(30));
    }
    let newest_first = session.list("ItemA", None).unwrap();
    assert_eq!(newest_first[0]["title"], Value::from("second"));

    let by_title = [OrderingTerm::asc("title")];
    let alphabetical = session.list("ItemA", Some(&by_title)).unwrap();
    assert_eq!(alphabetical[0]["title"], Value::from("first"));

    let pk = session
        .create(
            "ItemB",
            row([("title", Value::from("report")), ("file", Value::from("q1.pdf"))]),
        )
        .unwrap();
    assert_eq!(
        session.get("ItemB", pk).unwrap()["file"],
        Value::from("files/q1.pdf")
    );

    let too_long = "x".repeat(256);
    assert!(matches!(
        session.create("ItemD", row([("title", Value::from(too_long)), ("slug", Value::from("a"))])),
        Err(StorageError::Validation { .. })
    ));
}

#[test]
fn test_slug_uniqueness_and_filtering() {
    let (registry, engine) = migrated_sample();
    let mut session = Session::new(&registry, engine);
    session
        .create(
            "ItemD",
            row([("title", Value::from("One")), ("slug", Value::from("one"))]),
        )
        .unwrap();
    let err = session
        .create(
            "ItemD",
            row([("title", Value::from("Uno")), ("slug", Value::from("one"))]),
        )
        .unwrap_err();
    assert_eq!(
        err,
        StorageError::UniqueViolation {
            table: "orm_itemd".to_string(),
            column: "slug".to_string()
        }
    );

    let found = session
        .filter("ItemD", &Filter::eq("slug", "one"), None)
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0]["title"], Value::from("One"));
}

#[test]
fn test_update_refreshes_updated_only() {
    let (registry, engine) = migrated_sample();
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let clock = Arc::new(ManualClock::new(start));
    let mut session = Session::with_clock(&registry, engine, clock.clone());
    let pk = session
        .create(
            "ItemA",
            row([("title", Value::from("draft")), ("content", Value::from(""))]),
        )
        .unwrap();

    clock.advance(Duration::minutes(10));
    let updated = session
        .update("ItemA", pk, row([("content", Value::from("final"))]))
        .unwrap();
    assert_eq!(updated["created"], Value::Timestamp(start));
    assert_eq!(
        updated["updated"],
        Value::Timestamp(start + Duration::minutes(10))
    );
    assert!(session
        .update("ItemA", pk, row([("updated", Value::Timestamp(start))]))
        .is_err());
}

#[test]
fn test_abstract_base_cannot_be_queried() {
    let (registry, engine) = migrated_sample();
    let session = Session::new(&registry, engine);
    assert!(matches!(
        session.list("BaseItem", None),
        Err(StorageError::NotQueryable { .. })
    ));
}
