use std::cell::RefCell;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;

use restore::{value, ImmutableStore, MutationKind, Path, StoreError, Value};

type Log = Rc<RefCell<Vec<Value>>>;

fn log() -> Log {
    Rc::new(RefCell::new(Vec::new()))
}

fn recorder(log: &Log) -> impl Fn(&Value) + 'static {
    let log = Rc::clone(log);
    move |value: &Value| log.borrow_mut().push(value.clone())
}

fn users() -> ImmutableStore {
    ImmutableStore::new(value!({
        "users": [
            {"name": "Diego", "comments": []},
            {"name": "Bianca", "comments": [{"text": "Nice!"}]}
        ]
    }))
}

fn path(text: &str) -> Path {
    Path::parse(text).unwrap()
}

#[test]
fn appending_a_comment_fires_create_once() {
    let store = users();
    let created = log();
    store
        .subscribe_create("/users/.*/comments", recorder(&created))
        .unwrap();

    store
        .append(&path("/users/0/comments"), value!({"text": "hi"}))
        .unwrap();

    assert_eq!(*created.borrow(), vec![value!({"text": "hi"})]);
    assert_eq!(
        store.get_ptr("/users/0/comments").unwrap(),
        value!([{"text": "hi"}])
    );
}

#[test]
fn appending_through_a_node_fires_create() {
    let store = users();
    let created = log();
    store
        .subscribe_create("/users/.*/comments", recorder(&created))
        .unwrap();

    let comments = store.node_at("/users/1/comments").unwrap();
    comments.push(value!({"text": "again"})).unwrap();

    assert_eq!(*created.borrow(), vec![value!({"text": "again"})]);
}

#[test]
fn payload_depends_on_the_category() {
    let store = users();
    let replaced = log();
    let merged = log();
    let removed = log();
    store.subscribe_replace("/users/0/name", recorder(&replaced)).unwrap();
    store.subscribe_merge("/users/.", recorder(&merged)).unwrap();
    store.subscribe_remove("/users/1/comments", recorder(&removed)).unwrap();

    store.put(&path("/users/0/name"), "Borges").unwrap();
    store.patch(&path("/users/1"), value!({"age": 24})).unwrap();
    store.delete(&path("/users/1/comments"), 0).unwrap();

    assert_eq!(*replaced.borrow(), vec![value!("Borges")]);
    assert_eq!(
        *merged.borrow(),
        vec![value!({"name": "Bianca", "comments": [{"text": "Nice!"}], "age": 24})]
    );
    assert_eq!(*removed.borrow(), vec![value!({"text": "Nice!"})]);
}

#[test]
fn splice_and_map_notify_replace_with_the_new_value() {
    let store = ImmutableStore::new(value!({"list": [1, 2, 3]}));
    let replaced = log();
    store.subscribe_replace("/list", recorder(&replaced)).unwrap();

    store.splice(&path("/list"), 0, 1, Vec::new()).unwrap();
    store
        .map(&path("/list"), |list| {
            let mut items = list.as_array().map(|a| a.as_ref().clone()).unwrap_or_default();
            items.reverse();
            Value::array(items)
        })
        .unwrap();

    assert_eq!(*replaced.borrow(), vec![value!([2, 3]), value!([3, 2])]);
}

#[test]
fn patterns_are_anchored_and_category_specific() {
    let store = users();
    let created = log();
    store.subscribe_create("/users/.", recorder(&created)).unwrap();

    store.append(&path("/users/0/comments"), value!({"text": "x"})).unwrap();
    store.put(&path("/users/0"), value!({})).unwrap();

    assert!(created.borrow().is_empty());
}

#[test]
fn only_the_first_matching_slot_fires() {
    let store = users();
    let order = Rc::new(RefCell::new(Vec::new()));
    for (pattern, label) in [("/users/0/name", "exact"), ("/users/.*", "wide"), ("/.*", "all")] {
        let order = Rc::clone(&order);
        store
            .subscribe_replace(pattern, move |_| order.borrow_mut().push(label))
            .unwrap();
    }
    store.put(&path("/users/0/name"), "x").unwrap();
    assert_eq!(*order.borrow(), vec!["exact"]);

    store.put(&path("/users/1/name"), "y").unwrap();
    assert_eq!(*order.borrow(), vec!["exact", "wide"]);
}

#[test]
fn catch_all_registered_later_stays_quiet_for_a_covered_path() {
    let store = users();
    let specific = log();
    let catch_all = log();
    store
        .subscribe_create("/users/.*/comments", recorder(&specific))
        .unwrap();
    store.subscribe_create("/.*", recorder(&catch_all)).unwrap();

    store.append(&path("/users/0/comments"), "hi").unwrap();

    assert_eq!(*specific.borrow(), vec![Value::from("hi")]);
    assert!(catch_all.borrow().is_empty());
}

#[test]
fn re_registering_a_pattern_overwrites_the_slot() {
    let store = users();
    let first = log();
    let second = log();
    store.subscribe_replace("/users/.*/name", recorder(&first)).unwrap();
    store.subscribe_replace("/users/.*/name", recorder(&second)).unwrap();

    store.put(&path("/users/1/name"), "Bia").unwrap();

    assert!(first.borrow().is_empty());
    assert_eq!(*second.borrow(), vec![value!("Bia")]);

    assert!(store.unsubscribe_pattern(MutationKind::Replace, "/users/.*/name"));
    store.put(&path("/users/1/name"), "Bianca").unwrap();
    assert_eq!(second.borrow().len(), 1);
}

#[test]
fn invalid_pattern_is_rejected() {
    let store = users();
    let err = store.subscribe_create("/users/(", |_| {}).unwrap_err();
    assert!(matches!(err, StoreError::InvalidPattern { ref pattern, .. } if pattern == "/users/("));
}

#[test]
fn snapshot_listeners_see_every_commit_in_order() {
    let store = users();
    let snapshots = log();
    let first = store.subscribe(recorder(&snapshots));
    let order = Rc::new(RefCell::new(Vec::new()));
    let tail = Rc::clone(&order);
    let second = store.subscribe(move |_| tail.borrow_mut().push("second"));

    store.put(&path("/users/0/name"), "A").unwrap();
    store.append(&path("/users/0/comments"), value!("c")).unwrap();

    assert_eq!(snapshots.borrow().len(), 2);
    assert_eq!(snapshots.borrow()[1], store.snapshot());
    assert_eq!(order.borrow().len(), 2);

    assert!(first.unsubscribe());
    store.put(&path("/users/0/name"), "B").unwrap();
    assert_eq!(snapshots.borrow().len(), 2);
    assert_eq!(order.borrow().len(), 3);
    assert!(second.unsubscribe());
}

#[test]
fn snapshot_listeners_run_before_pattern_subscribers() {
    let store = users();
    let order = Rc::new(RefCell::new(Vec::new()));
    let a = Rc::clone(&order);
    store
        .subscribe_replace("/users/0/name", move |_| a.borrow_mut().push("pattern"))
        .unwrap();
    let b = Rc::clone(&order);
    let _sub = store.subscribe(move |_| b.borrow_mut().push("snapshot"));

    store.put(&path("/users/0/name"), "x").unwrap();
    assert_eq!(*order.borrow(), vec!["snapshot", "pattern"]);
}

#[test]
fn listener_panic_keeps_the_new_snapshot() {
    let store = users();
    let _sub = store.subscribe(|_| panic!("listener failure"));

    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        store.put(&path("/users/0/name"), "Borges")
    }));

    assert!(result.is_err());
    assert_eq!(store.get_ptr("/users/0/name").unwrap(), value!("Borges"));
}
