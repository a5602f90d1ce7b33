use restore::{value, ImmutableStore, Mutator, Node, Path, StoreError, StoreOptions};

fn same(a: &Node, b: &Node) -> bool {
    Node::ptr_eq(a, b)
}

#[test]
fn node_is_stable_without_mutations() {
    let store = ImmutableStore::new(value!({"state": {"user": {"name": "Diego"}}}));
    let a = store.node_at("/state/user").unwrap();
    let b = store.node_at("/state/user").unwrap();
    let c = store.root().child("state").unwrap().child("user").unwrap();
    assert!(same(&a, &b));
    assert!(same(&a, &c));
    assert!(same(&store.root(), &store.root()));
}

#[test]
fn leaves_untouched_nodes_alone_in_objects() {
    let store = ImmutableStore::new(value!({
        "state": {"user": {"name": "Diego", "comments": [{"text": "Sweet!"}]}}
    }));
    let root = store.root();
    let state = root.child("state").unwrap();
    let user = state.child("user").unwrap();
    let comments = user.child("comments").unwrap();

    user.child("name").unwrap().set("Borges").unwrap();

    let root_after = store.root();
    assert!(!same(&root, &root_after));
    assert!(!same(&state, &root_after.child("state").unwrap()));
    let user_after = store.node_at("/state/user").unwrap();
    assert!(!same(&user, &user_after));
    assert!(same(&comments, &user_after.child("comments").unwrap()));
    assert_eq!(store.get_ptr("/state/user/name").unwrap(), value!("Borges"));
}

#[test]
fn leaves_untouched_nodes_alone_in_arrays() {
    let store = ImmutableStore::new(value!({
        "state": {"users": [
            {"name": "Diego", "comments": [{"text": "sweet!"}]},
            {"name": "Bianca"}
        ]}
    }));
    let state = store.node_at("/state").unwrap();
    let users = store.node_at("/state/users").unwrap();
    let diego = store.node_at("/state/users/0").unwrap();
    let bianca = store.node_at("/state/users/1").unwrap();
    let diego_comments = store.node_at("/state/users/0/comments").unwrap();

    store
        .put(&Path::parse("/state/users/0/name").unwrap(), "Borges")
        .unwrap();

    assert!(!same(&state, &store.node_at("/state").unwrap()));
    assert!(!same(&users, &store.node_at("/state/users").unwrap()));
    assert!(!same(&diego, &store.node_at("/state/users/0").unwrap()));
    assert!(same(
        &diego_comments,
        &store.node_at("/state/users/0/comments").unwrap()
    ));
    assert!(same(&bianca, &store.node_at("/state/users/1").unwrap()));
}

#[test]
fn mutating_a_node_replaces_it_and_its_descendants() {
    let store = ImmutableStore::new(value!({"a": {"b": {"c": 1}}, "x": 1}));
    let b = store.node_at("/a/b").unwrap();
    let c = store.node_at("/a/b/c").unwrap();
    let x = store.node_at("/x").unwrap();

    b.merge(value!({"d": 2})).unwrap();

    assert!(!same(&b, &store.node_at("/a/b").unwrap()));
    assert!(!same(&c, &store.node_at("/a/b/c").unwrap()));
    assert!(same(&x, &store.node_at("/x").unwrap()));
}

#[test]
fn old_handles_keep_working() {
    let store = ImmutableStore::new(value!({"user": {"name": "Diego"}}));
    let user = store.node_at("/user").unwrap();
    user.child("name").unwrap().set("Bianca").unwrap();

    // The stale handle still reads and writes through the store.
    assert_eq!(user.value().unwrap(), value!({"name": "Bianca"}));
    user.merge(value!({"age": 24})).unwrap();
    assert_eq!(store.get_ptr("/user/age").unwrap(), value!(24));
}

#[test]
fn node_kind_follows_the_current_value() {
    let store = ImmutableStore::new(value!({"slot": 1}));
    let scalar = store.node_at("/slot").unwrap();
    assert!(scalar.as_value().is_some());

    scalar.set(value!([1, 2])).unwrap();
    let list = store.node_at("/slot").unwrap();
    assert_eq!(list.as_array().map(|a| a.len()), Some(2));
}

#[test]
fn navigating_a_missing_path_fails() {
    let store = ImmutableStore::new(value!({"users": []}));
    let err = store.node_at("/users/0").unwrap_err();
    assert!(matches!(err, StoreError::PathNotFound { ref path } if path == "/users/0"));
    assert!(store.root().child("people").is_err());
}

#[test]
fn disabled_cache_builds_fresh_nodes() {
    let options = StoreOptions {
        cache_nodes: false,
        ..StoreOptions::default()
    };
    let store = ImmutableStore::with_options(value!({"a": 1}), options);
    let a = store.node_at("/a").unwrap();
    assert!(!same(&a, &store.node_at("/a").unwrap()));
    assert_eq!(a.value().unwrap(), value!(1));
}

#[test]
fn cursor_and_node_agree() {
    let store = ImmutableStore::new(value!({"users": [{"name": "Diego"}]}));
    let cursor = store.at("users").at(0);
    let from_cursor = cursor.node().unwrap();
    let from_path = store.node(cursor.path()).unwrap();
    assert!(same(&from_cursor, &from_path));
    assert_eq!(Mutator::path(&from_cursor).as_str(), "/users/0");
}
