use fudge::{namespace, Fake, Object, Value};

#[fudge::with_fakes]
fn calls_declared_member() -> Value {
    let counter = Object::new();
    Fake::wrap("counter", &counter)
        .expects("increment")
        .returns(1);

    counter.invoke("increment", ()).unwrap()
}

#[test]
fn with_fakes_returns_body_value() {
    assert_eq!(calls_declared_member(), Value::Int(1));
    fudge::clear_expectations();
}

#[fudge::with_fakes]
fn forgets_to_call() {
    let counter = Object::new();
    Fake::wrap("counter", &counter).expects("increment");
}

#[test]
#[should_panic(expected = "fake:counter.increment() was not called")]
fn with_fakes_panics_on_missing_call() {
    forgets_to_call();
}

#[fudge::with_fakes(clear_expectations)]
fn returns_early(stop: bool) -> Option<i64> {
    let db = Object::new();
    Fake::wrap("db", &db).expects("connect");
    db.invoke("connect", ()).unwrap();
    if stop {
        return None;
    }
    Some(3)
}

#[test]
fn with_fakes_verifies_after_early_return() {
    assert_eq!(returns_early(true), None);
    assert_eq!(returns_early(false), Some(3));
    fudge::clear_expectations();
}

#[test]
fn with_fakes_can_clear_stale_expectations() {
    #[fudge::with_fakes(clear_expectations)]
    fn fresh_start() {}

    let stale = Object::new();
    Fake::wrap("stale", &stale).expects("never");
    fresh_start();
    assert!(fudge::registry().is_empty());
}

#[fudge::patch("os.remove")]
fn removes_file(remove: Fake) {
    remove.expects_call().with_args(("/tmp/file",));

    let os = namespace::globals().get("os").unwrap();
    os.invoke("remove", ("/tmp/file",)).unwrap();
}

#[test]
fn patch_binds_fakes_and_restores() {
    let os = Object::new();
    os.set("sep", "/");
    namespace::globals().set("os", os.clone());

    removes_file();
    assert!(!os.contains("remove"));
    assert_eq!(os.get("sep"), Some(Value::from("/")));
    assert!(fudge::registry().is_empty());
}

#[fudge::patch("fs.remove", "fs.rmtree")]
fn removes_nothing(remove: Fake, _rmtree: fudge::Fake) {
    remove.expects_call();
}

#[test]
#[should_panic(expected = "fake:fs.remove() was not called")]
fn patch_panics_on_missing_call() {
    namespace::globals().set("fs", Object::new());
    removes_nothing();
}

#[test]
fn patch_restores_after_panic() {
    #[fudge::patch("net.connect")]
    fn explodes(connect: Fake) {
        connect.is_callable();
        panic!("boom");
    }

    let net = Object::new();
    net.set("connect", "real");
    namespace::globals().set("net", net.clone());

    assert!(std::panic::catch_unwind(explodes).is_err());
    assert_eq!(net.get("connect"), Some(Value::from("real")));
}
