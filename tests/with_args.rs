use fudge::{args, object, ArgKind, Error, Fake, Object, Value};

fn session() -> (Object, Fake) {
    let object = Object::new();
    let fake = Fake::wrap("session", &object);
    (object, fake)
}

#[test]
fn composite_arguments_match_structurally() {
    let (session, fake) = session();
    fake.expects("add").with_args(("x", object! { "n" => 1 }));

    session.invoke("add", ("x", object! { "n" => 1 })).unwrap();

    let error = session
        .invoke("add", ("x", object! { "n" => 2 }))
        .unwrap_err();
    assert!(matches!(error, Error::UnexpectedCall { .. }));
    assert_eq!(
        error.to_string(),
        "fake:session.add('x', {'n': 1}) was called unexpectedly with args ('x', {'n': 2})"
    );
    fudge::verify().unwrap();
}

#[test]
fn extra_keys_do_not_match() {
    let (session, fake) = session();
    fake.provides("add").with_args((object! { "n" => 1 },));

    assert!(session
        .invoke("add", (object! { "n" => 1, "m" => 2 },))
        .is_err());
}

#[test]
fn json_arguments() {
    let (session, fake) = session();
    fake.expects("insert").with_args((
        "users",
        serde_json::json!({ "name": "joe", "roles": ["admin"] }),
    ));

    let row = object! { "roles" => vec!["admin"], "name" => "joe" };
    session.invoke("insert", ("users", row)).unwrap();
    fudge::verify().unwrap();
}

#[test]
fn keyword_arguments() {
    let (counter, fake) = session();
    fake.expects("increment").with_args(args!(25; table = "hits"));

    assert!(counter.invoke("increment", args!(25)).is_err());
    counter
        .invoke("increment", args!(25; table = "hits"))
        .unwrap();
    fudge::verify().unwrap();
}

#[test]
fn argument_counts() {
    let (auth, fake) = session();
    fake.provides("login")
        .with_arg_count(2)
        .with_kwarg_count(1);

    auth.invoke("login", args!("joe", "pw"; remember = true))
        .unwrap();
    assert_eq!(
        auth.invoke("login", args!("joe"; remember = true))
            .unwrap_err(),
        Error::ArityMismatch {
            call: "fake:session.login()".to_string(),
            kind: ArgKind::Positional,
            actual: 1,
            expected: 2,
        }
    );
    assert!(matches!(
        auth.invoke("login", ("joe", "pw")),
        Err(Error::ArityMismatch {
            kind: ArgKind::Keyword,
            ..
        })
    ));
}

#[test]
fn strict_scalar_types() {
    let (session, fake) = session();
    fake.provides("seek").with_args((1,));

    assert!(session.invoke("seek", (1.0,)).is_err());
    assert!(session.invoke("seek", ("1",)).is_err());
    assert_eq!(session.invoke("seek", (1,)).unwrap(), Value::Null);
}

#[test]
fn function_arguments_match_by_identity() {
    let (events, fake) = session();
    let handler = fudge::Function::new(|_| Ok(Value::Null));
    fake.provides("subscribe").with_args(("click", handler.clone()));

    events.invoke("subscribe", ("click", handler)).unwrap();
    let other = fudge::Function::new(|_| Ok(Value::Null));
    assert!(events.invoke("subscribe", ("click", other)).is_err());
}

#[test]
fn last_with_args_wins() {
    let (counter, fake) = session();
    fake.provides("increment")
        .with_args(args!(25; table = "hits"))
        .with_args((25,));

    assert_eq!(counter.invoke("increment", (25,)).unwrap(), Value::Null);
}

#[test]
fn keyword_mismatch_names_the_keywords() {
    let (counter, fake) = session();
    fake.provides("increment").with_args(args!(25; table = "hits"));

    let error = counter
        .invoke("increment", args!(25; table = "clicks"))
        .unwrap_err();
    assert!(error.is_assertion());
    assert_eq!(
        error.to_string(),
        "fake:session.increment(25, table='hits') was called unexpectedly with keyword args table='clicks'"
    );
}

#[test]
fn self_referencing_argument_is_reported() {
    let (tree, fake) = session();
    fake.provides("visit").with_args(("root",));

    let node = object! { "name" => "leaf" };
    node.set("parent", node.clone());

    let error = tree.invoke("visit", (node,)).unwrap_err();
    assert_eq!(
        error,
        Error::UnexpectedCall {
            call: "fake:session.visit('root')".to_string(),
            actual: "({'name': 'leaf', 'parent': {...}})".to_string(),
        }
    );
}

#[test]
fn self_referencing_arguments_of_the_same_shape_match() {
    let (tree, fake) = session();
    let expected = object! { "name" => "leaf" };
    expected.set("parent", expected.clone());
    fake.provides("visit").with_args((expected,));

    let node = object! { "name" => "leaf" };
    node.set("parent", node.clone());
    tree.invoke("visit", (node,)).unwrap();
}
