use fudge::{Error, Fake, Object, Registry, Value};

// the code under test only ever sees an `Object`
fn run_service(svc: &Object) -> fudge::Result<Value> {
    svc.invoke("run", ())
}

#[test]
fn expected_call_returns_value() {
    let svc = Object::new();
    Fake::wrap("svc", &svc).expects("run").returns(42);

    assert_eq!(run_service(&svc).unwrap(), Value::Int(42));
    fudge::verify().unwrap();
}

#[test]
fn expected_call_never_made() {
    let svc = Object::new();
    Fake::wrap("svc", &svc).expects("run");

    let error = fudge::verify().unwrap_err();
    assert!(error.is_assertion());
    assert!(matches!(error, Error::NotCalled { .. }));

    let message = error.to_string();
    assert!(message.contains("svc"), "{}", message);
    assert!(message.contains("run"), "{}", message);
}

#[test]
fn provided_call_may_be_skipped() {
    let svc = Object::new();
    Fake::wrap("svc", &svc).provides("run").returns("ok");

    fudge::verify().unwrap();
    assert_eq!(run_service(&svc).unwrap(), Value::from("ok"));
    assert_eq!(run_service(&svc).unwrap(), Value::from("ok"));
}

#[test]
fn undeclared_member() {
    let svc = Object::new();
    Fake::wrap("svc", &svc).provides("stop");

    let error = run_service(&svc).unwrap_err();
    assert_eq!(
        error,
        Error::UndeclaredCall {
            target: "fake:svc".to_string(),
            name: "run".to_string(),
        }
    );
    assert!(!error.is_assertion());
}

#[test]
fn state_does_not_leak_between_runs() {
    let svc = Object::new();

    // first run
    fudge::clear_all();
    let fake = Fake::wrap("svc", &svc);
    fake.expects("run");
    run_service(&svc).unwrap();
    fudge::verify().unwrap();

    // second run declares the same expectation again but never calls it
    fudge::clear_all();
    fake.expects("run");
    assert!(fudge::verify().is_err());
}

#[test]
fn verify_resets_was_called() {
    let svc = Object::new();
    Fake::wrap("svc", &svc).expects("run");

    run_service(&svc).unwrap();
    fudge::verify().unwrap();
    assert!(fudge::verify().is_err(), "second verify should need a new call");
}

#[test]
fn named_fakes_live_in_globals() {
    let fake = Fake::new("services.mailer").unwrap();
    fake.expects("send").with_arg_count(1);

    let services = fudge::namespace::globals().get("services").unwrap();
    let mailer = services.as_object().unwrap().member("mailer").unwrap();
    mailer.invoke("send", ("hello",)).unwrap();
    fudge::verify().unwrap();
}

#[test]
fn separate_registries_are_independent() {
    let registry = Registry::new();
    let svc = Object::new();
    Fake::builder("svc")
        .object(&svc)
        .registry(&registry)
        .build()
        .unwrap()
        .expects("run");

    assert!(fudge::registry().is_empty());
    assert!(registry.verify().is_err());
    run_service(&svc).unwrap();
    assert!(registry.verify().is_ok());
}

#[test]
fn attributes_and_calls_mix() {
    let user = Object::new();
    Fake::wrap("user", &user)
        .has_attr("name", "Harry")
        .provides("greet")
        .calls(|args| {
            let whom = args.get(0).and_then(Value::as_str).unwrap_or("nobody");
            Ok(format!("hi {}", whom).into())
        });

    assert_eq!(user.get("name"), Some(Value::from("Harry")));
    assert_eq!(
        user.invoke("greet", ("Ron",)).unwrap(),
        Value::from("hi Ron")
    );
    assert!(matches!(
        user.invoke("name", ()),
        Err(Error::NotCallable { .. })
    ));
}
