use fudge::{Error, Fake, FakeConfig, Object, Value, CONSTRUCTOR};

#[test]
fn not_callable_by_default() {
    let remove = Object::new();
    Fake::wrap("os.remove", &remove);

    assert_eq!(
        remove.call(("/tmp",)).unwrap_err(),
        Error::NotCallable {
            target: "fake:os.remove".to_string()
        }
    );
}

#[test]
fn callable_config() {
    let remove = Object::new();
    let fake = Fake::builder("os.remove")
        .config(FakeConfig {
            object: Some(remove.clone()),
            callable: true,
            ..FakeConfig::default()
        })
        .build()
        .unwrap()
        .with_args(("/tmp/file",))
        .returns(true);

    assert_eq!(remove.call(("/tmp/file",)).unwrap(), Value::Bool(true));
    assert!(remove.call(("/etc/passwd",)).is_err());
    assert!(fake.stub().was_called());
}

#[test]
fn expects_call() {
    let remove = Object::new();
    Fake::wrap("os.remove", &remove)
        .expects_call()
        .with_arg_count(1);

    assert_eq!(
        fudge::verify().unwrap_err().to_string(),
        "fake:os.remove() was not called"
    );
    remove.call(("/tmp",)).unwrap();
    fudge::verify().unwrap();
}

#[test]
fn nested_callable_member() {
    let os = Object::new();
    let remove = Object::new();
    os.set("remove", remove.clone());
    Fake::wrap("os.remove", &remove).is_callable().returns("gone");

    assert_eq!(os.invoke("remove", ("/tmp",)).unwrap(), Value::from("gone"));
}

#[test]
fn constructor() {
    let user_type = Object::new();
    let fake = Fake::wrap("User", &user_type);
    fake.expects(CONSTRUCTOR).with_args(("Harry",));
    fake.provides("greet").returns("Hello, Harry");

    let harry = user_type.call(("Harry",)).unwrap();
    assert!(harry.as_object().unwrap().ptr_eq(&user_type));
    assert_eq!(harry.invoke("greet", ()).unwrap(), Value::from("Hello, Harry"));
    fudge::verify().unwrap();
}

#[test]
fn constructor_checks_its_arguments() {
    let user_type = Object::new();
    Fake::wrap("User", &user_type)
        .provides(CONSTRUCTOR)
        .with_args(("Harry",));

    assert_eq!(
        user_type.call(("Ron",)).unwrap_err().to_string(),
        "fake:User.new('Harry') was called unexpectedly with args ('Ron')"
    );
}

#[test]
fn replacement_function() {
    let hello = Object::new();
    Fake::builder("hello")
        .object(&hello)
        .callable(true)
        .build()
        .unwrap()
        .calls(|args| Ok(format!("Why, hello there {} time(s)", args.len()).into()));

    assert_eq!(
        hello.call((1, 2)).unwrap(),
        Value::from("Why, hello there 2 time(s)")
    );
}
