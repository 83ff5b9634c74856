use super::*;

#[derive(Debug, Clone, PartialEq)]
enum Page {
    Home,
    Board(i64),
    Pin(i64, String),
    File(String),
}

fn router() -> Router<Page> {
    let mut router = Router::new();
    router
        .add("home", "/", Page::Home)
        .unwrap()
        .add_method("pin", "/boards/{int}/pins/{str}", 2, |p| {
            Page::Pin(p[0].as_int().unwrap_or_default(), p[1].to_string())
        })
        .unwrap()
        .add_method("board", "/boards/{int}", 1, |p| {
            Page::Board(p[0].as_int().unwrap_or_default())
        })
        .unwrap()
        .add_pattern("file", r"/files/(.+)", Page::File(String::new()))
        .unwrap();
    router
}

#[test]
fn resolves_value_and_method_routes() {
    let router = router();

    let home = router.resolve("/").unwrap();
    assert_eq!(home.name, "home");
    assert_eq!(home.target, Page::Home);
    assert!(home.params.is_empty());

    let board = router.resolve("/boards/3").unwrap();
    assert_eq!(board.target, Page::Board(3));
    assert_eq!(board.params, vec![Param::Int(3)]);

    let pin = router.resolve("/boards/3/pins/d13").unwrap();
    assert_eq!(pin.target, Page::Pin(3, "d13".to_string()));
}

#[test]
fn non_integer_skips_the_route() {
    let mut router = router();
    router
        .add("board-by-name", "/boards/{str}", Page::Home)
        .unwrap();

    let resolved = router.resolve("/boards/uno").unwrap();
    assert_eq!(resolved.name, "board-by-name");
    assert_eq!(resolved.params, vec![Param::Str("uno".to_string())]);
    assert!(router.resolve("/nowhere").is_none());
}

#[test]
fn raw_pattern_routes_resolve_with_string_params() {
    let resolved = router().resolve("/files/src/main.py").unwrap();
    assert_eq!(resolved.name, "file");
    assert_eq!(resolved.params, vec![Param::from("src/main.py")]);
}

#[test]
fn reverse_substitutes_params() {
    let router = router();
    assert_eq!(router.reverse("home", &[]).unwrap(), "/");
    assert_eq!(
        router
            .reverse("pin", &[Param::Int(7), Param::from("a0")])
            .unwrap(),
        "/boards/7/pins/a0"
    );
    assert_eq!(
        router.reverse("board", &[Param::from("12")]).unwrap(),
        "/boards/12"
    );
}

#[test]
fn reverse_errors() {
    let router = router();
    assert_eq!(
        router.reverse("missing", &[]),
        Err(RouterError::UnknownRoute("missing".to_string()))
    );
    assert_eq!(
        router.reverse("pin", &[Param::Int(1)]),
        Err(RouterError::MissingParams {
            route: "pin".to_string(),
            expected: 2,
            given: 1,
        })
    );
    assert_eq!(
        router.reverse("file", &[Param::from("a")]),
        Err(RouterError::Irreversible("file".to_string()))
    );
    assert!(matches!(
        router.reverse("board", &[Param::from("uno")]),
        Err(RouterError::InvalidParam { index: 0, .. })
    ));
    assert!(matches!(
        router.reverse("pin", &[Param::Int(1), Param::from("a/b")]),
        Err(RouterError::InvalidParam { index: 1, .. })
    ));
}

#[test]
fn reversed_path_resolves_back() {
    let router = router();
    let path = router
        .reverse("pin", &[Param::Int(4), Param::from("led")])
        .unwrap();
    assert_eq!(router.resolve(&path).unwrap().target, Page::Pin(4, "led".to_string()));
}

#[test]
fn duplicate_names_are_rejected() {
    let mut router = router();
    assert_eq!(
        router.add("home", "/other", Page::Home).err(),
        Some(RouterError::DuplicateRoute("home".to_string()))
    );
    assert_eq!(router.len(), 4);
}

#[test]
fn method_arity_is_checked_against_the_path() {
    let mut router: Router<Page> = Router::new();
    let err = router
        .add_method("board", "/boards/{int}", 2, |_| Page::Home)
        .err();
    assert_eq!(
        err,
        Some(RouterError::ArityMismatch {
            route: "board".to_string(),
            arity: 2,
            available: 1,
        })
    );
    assert!(router.is_empty());
}

#[test]
fn method_receives_only_its_arity() {
    let mut router: Router<usize> = Router::new();
    router
        .add_method("count", "/{str}/{str}/{int}", 1, |p| p.len())
        .unwrap();
    assert_eq!(router.resolve("/a/b/3").unwrap().target, 1);
}
