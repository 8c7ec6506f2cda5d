use std::cell::RefCell;

use serde_json::json;
use twa_bridge::{
    location::SearchParams,
    parsing::{json, parse, search_params, Fields, JsonObject, Schema},
    ParseError,
};

#[derive(Debug, PartialEq)]
struct Profile {
    id: i64,
    name: String,
    premium: Option<bool>,
    accent: Option<String>,
    score: f64,
}

impl Schema<JsonObject> for Profile {
    fn from_fields(f: &Fields<'_, JsonObject>) -> Result<Self, ParseError> {
        Ok(Profile {
            id: f.field("id", json::int)?,
            name: f.field("first_name", json::string)?,
            premium: f.field("is_premium", json::opt_boolean)?,
            accent: f.field("accent_color", json::opt_rgb)?,
            score: f.field("score", json::number)?,
        })
    }
}

#[test]
fn well_formed_source_maps_every_field() {
    let profile: Profile = json::parse_struct(&json!({
        "id": 7,
        "first_name": "Ada",
        "is_premium": true,
        "accent_color": "#ABC",
        "score": 1.5,
    }))
    .expect("parse");

    assert_eq!(
        profile,
        Profile {
            id: 7,
            name: "Ada".into(),
            premium: Some(true),
            accent: Some("#aabbcc".into()),
            score: 1.5,
        }
    );
}

#[test]
fn absent_optional_fields_stay_absent() {
    let profile: Profile =
        json::parse_struct(&json!({ "id": 1, "first_name": "A", "score": 0 })).expect("parse");
    assert_eq!(profile.premium, None);
    assert_eq!(profile.accent, None);
}

#[test]
fn json_null_counts_as_absent_for_optional_fields() {
    let profile: Profile = json::parse_struct(&json!({
        "id": 1,
        "first_name": "A",
        "is_premium": null,
        "score": 2,
    }))
    .expect("parse");
    assert_eq!(profile.premium, None);
}

#[test]
fn missing_required_field_names_the_key() {
    let err = json::parse_struct::<Profile>(&json!({ "id": 1, "score": 0 })).unwrap_err();
    assert_eq!(err.field_key(), Some("first_name"));
    assert!(matches!(err.root_cause(), ParseError::TypeMismatch { expected: "string", .. }));
}

#[test]
fn wrong_type_is_a_mismatch_not_a_default() {
    let err =
        json::parse_struct::<Profile>(&json!({ "id": "7", "first_name": "A", "score": 0 }))
            .unwrap_err();
    assert_eq!(err.field_key(), Some("id"));
    assert!(matches!(err.root_cause(), ParseError::TypeMismatch { expected: "int", .. }));
}

#[test]
fn present_but_invalid_optional_field_fails() {
    let err = json::parse_struct::<Profile>(&json!({
        "id": 1,
        "first_name": "A",
        "accent_color": "blue",
        "score": 0,
    }))
    .unwrap_err();
    assert_eq!(err.field_key(), Some("accent_color"));
}

#[test]
fn non_object_sources_are_rejected() {
    let err = json::parse_struct::<Profile>(&json!([1, 2, 3])).unwrap_err();
    assert!(matches!(err, ParseError::InvalidShape { found: "array" }));

    let err = json::parse_struct_str::<Profile>("{not json").unwrap_err();
    assert!(matches!(err, ParseError::MalformedInput(_)));
}

/// Records every field it hands out, so a test can observe how far a parse got.
struct Traced<'a> {
    assigned: &'a RefCell<Vec<&'static str>>,
}

#[derive(Debug)]
struct Triple {
    a: i64,
    b: i64,
    c: i64,
}

impl Triple {
    fn parse(query: &str, trace: &Traced<'_>) -> Result<Triple, ParseError> {
        let params = SearchParams::parse(query);
        let f = Fields::new(&params);
        let take = |key: &'static str| {
            let value = f.field(key, search_params::int)?;
            trace.assigned.borrow_mut().push(key);
            Ok::<_, ParseError>(value)
        };
        let (a, b, c) = (take("a")?, take("b")?, take("c")?);
        Ok(Triple { a, b, c })
    }
}

#[test]
fn one_bad_field_aborts_the_whole_record() {
    let assigned = RefCell::new(Vec::new());
    let trace = Traced { assigned: &assigned };

    let result = Triple::parse("a=1&b=oops&c=3", &trace);
    let err = result.expect_err("b is not an int");
    assert_eq!(err.field_key(), Some("b"));
    // Only the field before the failure was read; no record came out.
    assert_eq!(*assigned.borrow(), vec!["a"]);

    let ok = Triple::parse("a=1&b=2&c=3", &trace).expect("valid");
    assert_eq!((ok.a, ok.b, ok.c), (1, 2, 3));
}

#[derive(Debug, PartialEq)]
struct Launch {
    version: String,
    count: Option<i64>,
    profile: Option<Profile>,
}

impl Schema<SearchParams> for Launch {
    fn from_fields(f: &Fields<'_, SearchParams>) -> Result<Self, ParseError> {
        Ok(Launch {
            version: f.field("v", search_params::string)?,
            count: f.field("n", search_params::opt_int)?,
            profile: f.field("p", search_params::opt_json_struct)?,
        })
    }
}

#[test]
fn query_sources_share_the_engine() {
    let launch: Launch = search_params::parse_query(
        "v=6.1&p=%7B%22id%22%3A2%2C%22first_name%22%3A%22B%22%2C%22score%22%3A3%7D",
    )
    .expect("parse");
    assert_eq!(launch.version, "6.1");
    assert_eq!(launch.count, None);
    assert_eq!(launch.profile.map(|p| p.id), Some(2));
}

#[test]
fn nested_failures_keep_the_outer_key() {
    let err = search_params::parse_query::<Launch>("v=6.1&p=%7B%22id%22%3A2%7D").unwrap_err();
    assert_eq!(err.field_key(), Some("p"));
    match &err {
        ParseError::Field { cause, .. } => assert_eq!(cause.field_key(), Some("first_name")),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn query_integers_are_strict() {
    let err = search_params::parse_query::<Launch>("v=1&n=12px").unwrap_err();
    assert_eq!(err.field_key(), Some("n"));

    let ok: Launch = parse(&SearchParams::parse("v=1&n=%2012%20")).expect("trimmed int");
    assert_eq!(ok.count, Some(12));
}
