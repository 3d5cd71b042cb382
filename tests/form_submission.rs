//! End-to-end behaviour of `Form<T>`: construction, editing through
//! actions, and submission.

use std::collections::{BTreeSet, HashMap};

use pretty_assertions::assert_eq;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tickform::core::classify::AnnotationKind;
use tickform::core::config::WidgetChoice;
use tickform::core::widget::{TextEntry, TextKind, Widget};
use tickform::{
    Action, FieldPath, Form, FormConfig, FormError, Submission, WidgetKey, WidgetRegistry,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
struct Person {
    name: String,
    #[serde(default)]
    age: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
struct Address {
    street: String,
    city: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
enum Role {
    Admin,
    Member,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
struct Email {
    address: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
struct Phone {
    number: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
enum Contact {
    Email(Email),
    Phone(Phone),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
struct Account {
    owner: Person,
    role: Role,
    contact: Contact,
    addresses: Vec<Address>,
    nickname: Option<String>,
    #[serde(default)]
    active: bool,
}

fn sample_account() -> Account {
    Account {
        owner: Person {
            name: "Ann".into(),
            age: 41,
        },
        role: Role::Member,
        contact: Contact::Email(Email {
            address: "ann@example.com".into(),
        }),
        addresses: vec![
            Address {
                street: "1 Main St".into(),
                city: "Springfield".into(),
            },
            Address {
                street: "2 Side St".into(),
                city: "Shelbyville".into(),
            },
        ],
        nickname: Some("annie".into()),
        active: true,
    }
}

fn path(s: &str) -> FieldPath {
    FieldPath::parse(s)
}

fn type_text<T: tickform::Model>(form: &mut Form<T>, at: &str, text: &str) {
    for ch in text.chars() {
        form.apply(Action::InsertChar { path: path(at), ch });
    }
}

fn error_fields(submission: Submission<impl std::fmt::Debug>) -> BTreeSet<FieldPath> {
    match submission {
        Submission::Rejected(errors) => errors.fields(),
        other => panic!("expected rejection, got {other:?}"),
    }
}

#[test]
fn test_required_name_then_accept() {
    let mut form = Form::<Person>::new(FormConfig::default()).unwrap();
    assert_eq!(form.session().document(), json!({ "age": 0 }));

    assert_eq!(error_fields(form.submit()), BTreeSet::from([path("name")]));

    type_text(&mut form, "name", "Ann");
    assert_eq!(
        form.submit(),
        Submission::Accepted(Person {
            name: "Ann".into(),
            age: 0
        })
    );
}

#[test]
fn test_edit_and_submit_unchanged_round_trips() {
    let account = sample_account();
    let mut form = Form::edit(&account, FormConfig::default()).unwrap();
    assert_eq!(
        form.session().document(),
        serde_json::to_value(&account).unwrap()
    );
    assert_eq!(form.submit(), Submission::Accepted(account));
}

#[test]
fn test_switching_variant_keeps_siblings() {
    let account = sample_account();
    let mut form = Form::edit(&account, FormConfig::default()).unwrap();

    form.apply(Action::Select {
        path: path("contact"),
        index: 1,
    });
    assert!(form.session().find(&path("contact.Email")).is_none());
    type_text(&mut form, "contact.Phone.number", "555-0100");

    let Submission::Accepted(edited) = form.submit() else {
        panic!("edited account should validate");
    };
    assert_eq!(
        edited.contact,
        Contact::Phone(Phone {
            number: "555-0100".into()
        })
    );
    assert_eq!(edited.owner, account.owner);
    assert_eq!(edited.addresses, account.addresses);
    assert_eq!(edited.nickname, account.nickname);
}

#[test]
fn test_error_set_covers_exactly_invalid_fields() {
    let mut form = Form::<Account>::new(FormConfig::default()).unwrap();
    form.apply(Action::AddEntry(path("addresses")));
    type_text(&mut form, "addresses[0].street", "1 Main St");
    type_text(&mut form, "owner.name", "Ann");
    form.apply(Action::Clear(path("owner.age")));
    type_text(&mut form, "owner.age", "forty");

    assert_eq!(
        error_fields(form.submit()),
        BTreeSet::from([
            path("owner.age"),
            path("role"),
            path("contact"),
            path("addresses[0].city"),
        ])
    );
    // Untouched valid fields carry no error.
    let name = form.session().find(&path("owner.name")).unwrap();
    assert!(name.errors.is_empty());
}

#[test]
fn test_collection_entries_added_and_removed() {
    let account = sample_account();
    let mut form = Form::edit(&account, FormConfig::default()).unwrap();

    form.apply(Action::RemoveEntry {
        path: path("addresses"),
        index: 0,
    });
    form.apply(Action::AddEntry(path("addresses")));
    type_text(&mut form, "addresses[1].street", "3 New Rd");
    type_text(&mut form, "addresses[1].city", "Capital City");

    let Submission::Accepted(edited) = form.submit() else {
        panic!("edited account should validate");
    };
    let streets: Vec<_> = edited.addresses.iter().map(|a| a.street.as_str()).collect();
    assert_eq!(streets, vec!["2 Side St", "3 New Rd"]);
}

#[test]
fn test_optional_field_can_be_cleared() {
    let account = sample_account();
    let mut form = Form::edit(&account, FormConfig::default()).unwrap();
    form.apply(Action::Clear(path("nickname")));

    let Submission::Accepted(edited) = form.submit() else {
        panic!("clearing an optional field should validate");
    };
    assert_eq!(edited.nickname, None);
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
struct Inventory {
    name: String,
    counts: HashMap<String, u32>,
}

#[test]
fn test_unsupported_annotation_names_field() {
    let err = Form::<Inventory>::new(FormConfig::default()).unwrap_err();
    match err {
        FormError::UnsupportedAnnotation { field, annotation } => {
            assert_eq!(field, path("counts"));
            assert!(annotation.contains("additionalProperties"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
struct Labels(HashMap<String, String>);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
struct Deployment {
    name: String,
    labels: Labels,
}

#[test]
fn test_registered_definition_widget_supports_custom_type() {
    let mut registry = WidgetRegistry::new();
    registry.register(WidgetKey::Definition("Labels".into()), |_, _, _| {
        Ok(Widget::Text(TextEntry::new(TextKind::Json)))
    });
    let mut form =
        Form::<Deployment>::with_registry(None, FormConfig::default(), registry).unwrap();

    type_text(&mut form, "name", "web");
    form.apply(Action::Paste {
        path: path("labels"),
        text: r#"{"tier": "frontend"}"#.into(),
    });

    let Submission::Accepted(deployment) = form.submit() else {
        panic!("labels should validate");
    };
    assert_eq!(
        deployment.labels.0.get("tier").map(String::as_str),
        Some("frontend")
    );
}

#[test]
fn test_config_widget_override_turns_boolean_into_text() {
    let mut config = FormConfig::default();
    config.widgets.insert(AnnotationKind::Boolean, WidgetChoice::Text);
    let account = sample_account();
    let mut form = Form::edit(&account, config).unwrap();

    let active = form.session().find(&path("active")).unwrap();
    let Widget::Text(entry) = &active.widget else {
        panic!("boolean should be a text entry");
    };
    assert_eq!(entry.buffer(), "true");

    form.apply(Action::Clear(path("active")));
    type_text(&mut form, "active", "false");
    let Submission::Accepted(edited) = form.submit() else {
        panic!("typed boolean should validate");
    };
    assert!(!edited.active);
}

#[test]
fn test_cancel_is_reported_as_abort() {
    let mut form = Form::<Person>::new(FormConfig::default()).unwrap();
    assert_eq!(form.apply(Action::Cancel), tickform::Effect::Abort);
}
