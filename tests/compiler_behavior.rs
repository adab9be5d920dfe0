//! Compiler Behavior Tests
//!
//! Properties of schema compilation itself:
//! - Deterministic output and stable step listings
//! - Binding allocation, label sanitization and nesting depth
//! - Loop style selection from async contamination
//! - Zero-rule literals, forced elements and empty schemas

use indexmap::IndexMap;
use serde_json::{json, Value};

use sift::compiler::{compile, CompiledProcedure};
use sift::reporter::ListReporter;
use sift::rules::{min_length, RuleRegistry};
use sift::runtime::{Refs, RuntimeSupport};
use sift::schema::{
    array, number, object, string, ParsedRule, Schema, SchemaError, SchemaNode, Subtype,
};
use sift::{Messages, ValidateError};

// =============================================================================
// Helper Functions
// =============================================================================

fn run_sync(
    procedure: &CompiledProcedure,
    registry: &RuleRegistry,
    data: Value,
) -> Result<Value, ValidateError> {
    let mut reporter = ListReporter::new(Messages::new(), false);
    procedure.execute_sync(
        &data,
        registry,
        &mut reporter,
        RuntimeSupport::default(),
        &Refs::new(),
    )
}

fn bare_string(rules: Vec<ParsedRule>) -> SchemaNode {
    SchemaNode::Literal {
        subtype: Subtype::String,
        rules,
        optional: false,
        nullable: false,
    }
}

// =============================================================================
// Listings and Bindings
// =============================================================================

/// Compiling the same schema twice emits the same steps.
#[test]
fn test_compilation_is_deterministic() {
    let registry = RuleRegistry::standard();
    let schema = Schema::create(
        &registry,
        vec![(
            "users",
            array().each(object().members(vec![(
                "username",
                string().rule(min_length(3)),
            )])),
        )],
    )
    .unwrap();

    let first = compile(&schema);
    let second = compile(&schema);
    assert_eq!(first.listing(), second.listing());
    assert_eq!(first.is_async(), second.is_async());
    assert!(!first.is_async());
    assert!(first.listing().contains(" each=counted"));
}

/// The listing records bindings, rule chains and nesting depth.
#[test]
fn test_listing_records_bindings_and_nesting() {
    let registry = RuleRegistry::standard();
    let schema = Schema::create(
        &registry,
        vec![
            ("name", string()),
            ("profile", object().members(vec![("name", string())])),
        ],
    )
    .unwrap();

    let procedure = compile(&schema);
    let expected = [
        "name_0: string \"name\" rules=[required, string]",
        "profile_1: object \"profile\" rules=[required, object]",
        "  name_2: string \"name\" rules=[required, string]",
    ];
    assert_eq!(procedure.listing(), expected.join("\n"));
}

/// Open shapes and nullability show up as listing suffixes.
#[test]
fn test_listing_marks_open_shapes_and_nullability() {
    let registry = RuleRegistry::standard();
    let schema = Schema::create(
        &registry,
        vec![
            ("meta", object()),
            ("tags", array()),
            ("note", string().nullable()),
        ],
    )
    .unwrap();

    let procedure = compile(&schema);
    let expected = [
        "meta_0: object \"meta\" rules=[required, object] members=any",
        "tags_1: array \"tags\" rules=[required, array] each=any",
        "note_2: string \"note\" rules=[nullable, string] nullable",
    ];
    assert_eq!(procedure.listing(), expected.join("\n"));
}

/// Labels are sanitized for bindings but kept verbatim in quotes.
#[test]
fn test_bindings_sanitize_labels() {
    let registry = RuleRegistry::standard();
    let schema = Schema::create(&registry, vec![("first name", string())]).unwrap();

    let procedure = compile(&schema);
    assert_eq!(
        procedure.listing(),
        "first_name_0: string \"first name\" rules=[required, string]"
    );
}

// =============================================================================
// Loop Styles and the Async Flag
// =============================================================================

/// An async rule anywhere below an array switches its loop to awaited;
/// sibling arrays with sync subtrees keep the counted loop.
#[test]
fn test_loop_style_tracks_async_contamination() {
    let mut members = IndexMap::new();
    members.insert(
        "tags".to_string(),
        SchemaNode::Array {
            rules: vec![],
            each: Some(Box::new(bare_string(vec![ParsedRule::new("string", ())]))),
            optional: false,
            nullable: false,
        },
    );
    members.insert(
        "handles".to_string(),
        SchemaNode::Array {
            rules: vec![],
            each: Some(Box::new(bare_string(vec![
                ParsedRule::new("taken", ()).with_async()
            ]))),
            optional: false,
            nullable: false,
        },
    );
    let schema = Schema::from_nodes(members);

    let procedure = compile(&schema);
    assert!(procedure.is_async());
    assert!(procedure.listing().contains("tags_0: array \"tags\" rules=[] each=counted"));
    assert!(procedure
        .listing()
        .contains("handles_2: array \"handles\" rules=[] each=awaited"));
}

/// Async procedures refuse the synchronous entry before touching input.
#[test]
fn test_async_procedures_refuse_sync_execution() {
    let mut members = IndexMap::new();
    members.insert(
        "handle".to_string(),
        bare_string(vec![ParsedRule::new("taken", ()).with_async()]),
    );
    let procedure = compile(&Schema::from_nodes(members));

    let registry = RuleRegistry::new();
    let result = run_sync(&procedure, &registry, json!({ "handle": "x" }));
    assert_eq!(
        result,
        Err(ValidateError::Schema(SchemaError::AsyncSchema))
    );
}

// =============================================================================
// Degenerate Shapes
// =============================================================================

/// A literal with no rules compiles to nothing and leaves no trace in the
/// listing or the output.
#[test]
fn test_zero_rule_literals_compile_to_nothing() {
    let mut members = IndexMap::new();
    members.insert("free".to_string(), bare_string(vec![]));
    let procedure = compile(&Schema::from_nodes(members));
    assert_eq!(procedure.listing(), "");

    let registry = RuleRegistry::new();
    let output = run_sync(&procedure, &registry, json!({ "free": 42 })).unwrap();
    assert_eq!(output, json!({}));
}

/// An empty schema accepts any root and outputs an empty object.
#[test]
fn test_empty_schema_accepts_any_root() {
    let procedure = compile(&Schema::from_nodes(IndexMap::new()));
    assert_eq!(procedure.listing(), "");

    let registry = RuleRegistry::new();
    assert_eq!(run_sync(&procedure, &registry, json!(null)).unwrap(), json!({}));
    assert_eq!(
        run_sync(&procedure, &registry, json!({ "a": 1 })).unwrap(),
        json!({})
    );
}

/// Array elements compile even without rules, so every element is copied
/// through validation into the rebuilt array.
#[test]
fn test_forced_elements_pass_values_through() {
    let mut members = IndexMap::new();
    members.insert(
        "tags".to_string(),
        SchemaNode::Array {
            rules: vec![],
            each: Some(Box::new(bare_string(vec![]))),
            optional: false,
            nullable: false,
        },
    );
    let procedure = compile(&Schema::from_nodes(members));
    let expected = [
        "tags_0: array \"tags\" rules=[] each=counted",
        "  item_1: string \"#\" rules=[]",
    ];
    assert_eq!(procedure.listing(), expected.join("\n"));

    let registry = RuleRegistry::new();
    let output = run_sync(&procedure, &registry, json!({ "tags": [1, "x", null] })).unwrap();
    assert_eq!(output, json!({ "tags": [1, "x", null] }));
}

/// Open shapes still guard before passing through: an object node without
/// members drops non-objects, an array node without an element schema drops
/// non-arrays.
#[test]
fn test_open_shapes_only_pass_matching_values() {
    let mut members = IndexMap::new();
    members.insert(
        "meta".to_string(),
        SchemaNode::Object {
            rules: vec![],
            children: None,
            optional: false,
            nullable: false,
        },
    );
    members.insert(
        "tags".to_string(),
        SchemaNode::Array {
            rules: vec![],
            each: None,
            optional: false,
            nullable: false,
        },
    );
    let procedure = compile(&Schema::from_nodes(members));

    let registry = RuleRegistry::new();
    let data = json!({ "meta": { "kind": "note" }, "tags": [1, 2] });
    assert_eq!(run_sync(&procedure, &registry, data.clone()).unwrap(), data);

    let output = run_sync(&procedure, &registry, json!({ "meta": 42, "tags": "nope" })).unwrap();
    assert_eq!(output, json!({}));
}

// =============================================================================
// Direct Execution
// =============================================================================

/// The low-level compile-then-execute path sanitizes like the validator.
#[test]
fn test_direct_execution_produces_sanitized_output() {
    let registry = RuleRegistry::standard();
    let schema = Schema::create(&registry, vec![("age", number())]).unwrap();
    let procedure = compile(&schema);

    let output = run_sync(&procedure, &registry, json!({ "age": "20" })).unwrap();
    assert_eq!(output, json!({ "age": 20 }));
}
