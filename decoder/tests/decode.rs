use decoder::generic::{GenericBlock, decode_generic};
use decoder::schema::{FieldDescriptor, FieldType, FieldValue, VariantSchema};
use decoder::typed::decode_typed;
use decoder::{
    Cat, DecodeError, Dog, EvalError, EvaluationContext, Record, SchemaRegistry, decode, decode_with,
};
use hclite::Document;

fn parse(source: &str) -> Document {
    hclite::parser::Parser::new(source.to_string(), 0)
        .parse()
        .expect("parse failed")
}

fn context() -> EvaluationContext {
    EvaluationContext::builder().seed(42).build()
}

fn decode_str(source: &str) -> Result<Vec<Record>, DecodeError> {
    decode(&parse(source), &context())
}

fn decode_ok(source: &str) -> Vec<Record> {
    decode_str(source).expect("decode failed")
}

fn cat(name: &str, sound: &str) -> Record {
    Record::Cat(Cat {
        name: name.into(),
        sound: sound.into(),
    })
}

fn dog(name: &str, breed: &str) -> Record {
    Record::Dog(Dog {
        name: name.into(),
        breed: breed.into(),
    })
}

#[test]
fn cat_without_sound_gets_default() {
    let pets = decode_ok("pet \"Ink\" {\n  type = \"cat\"\n}\n");
    assert_eq!(pets, [cat("Ink", "meow")]);
}

#[test]
fn dog_with_breed() {
    let src = r#"
pet "Swinney" {
  type = "dog"
  characteristics {
    breed = "Dachshund"
  }
}
"#;
    assert_eq!(decode_ok(src), [dog("Swinney", "Dachshund")]);
}

#[test]
fn empty_characteristics_uses_defaults() {
    let src = "pet \"Rex\" {\n  type = \"dog\"\n  characteristics {\n  }\n}\n";
    assert_eq!(decode_ok(src), [dog("Rex", "mutt")]);
}

#[test]
fn order_and_duplicates_are_preserved() {
    let src = r#"
pet "Ink" { type = "cat" }
pet "Swinney" { type = "dog" }
pet "Ink" { type = "dog" }
pet "Neko" { type = "cat" }
"#;
    let pets = decode_ok(src);
    let labels: Vec<&str> = pets.iter().map(Record::label).collect();
    assert_eq!(labels, ["Ink", "Swinney", "Ink", "Neko"]);
    assert_eq!(pets[2], dog("Ink", "mutt"));
}

#[test]
fn empty_document_decodes_to_nothing() {
    assert!(decode_ok("# nothing here\n").is_empty());
}

#[test]
fn environment_variable_substitution() {
    let src = r#"
pet "Neko" {
  type = "cat"
  characteristics {
    sound = env.CAT_SOUND
  }
}
"#;
    let context = EvaluationContext::builder()
        .environment([("PET_CAT_SOUND", "nyan")])
        .build();
    let pets = decode(&parse(src), &context).unwrap();
    assert_eq!(pets, [cat("Neko", "nyan")]);
}

#[test]
fn template_substitution() {
    let src = r#"
pet "Neko" {
  type = "cat"
  characteristics {
    sound = "${env.CAT_SOUND} ${env.TIMES}x"
  }
}
"#;
    let context = EvaluationContext::builder()
        .environment([("PET_CAT_SOUND", "nyan"), ("PET_TIMES", "3")])
        .build();
    let pets = decode(&parse(src), &context).unwrap();
    assert_eq!(pets, [cat("Neko", "nyan 3x")]);
}

#[test]
fn explicit_empty_string_takes_default() {
    let src = "pet \"Ink\" {\n  type = \"cat\"\n  characteristics {\n    sound = \"\"\n  }\n}\n";
    assert_eq!(decode_ok(src), [cat("Ink", "meow")]);
}

#[test]
fn variable_resolving_to_empty_takes_default() {
    let src = "pet \"Ink\" {\n  type = \"cat\"\n  characteristics {\n    sound = env.QUIET\n  }\n}\n";
    let context = EvaluationContext::builder()
        .environment([("PET_QUIET", "")])
        .build();
    assert_eq!(decode(&parse(src), &context).unwrap(), [cat("Ink", "meow")]);
}

#[test]
fn null_counts_as_omitted() {
    let src = "pet \"Rex\" {\n  type = \"dog\"\n  characteristics {\n    breed = null\n  }\n}\n";
    assert_eq!(decode_ok(src), [dog("Rex", "mutt")]);
}

#[test]
fn numbers_convert_to_strings() {
    let src = "pet \"Rex\" {\n  type = \"dog\"\n  characteristics {\n    breed = 101\n  }\n}\n";
    assert_eq!(decode_ok(src), [dog("Rex", "101")]);
}

#[test]
fn select_picks_a_candidate() {
    let src = r#"
pet "Spot" {
  type = "dog"
  characteristics {
    breed = select("Pug", "Lab")
  }
}
"#;
    for seed in 0..20 {
        let context = EvaluationContext::builder().seed(seed).build();
        let pets = decode(&parse(src), &context).unwrap();
        let Record::Dog(spot) = &pets[0] else {
            panic!("expected a dog");
        };
        assert!(["Pug", "Lab"].contains(&spot.breed.as_str()), "{}", spot.breed);
    }
}

#[test]
fn unknown_variant_fails_whole_document() {
    let src = r#"
pet "Ink" { type = "cat" }
pet "Nemo" { type = "fish" }
"#;
    match decode_str(src) {
        Err(DecodeError::UnknownVariant {
            label,
            discriminator,
            ..
        }) => {
            assert_eq!(label, "Nemo");
            assert_eq!(discriminator, "fish");
        }
        other => panic!("expected unknown variant, got {:?}", other),
    }
}

#[test]
fn undeclared_attribute_is_rejected() {
    let src = r#"
pet "Ink" {
  type = "cat"
  characteristics {
    breed = "Siamese"
  }
}
"#;
    match decode_str(src) {
        Err(DecodeError::UnknownField {
            label, name, kind, ..
        }) => {
            assert_eq!(label, "Ink");
            assert_eq!(name, "breed");
            assert_eq!(kind, "attribute");
        }
        other => panic!("expected unknown field, got {:?}", other),
    }
}

#[test]
fn undeclared_nested_block_is_rejected() {
    let src = "pet \"Ink\" {\n  type = \"cat\"\n  characteristics {\n    toys {\n    }\n  }\n}\n";
    assert!(matches!(
        decode_str(src),
        Err(DecodeError::UnknownField { kind: "block", .. })
    ));
}

#[test]
fn unknown_field_is_reported_before_evaluation() {
    // `sound` would fail to evaluate, but the undeclared attribute wins
    let src = r#"
pet "Ink" {
  type = "cat"
  characteristics {
    sound = env.MISSING
    color = "black"
  }
}
"#;
    assert!(matches!(decode_str(src), Err(DecodeError::UnknownField { .. })));
}

#[test]
fn evaluation_error_names_field_and_label() {
    let src = "pet \"Spot\" {\n  type = \"dog\"\n  characteristics {\n    breed = env.DOG_BREED\n  }\n}\n";
    let err = decode_str(src).unwrap_err();
    match &err {
        DecodeError::Evaluation { label, field, error, .. } => {
            assert_eq!(label, "Spot");
            assert_eq!(field, "breed");
            assert_eq!(
                error,
                &EvalError::UnsupportedAttribute {
                    path: "env".into(),
                    attribute: "DOG_BREED".into(),
                }
            );
        }
        other => panic!("expected evaluation error, got {:?}", other),
    }
    assert!(err.to_string().contains("pet \"Spot\""));
}

#[test]
fn unknown_function() {
    let src = "pet \"Spot\" {\n  type = \"dog\"\n  characteristics {\n    breed = shuffle(\"a\")\n  }\n}\n";
    assert!(matches!(
        decode_str(src),
        Err(DecodeError::Evaluation {
            error: EvalError::UndefinedFunction(_),
            ..
        })
    ));
}

#[test]
fn undefined_root_variable() {
    let src = "pet \"Spot\" {\n  type = \"dog\"\n  characteristics {\n    breed = var.breed\n  }\n}\n";
    assert!(matches!(
        decode_str(src),
        Err(DecodeError::Evaluation {
            error: EvalError::UndefinedVariable(_),
            ..
        })
    ));
}

#[test]
fn too_many_random_picks_is_an_arity_error() {
    let src = "pet \"Spot\" {\n  type = \"dog\"\n  characteristics {\n    breed = random(3, \",\", \"Pug\", \"Lab\")\n  }\n}\n";
    let err = decode_str(src).unwrap_err();
    assert!(err.is_arity(), "{:?}", err);
    assert!(err.to_string().contains("unable to select 3 random elements from list of length 2"));
}

#[test]
fn object_in_template_is_an_error() {
    let src = "pet \"Ink\" {\n  type = \"cat\"\n  characteristics {\n    sound = \"${env}\"\n  }\n}\n";
    assert!(matches!(
        decode_str(src),
        Err(DecodeError::Evaluation {
            error: EvalError::Interpolation("object"),
            ..
        })
    ));
}

// ---------------------------------------------------------------------------
// Generic shape
// ---------------------------------------------------------------------------

fn schema_message(source: &str) -> String {
    match decode_str(source) {
        Err(DecodeError::Schema { message, .. }) => message,
        other => panic!("expected schema error, got {:?}", other),
    }
}

#[test]
fn top_level_attribute_is_malformed() {
    assert!(schema_message("name = \"Ink\"\n").contains("top-level attribute `name`"));
}

#[test]
fn other_top_level_block_is_malformed() {
    assert!(schema_message("fish \"Nemo\" {\n}\n").contains("unexpected block `fish`"));
}

#[test]
fn pet_needs_exactly_one_label() {
    assert!(schema_message("pet {\n  type = \"cat\"\n}\n").contains("exactly one label"));
    assert!(schema_message("pet \"a\" \"b\" {\n  type = \"cat\"\n}\n").contains("exactly one label"));
}

#[test]
fn missing_type_is_malformed() {
    assert!(schema_message("pet \"Ink\" {\n}\n").contains("missing the `type` attribute"));
}

#[test]
fn variant_attribute_outside_characteristics_is_malformed() {
    let message = schema_message("pet \"Ink\" {\n  type = \"cat\"\n  sound = \"purr\"\n}\n");
    assert!(message.contains("unexpected attribute `sound`"));
}

#[test]
fn repeated_characteristics_is_malformed() {
    let src = "pet \"Ink\" {\n  type = \"cat\"\n  characteristics {\n  }\n  characteristics {\n  }\n}\n";
    assert!(schema_message(src).contains("only one `characteristics` block"));
}

#[test]
fn malformed_block_aborts_before_any_record() {
    let src = "pet \"Ink\" { type = \"cat\" }\npet {\n  type = \"dog\"\n}\n";
    assert!(matches!(decode_str(src), Err(DecodeError::Schema { .. })));
}

#[test]
fn discriminator_may_use_variables() {
    let src = "pet \"Ink\" {\n  type = env.KIND\n}\n";
    let context = EvaluationContext::builder()
        .environment([("PET_KIND", "cat")])
        .build();
    assert_eq!(decode(&parse(src), &context).unwrap(), [cat("Ink", "meow")]);
}

#[test]
fn discriminator_cannot_call_functions() {
    let src = "pet \"Ink\" {\n  type = select(\"cat\")\n}\n";
    match decode_str(src) {
        Err(DecodeError::Evaluation { field, error, .. }) => {
            assert_eq!(field, "type");
            assert_eq!(error, EvalError::FunctionsUnavailable("select".into()));
        }
        other => panic!("expected evaluation error, got {:?}", other),
    }
}

#[test]
fn generic_pass_leaves_body_undecoded() {
    // An unknown type and an undeclared attribute are both fine in pass 1
    let src = "pet \"Nemo\" {\n  type = \"fish\"\n  characteristics {\n    fins = 2\n  }\n}\n";
    let doc = parse(src);
    let blocks = decode_generic(&doc, &context()).unwrap();
    assert_eq!(blocks.len(), 1);
    let GenericBlock {
        label,
        discriminator,
        deferred,
        ..
    } = &blocks[0];
    assert_eq!(label, "Nemo");
    assert_eq!(discriminator, "fish");
    let body = deferred.body().expect("characteristics body");
    assert!(body.attribute("fins").is_some());
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

#[test]
fn builtin_registry() {
    let registry = SchemaRegistry::builtin();
    assert_eq!(registry.discriminators(), ["cat", "dog"]);
    let cat_schema = registry.lookup("cat").unwrap();
    let sound = cat_schema.field("sound").unwrap();
    assert!(!sound.required);
    assert_eq!(sound.default, FieldValue::String("meow".into()));
    assert!(registry.lookup("fish").is_none());
}

fn construct_kitten(name: String, mut fields: decoder::record::ResolvedFields) -> Record {
    Record::Cat(Cat {
        name,
        sound: fields.take_string("sound"),
    })
}

#[test]
fn registered_variant_is_decoded_without_new_dispatch() {
    let mut registry = SchemaRegistry::builtin();
    registry.register(
        VariantSchema::new("kitten", construct_kitten)
            .with_field(FieldDescriptor::optional("sound", FieldValue::String("mew".into()))),
    );

    let src = "pet \"Tiny\" { type = \"kitten\" }\npet \"Ink\" { type = \"cat\" }\n";
    let pets = decode_with(&parse(src), &registry, &context()).unwrap();
    assert_eq!(pets, [cat("Tiny", "mew"), cat("Ink", "meow")]);
}

#[test]
fn required_field_must_be_present() {
    let mut registry = SchemaRegistry::empty();
    registry.register(
        VariantSchema::new("cat", construct_kitten)
            .with_field(FieldDescriptor::required("sound", FieldType::String)),
    );

    let missing = "pet \"Ink\" { type = \"cat\" }\n";
    match decode_with(&parse(missing), &registry, &context()) {
        Err(DecodeError::MissingField { label, field, .. }) => {
            assert_eq!(label, "Ink");
            assert_eq!(field, "sound");
        }
        other => panic!("expected missing field, got {:?}", other),
    }

    // Required fields keep empty values; only optional fields take defaults
    let empty = "pet \"Ink\" {\n  type = \"cat\"\n  characteristics {\n    sound = \"\"\n  }\n}\n";
    let pets = decode_with(&parse(empty), &registry, &context()).unwrap();
    assert_eq!(pets, [cat("Ink", "")]);
}

#[test]
fn decode_typed_looks_up_the_discriminator() {
    let doc = parse("pet \"Nemo\" { type = \"fish\" }\n");
    let ctx = context();
    let block = decode_generic(&doc, &ctx).unwrap().remove(0);
    let err = decode_typed(block, &SchemaRegistry::builtin(), &ctx).unwrap_err();
    assert!(err.to_string().contains("unknown type `fish`"));
}

#[test]
fn error_spans_point_at_the_source() {
    let src = "pet \"Nemo\" {\n  type = \"fish\"\n}\n";
    let err = decode_str(src).unwrap_err();
    assert_eq!(&src[err.span().clone()], "\"fish\"");
}

#[test]
fn context_is_shared_across_threads() {
    let ctx = context();
    let src = "pet \"Spot\" {\n  type = \"dog\"\n  characteristics {\n    breed = select(\"Pug\", \"Lab\")\n  }\n}\n";
    std::thread::scope(|scope| {
        for _ in 0..4 {
            scope.spawn(|| {
                let pets = decode(&parse(src), &ctx).unwrap();
                assert_eq!(pets.len(), 1);
            });
        }
    });
}

fn construct_tabby(name: String, fields: decoder::record::ResolvedFields) -> Record {
    let lives = match fields.get("lives") {
        Some(FieldValue::Number(n)) => *n,
        _ => 0.0,
    };
    Record::Cat(Cat {
        name,
        sound: format!("{} lives", lives),
    })
}

#[test]
fn constructor_reads_resolved_number_fields() {
    let mut registry = SchemaRegistry::builtin();
    registry.register(
        VariantSchema::new("tabby", construct_tabby)
            .with_field(FieldDescriptor::optional("lives", FieldValue::Number(9.0))),
    );

    let src = r#"
pet "Tom" { type = "tabby" }
pet "Jerry" {
  type = "tabby"
  characteristics {
    lives = "3"
  }
}
"#;
    let pets = decode_with(&parse(src), &registry, &context()).unwrap();
    assert_eq!(pets, [cat("Tom", "9 lives"), cat("Jerry", "3 lives")]);
}
