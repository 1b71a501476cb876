//! End-to-end compiles of whole configuration documents.

use std::sync::Arc;

use pretty_assertions::assert_eq;

use logpipe::compile::{CompileStatus, ConfigCompiler};
use logpipe::error::ConfigError;
use logpipe::layouts::{JsonLayout, Layout};
use logpipe::levels::Level;
use logpipe::properties::Configurable;
use logpipe::registry::extensions::{ExtensionCatalog, ExtensionSet};
use logpipe::targets::builtin::{ConsoleTarget, FileTarget, MemoryTarget};
use logpipe::targets::wrappers::{AsyncQueueWrapper, BufferingWrapper, RetryWrapper};
use logpipe::targets::Target;
use logpipe::LoggingConfiguration;

/// Unwrap the source-annotation layers down to the originating error.
fn root_cause(error: &ConfigError) -> &ConfigError {
    match error {
        ConfigError::WithSource { source, .. } => root_cause(source),
        other => other,
    }
}

#[test]
fn compiles_a_full_pipeline() {
    let config = LoggingConfiguration::from_str(
        r#"
        [logging]
        global_threshold = "Debug"

        [[logging.variable]]
        name = "default_layout"
        value = "${level}|${logger}|${message}"

        [[logging.targets.target]]
        name = "console"
        type = "console"
        layout = "${default_layout}"

        [[logging.targets.target]]
        name = "audit"
        type = "file"
        file_name = "audit.log"
        buffer_size = 8192

        [[logging.rules.logger]]
        name = "app.audit.*"
        min_level = "Info"
        write_to = "audit"
        final = true

        [[logging.rules.logger]]
        name = "*"
        write_to = "console"
        "#,
    )
    .expect("configuration compiles");

    assert_eq!(config.status(), CompileStatus::Succeeded);
    assert_eq!(config.targets().len(), 2);
    assert_eq!(config.rules().len(), 2);
    assert_eq!(config.options().global_threshold, Level::Debug);

    // Variable expansion happened before property assignment; the layout
    // keeps the substituted text verbatim, unevaluated.
    let console = config.find_target("console").expect("registered");
    let console = console
        .as_any()
        .downcast_ref::<ConsoleTarget>()
        .expect("console target");
    assert_eq!(
        console.layout().unwrap().source(),
        Some("${level}|${logger}|${message}")
    );

    let audit = config.find_target("audit").expect("registered");
    let audit = audit.as_any().downcast_ref::<FileTarget>().expect("file");
    assert_eq!(audit.buffer_size(), 8192);

    // Forest order and the final flag survive verbatim.
    assert_eq!(config.rules()[0].pattern(), "app.audit.*");
    assert!(config.rules()[0].is_final());
    assert!(!config.rules()[1].is_final());
}

#[test]
fn unresolved_rule_target_is_fatal_and_named() {
    let error = LoggingConfiguration::from_str(
        r#"
        [logging]
        [[logging.targets.target]]
        name = "real"
        type = "null"

        [[logging.rules.logger]]
        name = "*"
        write_to = "real, ghost"
        "#,
    )
    .expect_err("missing target must fail");

    match root_cause(&error) {
        ConfigError::TargetNotFound { name } => assert_eq!(name, "ghost"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn async_wrapping_renames_and_registers_both_nodes() {
    let config = LoggingConfiguration::from_str(
        r#"
        [logging.targets]
        async = true

        [[logging.targets.target]]
        name = "db"
        type = "file"
        file_name = "db.log"

        [[logging.rules.logger]]
        name = "*"
        write_to = "db"
        "#,
    )
    .expect("configuration compiles");

    assert_eq!(config.targets().len(), 2);

    let wrapper = config.find_target("db").expect("wrapper under original name");
    let inner = config.find_target("db_wrapped").expect("renamed original");
    assert!(wrapper.as_any().downcast_ref::<AsyncQueueWrapper>().is_some());
    assert!(inner.as_any().downcast_ref::<FileTarget>().is_some());

    // The wrapper's child pointer is the renamed leaf itself, not a copy.
    assert!(Arc::ptr_eq(wrapper.wrapped().expect("wrapped child"), &inner));
}

#[test]
fn min_and_max_level_bound_an_inclusive_range() {
    let config = LoggingConfiguration::from_str(
        r#"
        [logging]
        [[logging.targets.target]]
        name = "out"
        type = "null"

        [[logging.rules.logger]]
        name = "*"
        max_level = "Error"
        min_level = "Info"
        write_to = "out"
        "#,
    )
    .expect("configuration compiles");

    let rule = &config.rules()[0];
    assert_eq!(
        rule.levels().levels(),
        vec![Level::Info, Level::Warn, Level::Error]
    );
    assert!(!rule.is_enabled_for(Level::Debug));
    assert!(!rule.is_enabled_for(Level::Fatal));
}

#[test]
fn exact_level_takes_precedence_over_range_attributes() {
    let config = LoggingConfiguration::from_str(
        r#"
        [logging]
        [[logging.targets.target]]
        name = "out"
        type = "null"

        [[logging.rules.logger]]
        name = "*"
        level = "Warn"
        min_level = "Trace"
        max_level = "Fatal"
        write_to = "out"
        "#,
    )
    .expect("configuration compiles");

    assert_eq!(config.rules()[0].levels().levels(), vec![Level::Warn]);
}

#[test]
fn levels_list_enables_disjoint_ordinals() {
    let config = LoggingConfiguration::from_str(
        r#"
        [logging]
        [[logging.targets.target]]
        name = "out"
        type = "null"

        [[logging.rules.logger]]
        name = "*"
        levels = "Debug , Error"
        write_to = "out"
        "#,
    )
    .expect("configuration compiles");

    assert_eq!(
        config.rules()[0].levels().levels(),
        vec![Level::Debug, Level::Error]
    );
}

#[test]
fn unknown_variable_tokens_stay_verbatim() {
    let config = LoggingConfiguration::from_str(
        r#"
        [logging]
        [[logging.variable]]
        name = "dir"
        value = "/var/log"

        [[logging.targets.target]]
        name = "f"
        type = "file"
        file_name = "${dir}/${undefined}/app.log"
        "#,
    )
    .expect("configuration compiles");

    let target = config.find_target("f").expect("registered");
    let target = target.as_any().downcast_ref::<FileTarget>().expect("file");
    assert_eq!(
        target.file_name().unwrap().source(),
        Some("/var/log/${undefined}/app.log")
    );
}

#[test]
fn rules_may_reference_targets_declared_later() {
    // The rules section appears before the targets section; rule
    // application is deferred until all targets are registered.
    let config = LoggingConfiguration::from_str(
        r#"
        [logging]
        [[logging.rules.logger]]
        name = "*"
        write_to = "later"

        [[logging.targets.target]]
        name = "later"
        type = "null"
        "#,
    )
    .expect("forward reference resolves");

    assert_eq!(config.rules()[0].targets().len(), 1);
}

#[test]
fn disabled_rules_are_skipped_entirely() {
    let config = LoggingConfiguration::from_str(
        r#"
        [logging]
        [[logging.targets.target]]
        name = "out"
        type = "null"

        [[logging.rules.logger]]
        name = "*"
        enabled = false
        write_to = "out"
        "#,
    )
    .expect("configuration compiles");

    assert!(config.rules().is_empty());
}

#[test]
fn nested_rules_and_filters_compose_in_order() {
    let config = LoggingConfiguration::from_str(
        r#"
        [logging]
        [[logging.targets.target]]
        name = "out"
        type = "null"

        [[logging.rules.logger]]
        name = "app.*"
        write_to = "out"

        [logging.rules.logger.filters]
        [[logging.rules.logger.filters.when_contains]]
        layout = "${message}"
        value = "heartbeat"
        action = "ignore_final"

        [[logging.rules.logger.logger]]
        name = "app.db.*"
        level = "Error"
        write_to = "out"
        final = true
        "#,
    )
    .expect("configuration compiles");

    let rule = &config.rules()[0];
    assert_eq!(rule.filters().len(), 1);
    assert_eq!(rule.filters()[0].type_name(), "when_contains");
    assert_eq!(rule.children().len(), 1);
    assert_eq!(rule.children()[0].pattern(), "app.db.*");
    assert!(rule.children()[0].is_final());
}

#[test]
fn wrapper_accepts_reference_children() {
    let config = LoggingConfiguration::from_str(
        r#"
        [logging]
        [[logging.targets.target]]
        name = "inner"
        type = "memory"

        [[logging.targets.target]]
        name = "outer"
        type = "buffering"
        buffer_size = 50

        [logging.targets.target.target_ref]
        name = "inner"

        [[logging.rules.logger]]
        name = "*"
        write_to = "outer"
        "#,
    )
    .expect("configuration compiles");

    let outer = config.find_target("outer").expect("registered");
    let outer_concrete = outer
        .as_any()
        .downcast_ref::<BufferingWrapper>()
        .expect("buffering wrapper");
    assert_eq!(outer_concrete.buffer_size(), 50);

    let inner = config.find_target("inner").expect("registered");
    assert!(Arc::ptr_eq(outer.wrapped().expect("wrapped"), &inner));
}

#[test]
fn wrapper_reference_to_missing_target_is_fatal() {
    let error = LoggingConfiguration::from_str(
        r#"
        [logging]
        [[logging.targets.target]]
        name = "outer"
        type = "buffering"

        [logging.targets.target.target_ref]
        name = "nowhere"
        "#,
    )
    .expect_err("dangling reference must fail");

    match root_cause(&error) {
        ConfigError::TargetNotFound { name } => assert_eq!(name, "nowhere"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn wrapper_with_two_children_is_fatal() {
    let error = LoggingConfiguration::from_str(
        r#"
        [logging]
        [[logging.targets.target]]
        name = "a"
        type = "null"

        [[logging.targets.target]]
        name = "b"
        type = "null"

        [[logging.targets.target]]
        name = "outer"
        type = "buffering"

        [[logging.targets.target.target_ref]]
        name = "a"

        [[logging.targets.target.target_ref]]
        name = "b"
        "#,
    )
    .expect_err("second child must fail");

    assert!(matches!(
        root_cause(&error),
        ConfigError::WrapperOccupied { .. }
    ));
}

#[test]
fn compound_collects_children_in_document_order() {
    let config = LoggingConfiguration::from_str(
        r#"
        [logging]
        [[logging.targets.target]]
        name = "both"
        type = "split"

        [[logging.targets.target.target]]
        name = "first"
        type = "console"

        [[logging.targets.target.target]]
        type = "memory"

        [[logging.rules.logger]]
        name = "*"
        write_to = "both"
        "#,
    )
    .expect("configuration compiles");

    let group = config.find_target("both").expect("registered");
    let children = group.child_targets();
    assert_eq!(children.len(), 2);
    assert_eq!(children[0].name(), Some("first"));
    // The anonymous child is attached but never registered.
    assert_eq!(children[1].name(), None);
    assert!(config.find_target("first").is_some());
    assert_eq!(config.targets().len(), 2);
}

#[test]
fn default_wrapper_template_wraps_every_target() {
    let config = LoggingConfiguration::from_str(
        r#"
        [logging]
        [logging.targets.default_wrapper]
        type = "retry"
        retry_count = 7

        [[logging.targets.target]]
        name = "out"
        type = "console"

        [[logging.rules.logger]]
        name = "*"
        write_to = "out"
        "#,
    )
    .expect("configuration compiles");

    let outer = config.find_target("out").expect("wrapper took the name");
    let retry = outer
        .as_any()
        .downcast_ref::<RetryWrapper>()
        .expect("retry wrapper");
    assert_eq!(retry.retry_count(), 7);

    let inner = config.find_target("out_wrapped").expect("renamed original");
    assert!(inner.as_any().downcast_ref::<ConsoleTarget>().is_some());
    assert!(Arc::ptr_eq(outer.wrapped().expect("wrapped"), &inner));
}

#[test]
fn default_wrapper_chain_attaches_at_the_innermost_open_slot() {
    let config = LoggingConfiguration::from_str(
        r#"
        [logging]
        [logging.targets.default_wrapper]
        type = "retry"

        [logging.targets.default_wrapper.target]
        type = "buffering"

        [[logging.targets.target]]
        name = "out"
        type = "console"

        [[logging.rules.logger]]
        name = "*"
        write_to = "out"
        "#,
    )
    .expect("configuration compiles");

    let outer = config.find_target("out").expect("registered");
    assert!(outer.as_any().downcast_ref::<RetryWrapper>().is_some());

    let middle = outer.wrapped().expect("chain middle");
    assert!(middle.as_any().downcast_ref::<BufferingWrapper>().is_some());

    let innermost = middle.wrapped().expect("chain end");
    assert!(innermost.as_any().downcast_ref::<ConsoleTarget>().is_some());
    assert_eq!(innermost.name(), Some("out_wrapped"));
}

#[test]
fn non_wrapper_default_wrapper_is_fatal() {
    let error = LoggingConfiguration::from_str(
        r#"
        [logging]
        [logging.targets.default_wrapper]
        type = "split"

        [[logging.targets.target]]
        name = "out"
        type = "console"
        "#,
    )
    .expect_err("split is not a wrapper");

    match root_cause(&error) {
        ConfigError::NotAWrapper { type_name } => assert_eq!(type_name, "split"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn default_target_parameters_apply_as_baseline() {
    let config = LoggingConfiguration::from_str(
        r#"
        [logging]
        [logging.targets.default_target_parameters]
        type = "file"
        auto_flush = false
        buffer_size = 1024

        [[logging.targets.target]]
        name = "a"
        type = "file"
        file_name = "a.log"

        [[logging.targets.target]]
        name = "b"
        type = "file"
        file_name = "b.log"
        buffer_size = 4096

        [[logging.rules.logger]]
        name = "*"
        write_to = "a, b"
        "#,
    )
    .expect("configuration compiles");

    let a = config.find_target("a").expect("registered");
    let a = a.as_any().downcast_ref::<FileTarget>().expect("file");
    assert!(!a.auto_flush());
    assert_eq!(a.buffer_size(), 1024);

    // The target's own attributes override the baseline.
    let b = config.find_target("b").expect("registered");
    let b = b.as_any().downcast_ref::<FileTarget>().expect("file");
    assert_eq!(b.buffer_size(), 4096);
    assert!(!b.auto_flush());
}

#[test]
fn typed_layout_child_with_item_list() {
    let config = LoggingConfiguration::from_str(
        r#"
        [logging]
        [[logging.targets.target]]
        name = "structured"
        type = "console"

        [logging.targets.target.layout]
        type = "json"
        indent = true

        [[logging.targets.target.layout.attribute]]
        name = "time"
        layout = "${time}"

        [[logging.targets.target.layout.attribute]]
        name = "msg"
        layout = "${message}"

        [[logging.rules.logger]]
        name = "*"
        write_to = "structured"
        "#,
    )
    .expect("configuration compiles");

    let target = config.find_target("structured").expect("registered");
    let console = target
        .as_any()
        .downcast_ref::<ConsoleTarget>()
        .expect("console");
    let layout = console
        .layout()
        .expect("layout set")
        .as_any()
        .downcast_ref::<JsonLayout>()
        .expect("json layout");
    assert!(layout.indent());
    let names: Vec<_> = layout.attributes().iter().map(|a| a.name()).collect();
    assert_eq!(names, vec!["time", "msg"]);
}

#[test]
fn property_coercion_failure_names_the_member() {
    let error = LoggingConfiguration::from_str(
        r#"
        [logging]
        [[logging.targets.target]]
        name = "f"
        type = "file"
        file_name = "a.log"
        buffer_size = "lots"
        "#,
    )
    .expect_err("bad number must fail");

    match root_cause(&error) {
        ConfigError::Property { type_name, source } => {
            assert_eq!(type_name, "file");
            assert!(source.to_string().contains("buffer_size"));
            assert!(source.to_string().contains("lots"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn unknown_target_type_is_fatal() {
    let error = LoggingConfiguration::from_str(
        r#"
        [logging]
        [[logging.targets.target]]
        name = "t"
        type = "telegram"
        "#,
    )
    .expect_err("unregistered type must fail");

    match root_cause(&error) {
        ConfigError::UnknownType { kind, name } => {
            assert_eq!(*kind, "target");
            assert_eq!(name, "telegram");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn top_level_target_without_a_name_is_fatal() {
    let error = LoggingConfiguration::from_str(
        r#"
        [logging]
        [[logging.targets.target]]
        type = "console"
        "#,
    )
    .expect_err("name is required");

    assert!(matches!(
        root_cause(&error),
        ConfigError::MissingAttribute { .. }
    ));
}

#[test]
fn unknown_root_element_is_a_naming_mismatch() {
    let error =
        LoggingConfiguration::from_str("[service]\nport = 1\n").expect_err("bad root must fail");
    assert!(matches!(root_cause(&error), ConfigError::NameMismatch { .. }));
}

#[test]
fn duplicate_target_names_overwrite_silently() {
    let config = LoggingConfiguration::from_str(
        r#"
        [logging]
        [[logging.targets.target]]
        name = "dup"
        type = "console"

        [[logging.targets.target]]
        name = "dup"
        type = "memory"

        [[logging.rules.logger]]
        name = "*"
        write_to = "dup"
        "#,
    )
    .expect("duplicate names are not an error");

    assert_eq!(config.targets().len(), 1);
    let winner = config.find_target("dup").expect("registered");
    assert!(winner.as_any().downcast_ref::<MemoryTarget>().is_some());
}

#[test]
fn unused_targets_are_reported_exactly_once() {
    let config = LoggingConfiguration::from_str(
        r#"
        [logging]
        [[logging.targets.target]]
        name = "used"
        type = "null"

        [[logging.targets.target]]
        name = "orphan"
        type = "null"

        [[logging.rules.logger]]
        name = "*"
        write_to = "used"
        "#,
    )
    .expect("configuration compiles");

    assert_eq!(config.status(), CompileStatus::Succeeded);
    assert_eq!(config.unused_targets(), vec!["orphan"]);
}

#[test]
fn strict_mode_promotes_soft_diagnostics_to_one_fatal_error() {
    let text = r#"
        [logging]
        throw_config_exceptions = true

        [logging.mystery_section]
        x = "1"

        [[logging.targets.target]]
        name = "out"
        type = "null"

        [[logging.rules.logger]]
        name = "*"
        write_to = "out"
        "#;

    let error = LoggingConfiguration::from_str(text).expect_err("strict must fail");
    match root_cause(&error) {
        ConfigError::Aggregate(errors) => {
            assert_eq!(errors.len(), 1);
            assert!(matches!(errors[0], ConfigError::UnknownElement { .. }));
        }
        other => panic!("unexpected error: {other:?}"),
    }

    // The identical document without strict mode compiles with a warning.
    let relaxed = text.replace("throw_config_exceptions = true", "");
    assert!(LoggingConfiguration::from_str(&relaxed).is_ok());
}

#[test]
fn strict_mode_folds_the_two_exception_flags() {
    let config = LoggingConfiguration::from_str(
        r#"
        [logging]
        throw_exceptions = true
        throw_config_exceptions = false
        "#,
    )
    .expect("configuration compiles");

    // The config-specific flag is consulted first.
    assert!(!config.options().strict());
}

#[test]
fn extension_sets_register_before_targets_resolve() {
    let mut catalog = ExtensionCatalog::new();
    catalog.add(
        ExtensionSet::new("acme_sinks")
            .with_target("rocket", || Box::new(MemoryTarget::default())),
    );

    let config = ConfigCompiler::new()
        .with_catalog(catalog)
        .compile_str(
            r#"
            [logging]
            [[logging.extensions.add]]
            assembly = "acme_sinks"
            prefix = "acme_"

            [[logging.targets.target]]
            name = "r"
            type = "acme_rocket"

            [[logging.rules.logger]]
            name = "*"
            write_to = "r"
            "#,
        )
        .expect("extension type resolves");

    let target = config.find_target("r").expect("registered");
    assert!(target.as_any().downcast_ref::<MemoryTarget>().is_some());
}

#[test]
fn missing_extension_set_is_recoverable_unless_strict() {
    let text = r#"
        [logging]
        [[logging.extensions.add]]
        assembly = "no_such_set"

        [[logging.targets.target]]
        name = "out"
        type = "null"

        [[logging.rules.logger]]
        name = "*"
        write_to = "out"
        "#;

    assert!(LoggingConfiguration::from_str(text).is_ok());

    let strict = text.replace("[logging]", "[logging]\nthrow_config_exceptions = true");
    let error = LoggingConfiguration::from_str(&strict).expect_err("strict promotes the failure");
    assert!(matches!(root_cause(&error), ConfigError::Extension { .. }));
}

#[test]
fn time_section_installs_the_selected_source() {
    let config = LoggingConfiguration::from_str(
        r#"
        [logging]
        [logging.time]
        type = "fast_utc"
        "#,
    )
    .expect("configuration compiles");

    assert_eq!(config.time_source().type_name(), "fast_utc");
}

#[test]
fn configuration_wrapper_root_is_transparent() {
    let config = LoggingConfiguration::from_str(
        r#"
        [configuration.logging]
        global_threshold = "Warn"

        [[configuration.logging.targets.target]]
        name = "out"
        type = "null"

        [[configuration.logging.rules.logger]]
        name = "*"
        write_to = "out"
        "#,
    )
    .expect("wrapper root compiles");

    assert_eq!(config.options().global_threshold, Level::Warn);
    assert_eq!(config.rules().len(), 1);
}

#[test]
fn summary_serializes_the_compiled_shape() {
    let config = LoggingConfiguration::from_str(
        r#"
        [logging]
        [[logging.targets.target]]
        name = "out"
        type = "console"

        [[logging.rules.logger]]
        name = "app.*"
        min_level = "Info"
        write_to = "out"
        final = true
        "#,
    )
    .expect("configuration compiles");

    let json = serde_json::to_value(config.summary()).expect("serializes");
    assert_eq!(json["status"], "succeeded");
    assert_eq!(json["targets"][0]["name"], "out");
    assert_eq!(json["targets"][0]["shape"], "leaf");
    assert_eq!(json["rules"][0]["final"], true);
    assert_eq!(json["rules"][0]["levels"][0], "Info");
}
