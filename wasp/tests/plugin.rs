//! End-to-end tests against a hand-written guest module.

use wasp::{Callbacks, Engine, Error, Instance, Kind, Param, PluginConfig, Value};

const DEMO: &str = include_str!("fixtures/demo.wat");

/// A guest with an allocator but no `deallocate`.
const NO_DEALLOCATE: &str = r#"(module
  (memory (export "memory") 1)
  (global $heap (mut i32) (i32.const 1024))
  (func (export "allocate") (param $size i32) (result i32)
    (local $ptr i32)
    (local.set $ptr (global.get $heap))
    (global.set $heap
      (i32.add (global.get $heap) (i32.add (local.get $size) (i32.const 1))))
    (local.get $ptr))
  (func (export "echo") (param i32) (result i32)
    (local.get 0)))"#;

fn engine() -> Engine {
    let callbacks = Callbacks::new().string("env", "call_me", |name| format!("Hello {name}"));
    let mut engine = Engine::with_callbacks(callbacks);
    engine
        .register_plugin_bytes("demo", DEMO.as_bytes(), PluginConfig::new())
        .unwrap();
    engine
}

fn frees(instance: &mut Instance) -> i32 {
    instance.call("frees", &[]).unwrap()
}

#[test]
fn sum_passes_integers_by_value() {
    let mut demo = engine().get_instance("demo").unwrap();
    assert_eq!(demo.call::<i32>("sum", &[3.into(), 2.into()]).unwrap(), 5);
    assert_eq!(demo.call::<i32>("sum", &[(-4).into(), 1.into()]).unwrap(), -3);
    assert_eq!(frees(&mut demo), 0);
}

#[test]
fn hello_round_trips_strings() {
    let mut demo = engine().get_instance("demo").unwrap();
    let greeting: String = demo.call("hello", &["Nic".into()]).unwrap();
    assert_eq!(greeting, "Hello Nic");
    // The argument and the returned string.
    assert_eq!(frees(&mut demo), 2);
}

#[test]
fn reverse_round_trips_buffers() {
    let mut demo = engine().get_instance("demo").unwrap();
    let reversed: Vec<u8> = demo.call("reverse", &[vec![1, 2, 3].into()]).unwrap();
    assert_eq!(reversed, [3, 2, 1]);

    let reversed: Vec<u8> = demo
        .call("reverse", &[Param::Bytes(vec![10, 20, 30, 40, 50])])
        .unwrap();
    assert_eq!(reversed, [50, 40, 30, 20, 10]);

    let empty: Vec<u8> = demo.call("reverse", &[Vec::new().into()]).unwrap();
    assert!(empty.is_empty());
    assert_eq!(frees(&mut demo), 6);
}

#[test]
fn callback_result_is_released_once() {
    let mut demo = engine().get_instance("demo").unwrap();
    let greeting: String = demo.call("callback", &[]).unwrap();
    assert_eq!(greeting, "Hello Nic");
    assert_eq!(frees(&mut demo), 1);
}

#[test]
fn plugin_callbacks_shadow_engine_callbacks() {
    let mut engine = engine();
    let config = PluginConfig::new()
        .callbacks(Callbacks::new().string("env", "call_me", |name| format!("Hi {name}")));
    engine
        .register_plugin_bytes("custom", DEMO.as_bytes(), config)
        .unwrap();

    let mut custom = engine.get_instance("custom").unwrap();
    assert_eq!(custom.call::<String>("callback", &[]).unwrap(), "Hi Nic");
    let mut demo = engine.get_instance("demo").unwrap();
    assert_eq!(demo.call::<String>("callback", &[]).unwrap(), "Hello Nic");
}

#[test]
fn guest_errors_fail_the_call() {
    let mut demo = engine().get_instance("demo").unwrap();
    let err = demo.call::<i32>("fail", &[]).unwrap_err();
    assert!(
        matches!(&err, Error::Guest { function, message } if function == "fail" && message == "boom"),
        "{err}"
    );
    // The error does not leak into the next call.
    assert_eq!(demo.call::<i32>("sum", &[1.into(), 1.into()]).unwrap(), 2);
}

#[test]
fn raised_error_outranks_trap_and_is_cleared() {
    let mut demo = engine().get_instance("demo").unwrap();
    let err = demo.call::<i32>("raise_then_trap", &[]).unwrap_err();
    assert!(
        matches!(&err, Error::Guest { function, message } if function == "raise_then_trap" && message == "boom"),
        "{err}"
    );
    assert_eq!(demo.call::<i32>("sum", &[1.into(), 2.into()]).unwrap(), 3);
}

#[test]
fn undecodable_results_are_still_released() {
    let mut demo = engine().get_instance("demo").unwrap();
    assert!(matches!(
        demo.call::<String>("bad_string", &[]),
        Err(Error::Abi(wasp_abi::Error::Utf8(_)))
    ));
    assert_eq!(frees(&mut demo), 1);
    assert!(matches!(
        demo.call::<Vec<u8>>("bad_bytes", &[]),
        Err(Error::Abi(wasp_abi::Error::Truncated { .. }))
    ));
    assert_eq!(frees(&mut demo), 2);
}

#[test]
fn guests_without_deallocate_still_load() {
    let mut engine = Engine::new();
    engine
        .register_plugin_bytes("leaky", NO_DEALLOCATE.as_bytes(), PluginConfig::new())
        .unwrap();
    assert!(!engine.plugin("leaky").unwrap().exports("deallocate"));

    let mut leaky = engine.get_instance("leaky").unwrap();
    assert_eq!(leaky.call::<String>("echo", &["hi".into()]).unwrap(), "hi");
    assert_eq!(
        leaky.call::<Vec<u8>>("echo", &[vec![7, 8].into()]).unwrap(),
        [7, 8]
    );
}

#[test]
fn fd_write_reports_bytes_written() {
    let mut demo = engine().get_instance("demo").unwrap();
    assert_eq!(demo.call::<i32>("log", &[1.into()]).unwrap(), 9);
    assert_eq!(demo.call::<i32>("log", &[2.into()]).unwrap(), 9);
    assert_eq!(demo.call::<i32>("log", &[7.into()]).unwrap(), -8);
}

#[test]
fn null_results_are_errors() {
    let mut demo = engine().get_instance("demo").unwrap();
    let err = demo.call::<String>("null_string", &[]).unwrap_err();
    assert!(matches!(err, Error::NullResult { kind: Kind::Str, .. }));
    let err = demo.call::<Vec<u8>>("null_string", &[]).unwrap_err();
    assert!(matches!(err, Error::NullResult { kind: Kind::Bytes, .. }));
    // The same export read as an integer is fine.
    assert_eq!(demo.call::<i32>("null_string", &[]).unwrap(), 0);
}

#[test]
fn traps_surface_as_wasm_errors() {
    let mut demo = engine().get_instance("demo").unwrap();
    assert!(matches!(demo.call::<()>("trap", &[]), Err(Error::Wasm(_))));
    assert_eq!(demo.call::<i32>("sum", &[2.into(), 2.into()]).unwrap(), 4);
}

#[test]
fn call_validates_signature() {
    let mut demo = engine().get_instance("demo").unwrap();
    assert!(matches!(
        demo.call::<i32>("sum", &[1.into()]),
        Err(Error::Arity {
            expected: 2,
            actual: 1,
            ..
        })
    ));
    assert!(matches!(
        demo.call::<i32>("trap", &[]),
        Err(Error::Signature { .. })
    ));
    assert!(matches!(
        demo.call::<i32>("missing", &[]),
        Err(Error::MissingExport { name }) if name == "missing"
    ));
}

#[test]
fn call_value_returns_requested_kind() {
    let mut demo = engine().get_instance("demo").unwrap();
    let value = demo
        .call_value("hello", &["wasp".into()], Kind::Str)
        .unwrap();
    assert_eq!(value, Value::Str("Hello wasp".into()));
    // A discarded result is not released; only the argument is.
    let value = demo.call_value("hello", &["x".into()], Kind::Unit).unwrap();
    assert_eq!(value, Value::Unit);
    assert_eq!(frees(&mut demo), 3);
}

#[test]
fn missing_imports_fail_registration() {
    let mut engine = Engine::new();
    let err = engine
        .register_plugin_bytes("demo", DEMO.as_bytes(), PluginConfig::new())
        .unwrap_err();
    assert!(
        matches!(&err, Error::MissingImport { module, name } if module == "env" && name == "call_me"),
        "{err}"
    );
    assert!(engine.plugin("demo").is_none());
}

#[test]
fn missing_allocator_fails_registration() {
    let mut engine = Engine::new();
    let err = engine
        .register_plugin_bytes(
            "bare",
            br#"(module (memory (export "memory") 1))"#,
            PluginConfig::new(),
        )
        .unwrap_err();
    assert!(matches!(err, Error::MissingExport { name } if name == "allocate"));
}

#[test]
fn inspect_reports_interface() {
    let info = Engine::new().inspect(DEMO.as_bytes()).unwrap();
    assert!(!info.is_loadable());
    assert_eq!(info.missing_imports.len(), 1);
    assert_eq!(info.missing_imports[0].name, "call_me");
    assert!(info.missing_exports.is_empty());
    assert!(info.exports.iter().any(|e| e == "reverse"));
    assert_eq!(info.imports.len(), 3);

    let info = engine().inspect(DEMO.as_bytes()).unwrap();
    assert!(info.is_loadable());
}

#[test]
fn registry_lifecycle() {
    let mut engine = engine();
    assert!(matches!(
        engine.get_instance("other"),
        Err(Error::PluginNotFound(name)) if name == "other"
    ));

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("demo.wat");
    std::fs::write(&path, DEMO).unwrap();
    engine
        .register_plugin("other", &path, PluginConfig::new())
        .unwrap();
    assert_eq!(engine.plugin_names(), ["demo", "other"]);
    assert!(engine.plugin("other").unwrap().exports("hello"));

    let mut other = engine.get_instance("other").unwrap();
    assert!(engine.remove_plugin("other"));
    assert!(!engine.remove_plugin("other"));
    // Instances outlive their registration.
    assert_eq!(other.call::<i32>("sum", &[1.into(), 2.into()]).unwrap(), 3);

    assert!(matches!(
        engine.register_plugin("gone", dir.path().join("nope.wasm"), PluginConfig::new()),
        Err(Error::Io(_))
    ));
}

#[test]
fn instances_are_isolated() {
    let engine = engine();
    let mut a = engine.get_instance("demo").unwrap();
    let mut b = engine.get_instance("demo").unwrap();
    let _: String = a.call("hello", &["a".into()]).unwrap();
    assert_eq!(frees(&mut a), 2);
    assert_eq!(frees(&mut b), 0);
    assert_eq!(b.plugin(), "demo");
}
