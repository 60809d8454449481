mod common;

use std::sync::Arc;

use common::{Fixture, calc_interface, width_interface};
use nativebind::{
    BindingConfig, BindingError, EntryState, FfiType, FfiValue, InstanceState,
    InterfaceDescription, MemberDescriptor, StaticLoader, SymbolNaming,
};

#[test]
fn test_resolve_is_memoized() {
    let fx = Fixture::new();
    let config = BindingConfig::default();

    let first = fx.binder.resolve(&calc_interface(), &fx.library, &config).unwrap();
    let second = fx.binder.resolve(&calc_interface(), &fx.library, &config).unwrap();
    assert!(Arc::ptr_eq(&first, &second));

    let stats = fx.binder.cache().stats();
    assert_eq!(stats.generations, 1);
    assert_eq!(stats.constructions, 1);
    assert_eq!(stats.hits, 1);
    assert_eq!(fx.loader.stats().opens, 1);
}

#[test]
fn test_bare_name_and_path_share_identity() {
    let fx = Fixture::new();
    let config = BindingConfig::default();

    let by_path = fx.binder.resolve(&calc_interface(), &fx.library, &config).unwrap();
    let by_file_name = fx.binder.resolve(&calc_interface(), "libcalc.so", &config).unwrap();
    assert!(Arc::ptr_eq(&by_path, &by_file_name));
}

#[test]
fn test_invoke_methods() {
    let fx = Fixture::new();
    let instance = fx
        .binder
        .resolve(&calc_interface(), &fx.library, &BindingConfig::default())
        .unwrap();

    let sum = instance
        .invoke("calc_add", &[FfiValue::I32(2), FfiValue::I32(3)])
        .unwrap();
    assert_eq!(sum, FfiValue::I32(5));

    let scaled = instance
        .invoke("calc_scale", &[FfiValue::F64(1.5), FfiValue::F32(2.0)])
        .unwrap();
    assert_eq!(scaled, FfiValue::F64(3.0));

    let name = instance.invoke("calc_name", &[]).unwrap();
    assert_eq!(name, FfiValue::Str("calc".to_string()));
}

#[test]
fn test_invocation_errors() {
    let fx = Fixture::new();
    let interface = calc_interface().method("calc_nothing", vec![], FfiType::Str);
    let instance = fx
        .binder
        .resolve(&interface, &fx.library, &BindingConfig::default())
        .unwrap();

    assert!(matches!(
        instance.invoke("calc_add", &[FfiValue::I32(1)]),
        Err(BindingError::ArgumentMismatch { .. })
    ));
    assert!(matches!(
        instance.invoke("calc_add", &[FfiValue::I32(1), FfiValue::I64(2)]),
        Err(BindingError::ArgumentMismatch { .. })
    ));
    assert!(matches!(
        instance.invoke("calc_sub", &[]),
        Err(BindingError::UnknownMember { member, .. }) if member == "calc_sub"
    ));
    assert!(matches!(
        instance.invoke("calc_nothing", &[]),
        Err(BindingError::NullString { .. })
    ));
}

#[test]
fn test_release_reuses_blueprint() {
    let fx = Fixture::new();
    let config = BindingConfig::default();

    let first = fx.binder.resolve(&calc_interface(), &fx.library, &config).unwrap();
    let identifier = first.identifier().clone();
    assert_eq!(fx.binder.cache().state(&identifier), EntryState::Active);

    assert!(fx.binder.release(&identifier));
    assert_eq!(fx.binder.cache().state(&identifier), EntryState::Released);
    assert_eq!(first.state(), InstanceState::Disposed);
    assert!(matches!(
        first.invoke("calc_add", &[FfiValue::I32(1), FfiValue::I32(1)]),
        Err(BindingError::Disposed { .. })
    ));
    assert!(!fx.binder.release(&identifier));

    let second = fx.binder.resolve(&calc_interface(), &fx.library, &config).unwrap();
    assert!(!Arc::ptr_eq(&first, &second));
    assert_eq!(fx.binder.cache().state(&identifier), EntryState::Active);
    assert_eq!(
        second
            .invoke("calc_add", &[FfiValue::I32(1), FfiValue::I32(1)])
            .unwrap(),
        FfiValue::I32(2)
    );

    let stats = fx.binder.cache().stats();
    assert_eq!(stats.generations, 1);
    assert_eq!(stats.constructions, 2);
    assert_eq!(stats.releases, 1);
    assert_eq!(fx.binder.cache().blueprint_count(), 1);

    let loader = fx.loader.stats();
    assert_eq!(loader.opens, 2);
    assert_eq!(loader.closes, 1);
    assert_eq!(loader.open_handles, 1);
}

#[test]
fn test_disposed_instance_is_replaced() {
    let fx = Fixture::new();
    let config = BindingConfig::default();

    let first = fx.binder.resolve(&calc_interface(), &fx.library, &config).unwrap();
    assert!(first.dispose());
    assert!(!first.dispose());
    assert_eq!(
        fx.binder.cache().state(first.identifier()),
        EntryState::Released
    );

    assert!(!fx.binder.release(first.identifier()));
    assert_eq!(fx.binder.cache().stats().releases, 0);
    assert_eq!(
        fx.binder.cache().state(first.identifier()),
        EntryState::Released
    );

    let second = fx.binder.resolve(&calc_interface(), &fx.library, &config).unwrap();
    assert!(!second.is_disposed());
    assert_eq!(fx.binder.cache().stats().generations, 1);
}

#[test]
fn test_release_unknown_identifier_is_noop() {
    let fx = Fixture::new();
    let other = Fixture::new();
    let instance = other
        .binder
        .resolve(&calc_interface(), &other.library, &BindingConfig::default())
        .unwrap();

    assert!(!fx.binder.release(instance.identifier()));
    assert_eq!(
        fx.binder.cache().state(instance.identifier()),
        EntryState::Absent
    );
    assert!(!instance.is_disposed());
}

#[test]
fn test_configuration_is_part_of_identity() {
    let fx = Fixture::new();

    let eager = fx
        .binder
        .resolve(&calc_interface(), &fx.library, &BindingConfig::default())
        .unwrap();
    let lazy = fx
        .binder
        .resolve(&calc_interface(), &fx.library, &BindingConfig::lazy())
        .unwrap();
    assert!(!Arc::ptr_eq(&eager, &lazy));
    assert_ne!(eager.identifier(), lazy.identifier());
    assert_eq!(fx.binder.cache().stats().generations, 2);
    assert_eq!(fx.binder.cache().active_count(), 2);
}

#[test]
fn test_invalid_interface_fails_before_io() {
    let fx = Fixture::new();
    let wide = InterfaceDescription::new("wide").method(
        "calc_add",
        vec![FfiType::I32; nativebind::MAX_ARITY + 1],
        FfiType::I32,
    );

    let err = fx
        .binder
        .resolve(&wide, fx.dir.path().join("missing.so"), &BindingConfig::default())
        .unwrap_err();
    assert!(matches!(err, BindingError::Configuration { .. }));
    assert_eq!(fx.loader.stats().opens, 0);
    assert_eq!(fx.binder.cache().blueprint_count(), 0);
}

#[test]
fn test_missing_library() {
    let fx = Fixture::new();
    let err = fx
        .binder
        .resolve(&calc_interface(), "libabsent.so", &BindingConfig::default())
        .unwrap_err();

    match err {
        BindingError::LibraryNotFound { name, tried } => {
            assert_eq!(name, "libabsent.so");
            assert!(!tried.is_empty());
        }
        other => panic!("expected LibraryNotFound, got {other:?}"),
    }
    assert_eq!(fx.loader.stats().opens, 0);
}

#[test]
fn test_missing_symbol_leaves_no_trace() {
    let fx = Fixture::new();
    let interface = calc_interface().method("calc_divide", vec![FfiType::I32], FfiType::I32);
    let config = BindingConfig::default();

    for _ in 0..2 {
        let err = fx
            .binder
            .resolve(&interface, &fx.library, &config)
            .unwrap_err();
        assert!(matches!(
            err,
            BindingError::SymbolLoad { ref symbol, .. } if symbol == "calc_divide"
        ));
    }

    assert_eq!(fx.binder.cache().blueprint_count(), 0);
    assert_eq!(fx.binder.cache().active_count(), 0);
    assert_eq!(fx.binder.cache().stats().constructions, 0);

    let loader = fx.loader.stats();
    assert_eq!(loader.opens, 2);
    assert_eq!(loader.open_handles, 0);
}

#[test]
fn test_unregistered_library_file_fails_to_load() {
    let fx = Fixture::new();
    let stray = fx.dir.path().join("libstray.so");
    std::fs::File::create(&stray).unwrap();

    let err = fx
        .binder
        .resolve(&calc_interface(), &stray, &BindingConfig::default())
        .unwrap_err();
    assert!(matches!(err, BindingError::LibraryLoad { .. }));
    assert_eq!(fx.binder.cache().blueprint_count(), 0);
}

#[test]
fn test_properties() {
    let fx = Fixture::new();
    let config = BindingConfig::default().with_symbol_prefix("calc_");
    let instance = fx.binder.resolve(&width_interface(), &fx.library, &config).unwrap();

    instance.set("width", FfiValue::I32(640)).unwrap();
    assert_eq!(instance.get("width").unwrap(), FfiValue::I32(640));
    assert_eq!(instance.invoke("get_width", &[]).unwrap(), FfiValue::I32(640));
    assert!(matches!(
        instance.set("width", FfiValue::F64(1.0)),
        Err(BindingError::ArgumentMismatch { .. })
    ));
    assert!(matches!(
        instance.get("height"),
        Err(BindingError::UnknownMember { .. })
    ));
}

#[test]
fn test_symbol_naming() {
    let fx = Fixture::new();
    let interface = InterfaceDescription::new("calc_pascal")
        .method("add", vec![FfiType::I32, FfiType::I32], FfiType::I32)
        .member(MemberDescriptor::method("label", vec![], FfiType::Str).with_symbol("calc_name"));
    let config = BindingConfig::default().with_symbol_prefix("calc_");

    let instance = fx.binder.resolve(&interface, &fx.library, &config).unwrap();
    assert_eq!(
        instance
            .invoke("add", &[FfiValue::I32(20), FfiValue::I32(22)])
            .unwrap(),
        FfiValue::I32(42)
    );
    assert_eq!(
        instance.invoke("label", &[]).unwrap(),
        FfiValue::Str("calc".to_string())
    );

    let underscored = InterfaceDescription::new("calc_camel").method("calcAdd", vec![FfiType::I32, FfiType::I32], FfiType::I32);
    let config = BindingConfig::default().with_naming(SymbolNaming::Underscore);
    let instance = fx.binder.resolve(&underscored, &fx.library, &config).unwrap();
    assert_eq!(
        instance
            .invoke("calcAdd", &[FfiValue::I32(1), FfiValue::I32(2)])
            .unwrap(),
        FfiValue::I32(3)
    );
}

#[test]
fn test_lazy_binding_defers_lookup() {
    let fx = Fixture::new();
    let interface = calc_interface().method("calc_divide", vec![FfiType::I32], FfiType::I32);

    let instance = fx
        .binder
        .resolve(&interface, &fx.library, &BindingConfig::lazy())
        .unwrap();
    assert_eq!(fx.loader.stats().resolves, 0);

    for _ in 0..3 {
        instance
            .invoke("calc_add", &[FfiValue::I32(1), FfiValue::I32(1)])
            .unwrap();
    }
    assert_eq!(fx.loader.stats().resolves, 1);

    assert!(matches!(
        instance.invoke("calc_divide", &[FfiValue::I32(1)]),
        Err(BindingError::SymbolLoad { .. })
    ));
}

#[test]
fn test_optional_member() {
    let fx = Fixture::new();
    let interface = calc_interface()
        .member(MemberDescriptor::method("calc_divide", vec![FfiType::I32], FfiType::I32).optional());

    let instance = fx
        .binder
        .resolve(&interface, &fx.library, &BindingConfig::default())
        .unwrap();
    assert!(instance.is_available("calc_add"));
    assert!(!instance.is_available("calc_divide"));
    assert!(matches!(
        instance.invoke("calc_divide", &[FfiValue::I32(1)]),
        Err(BindingError::SymbolLoad { .. })
    ));
    assert_eq!(
        instance
            .invoke("calc_add", &[FfiValue::I32(4), FfiValue::I32(4)])
            .unwrap(),
        FfiValue::I32(8)
    );
}

#[test]
fn test_release_all() {
    let fx = Fixture::new();
    let a = fx
        .binder
        .resolve(&calc_interface(), &fx.library, &BindingConfig::default())
        .unwrap();
    let b = fx
        .binder
        .resolve(&calc_interface(), &fx.library, &BindingConfig::lazy())
        .unwrap();

    assert_eq!(fx.binder.release_all(), 2);
    assert!(a.is_disposed());
    assert!(b.is_disposed());
    assert_eq!(fx.binder.cache().active_count(), 0);
    assert_eq!(fx.binder.cache().blueprint_count(), 2);
    assert_eq!(fx.binder.release_all(), 0);
    assert_eq!(fx.loader.stats().open_handles, 0);
}

#[test]
fn test_dropping_last_reference_closes_library() {
    let fx = Fixture::new();
    let instance = fx
        .binder
        .resolve(&calc_interface(), &fx.library, &BindingConfig::default())
        .unwrap();
    let identifier = instance.identifier().clone();
    drop(instance);
    assert_eq!(fx.loader.stats().open_handles, 1);

    fx.binder.release(&identifier);
    assert_eq!(fx.loader.stats().open_handles, 0);
}

nativebind::native_interface! {
    /// Typed view over the calc fixture.
    pub struct Calc {
        fn calc_add(a: i32, b: i32) -> i32;
        #[symbol = "calc_scale"]
        fn scale(value: f64, factor: f32) -> f64;
        fn calc_name() -> String;
        #[symbol = "calc_get_width"]
        fn width() -> i32;
    }
}

#[test]
fn test_typed_interface() {
    let fx = Fixture::new();
    let calc: Calc<StaticLoader> = fx
        .binder
        .resolve_interface(&fx.library, &BindingConfig::default())
        .unwrap();

    assert_eq!(calc.calc_add(40, 2).unwrap(), 42);
    assert_eq!(calc.scale(2.0, 0.5).unwrap(), 1.0);
    assert_eq!(calc.calc_name().unwrap(), "calc");
    assert!(calc.width().is_ok());

    let again: Calc<StaticLoader> = fx
        .binder
        .resolve_interface(&fx.library, &BindingConfig::default())
        .unwrap();
    assert!(Arc::ptr_eq(calc.instance(), again.instance()));

    fx.binder.release(calc.instance().identifier());
    assert!(matches!(calc.calc_add(1, 1), Err(BindingError::Disposed { .. })));
}
