use super::*;
use crate::ErrorCode;
use pretty_assertions::assert_eq;

#[test]
fn buffer_captures_per_channel() {
    let router = buffer_router();
    assert!(router.write(STDOUT, "hello ").is_ok());
    assert!(router.write(STDOUT, "world").is_ok());
    assert!(router.write(WDISPLAY, "shown").is_ok());
    assert_eq!(router.output(STDOUT), "hello world");
    assert_eq!(router.output(WDISPLAY), "shown");
    assert_eq!(router.output(WERROR), "");
}

#[test]
fn t_is_an_alias_for_stdout() {
    let router = buffer_router();
    assert!(router.write("t", "via alias").is_ok());
    assert_eq!(router.output(STDOUT), "via alias");
}

#[test]
fn unknown_logical_name_is_rejected() {
    let router = buffer_router();
    assert_eq!(
        router.write("nowhere", "lost"),
        Err(RouterError::UnknownLogicalName("nowhere".to_string()))
    );
    assert!(!router.recognizes("nowhere"));
}

#[test]
fn added_channels_are_recognized() {
    let router = BufferRouter::new();
    router.add_channel("log");
    let router = RouterImpl::Buffer(router);
    assert!(router.recognizes("log"));
    assert!(router.write("log", "entry").is_ok());
    assert_eq!(router.output("log"), "entry");
}

#[test]
fn emit_routes_by_severity() {
    let router = buffer_router();
    router.emit(&Diagnostic::error(ErrorCode::ArgType, "bad type"));
    router.emit(&Diagnostic::warning(ErrorCode::DivideByZero, "careful"));
    assert_eq!(router.output(WERROR), "[ARGACCES5] bad type\n");
    assert_eq!(router.output(WWARNING), "[PRNTUTIL7] WARNING: careful\n");
    assert_eq!(router.diagnostics().len(), 2);
}

#[test]
fn clear_resets_capture() {
    let router = buffer_router();
    router.emit(&Diagnostic::error(ErrorCode::ArgType, "bad type"));
    router.clear();
    assert_eq!(router.output(WERROR), "");
    assert!(router.diagnostics().is_empty());
}

#[test]
fn silent_router_accepts_standard_names_only() {
    let router = silent_router();
    assert!(router.write(STDOUT, "dropped").is_ok());
    assert!(router.write("custom", "dropped").is_err());
    assert_eq!(router.output(STDOUT), "");
}
