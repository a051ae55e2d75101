use super::*;

#[test]
fn second_init_keeps_first_subscriber() {
    let config = EngineConfig::default();
    init(&config);
    assert!(!init(&config));
}

#[test]
fn panic_hook_installs_once_and_still_unwinds() {
    install_panic_hook();
    install_panic_hook();
    assert!(PANIC_HOOK.is_completed());

    let caught = panic::catch_unwind(|| panic!("clipper blew up"));
    assert!(caught.is_err());
}
