// Lives in its own test binary: the handlers it installs are process-wide.

use ddc_client::Shutdown;
use signal_hook::consts::SIGTERM;
use std::time::{Duration, Instant};

#[test]
fn sigterm_triggers_shutdown() {
    let shutdown = Shutdown::new();
    shutdown.trigger_on_signals().expect("install handlers");
    assert!(!shutdown.is_triggered());

    signal_hook::low_level::raise(SIGTERM).expect("raise SIGTERM");

    let deadline = Instant::now() + Duration::from_secs(5);
    while !shutdown.is_triggered() && Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(10));
    }
    assert!(shutdown.is_triggered());
}
