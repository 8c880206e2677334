//! The process-wide registry is built once from the environment

use rivet_log::{Registry, LOG_PATH_VAR};
use std::sync::Barrier;
use std::thread;

#[test]
fn test_instance_is_shared_across_threads() {
    let dir = std::env::temp_dir().join(format!("rivet-log-instance-{}", std::process::id()));
    std::env::set_var(LOG_PATH_VAR, &dir);

    let threads = 12;
    let barrier = Barrier::new(threads);
    let addresses: Vec<usize> = thread::scope(|s| {
        let handles: Vec<_> = (0..threads)
            .map(|_| {
                s.spawn(|| {
                    barrier.wait();
                    Registry::instance() as *const Registry as usize
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert!(addresses.windows(2).all(|w| w[0] == w[1]));

    let registry = Registry::instance();
    assert_eq!(registry.config().base_dir(), dir.as_path());
    assert_eq!(registry.get(rivet_log::ChannelName::Bow).file_path(), dir.join("bow.log"));
    // Lazy open: building the registry touches no files
    assert!(!dir.join("bow.log").exists());
}
