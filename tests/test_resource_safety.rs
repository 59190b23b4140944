//! Repeated script requests must not leak child processes or descriptors.
//!
//! Kept alone in its own test binary so no other test opens descriptors or
//! spawns processes concurrently.

#![cfg(target_os = "linux")]

mod common;

use common::site_with;

fn open_descriptors() -> usize {
    std::fs::read_dir("/proc/self/fd").unwrap().count()
}

/// Children of this process, zombies included.
fn live_children() -> usize {
    let me = std::process::id().to_string();

    std::fs::read_dir("/proc")
        .unwrap()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_name().to_string_lossy().bytes().all(|b| b.is_ascii_digit()))
        .filter_map(|entry| std::fs::read_to_string(entry.path().join("stat")).ok())
        .filter(|stat| {
            // Fields after the parenthesised command: state, ppid, ...
            stat.rsplit_once(')')
                .and_then(|(_, rest)| rest.split_whitespace().nth(1))
                .is_some_and(|ppid| ppid == me)
        })
        .count()
}

#[tokio::test]
async fn test_script_requests_release_children_and_pipes() {
    let site = site_with(
        &[("ok.sh", b"printf OK"), ("fail.sh", b"exit 7")],
        |_| {},
    );

    // First spawn sets up the runtime's child-reaping machinery.
    assert_eq!(site.get("/ok.sh").await.body, b"OK".to_vec());
    let baseline = open_descriptors();
    assert_eq!(live_children(), 0);

    for i in 0..100 {
        let target = if i % 2 == 0 { "/ok.sh" } else { "/fail.sh" };
        let reply = site.get(target).await;
        assert_eq!(reply.status, 200);

        assert_eq!(live_children(), 0, "child left behind after request {i}");
        assert_eq!(open_descriptors(), baseline, "descriptor leaked by request {i}");
    }
}
