use super::*;
use crate::foundation::core::{PixelFormat, Vec2f, Vec2i};
use std::time::Duration;

fn tiny_fb() -> Arc<DisplayFramebuffer> {
    Arc::new(
        DisplayFramebuffer::new(
            Vec2i::new(4, 4),
            Vec2i::default(),
            Vec2f::ONE,
            PixelFormat::None,
            std::iter::empty(),
        )
        .unwrap(),
    )
}

#[test]
fn insert_get_require_release() {
    let table = FramebufferTable::new();
    assert!(table.is_empty());
    table.insert(FbHandle(1), tiny_fb()).unwrap();
    assert_eq!(table.len(), 1);
    assert!(table.get(FbHandle(1)).is_some());
    assert!(matches!(
        table.insert(FbHandle(1), tiny_fb()),
        Err(WallError::Protocol(_))
    ));
    assert!(matches!(
        table.require(FbHandle(2)),
        Err(WallError::Protocol(_))
    ));
    assert!(table.release(FbHandle(1)).is_some());
    assert!(table.get(FbHandle(1)).is_none());
}

#[test]
fn wait_get_blocks_until_created() {
    let table = FramebufferTable::new();
    let waiter = {
        let table = table.clone();
        std::thread::spawn(move || table.wait_get(FbHandle(3)).is_some())
    };
    std::thread::sleep(Duration::from_millis(30));
    assert!(!waiter.is_finished());
    table.insert(FbHandle(3), tiny_fb()).unwrap();
    assert!(waiter.join().unwrap());
}

#[test]
fn wait_get_returns_none_after_release_or_close() {
    let table = FramebufferTable::new();
    table.insert(FbHandle(1), tiny_fb()).unwrap();
    table.release(FbHandle(1));
    assert!(table.wait_get(FbHandle(1)).is_none());

    let waiter = {
        let table = table.clone();
        std::thread::spawn(move || table.wait_get(FbHandle(9)))
    };
    table.close();
    assert!(waiter.join().unwrap().is_none());
    assert!(table.is_closed());
}

#[test]
fn released_history_is_bounded_and_dropped_on_close() {
    let table = FramebufferTable::new();
    let churn = RELEASED_HISTORY as i64 + 40;
    for h in 0..churn {
        table.insert(FbHandle(h), tiny_fb()).unwrap();
        table.release(FbHandle(h));
    }
    {
        let st = table.shared.state.lock();
        assert_eq!(st.released.len(), RELEASED_HISTORY);
        assert!(!st.released.contains(&FbHandle(0)));
        assert!(st.released.contains(&FbHandle(churn - 1)));
    }
    // Most recent releases still resolve without blocking.
    assert!(table.wait_get(FbHandle(churn - 1)).is_none());

    // Re-creating a handle forgets its release, releasing it twice keeps one entry.
    table.insert(FbHandle(churn - 1), tiny_fb()).unwrap();
    assert!(!table.shared.state.lock().released.contains(&FbHandle(churn - 1)));
    table.release(FbHandle(churn - 1));
    table.release(FbHandle(churn - 1));
    let copies = table
        .shared
        .state
        .lock()
        .released
        .iter()
        .filter(|h| **h == FbHandle(churn - 1))
        .count();
    assert_eq!(copies, 1);

    table.close();
    assert!(table.shared.state.lock().released.is_empty());
    assert!(table.wait_get(FbHandle(churn - 1)).is_none());
}
