//! Liveness heartbeat for long foreground operations
//!
//! External watchers (CI, cron supervisors) kill jobs that go quiet. The
//! heartbeat runs a detached background thread that emits a monotonically
//! increasing tick while the wrapped action runs on the caller's thread. The
//! thread is signalled and abandoned on completion, never joined; ticks are
//! unordered with respect to the action's internal steps and have no effect
//! on its result.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

/// Run `action`, printing a tick line every `interval` until it returns
pub fn with_heartbeat<R>(interval: Duration, label: &str, action: impl FnOnce() -> R) -> R {
  let label = label.to_string();
  with_heartbeat_sink(
    interval,
    move |tick| println!("⏳ {} still running (tick {})", label, tick),
    action,
  )
}

/// Heartbeat with a caller-supplied tick sink; `with_heartbeat` feeds stdout
pub fn with_heartbeat_sink<R>(
  interval: Duration,
  sink: impl Fn(u64) + Send + 'static,
  action: impl FnOnce() -> R,
) -> R {
  let stop = Arc::new(AtomicBool::new(false));
  let stop_signal = Arc::clone(&stop);

  // Detached on purpose: the thread checks the flag after every sleep and
  // exits on its own once the action is done
  thread::spawn(move || {
    let mut tick: u64 = 0;
    loop {
      thread::sleep(interval);
      if stop_signal.load(Ordering::Acquire) {
        break;
      }
      tick += 1;
      sink(tick);
    }
  });

  let result = action();
  stop.store(true, Ordering::Release);
  result
}
