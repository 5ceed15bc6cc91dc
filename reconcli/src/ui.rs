use console::{style, Term};
use std::{
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

const SPINNER_FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Braille spinner on stderr with a `done/total` counter.
///
/// Output written through [`Spinner::print`] shares a lock with the frame
/// loop, so reports never land in the middle of a spinner line.
pub struct Spinner {
    running: Arc<AtomicBool>,
    done: Arc<AtomicUsize>,
    lock: Arc<Mutex<()>>,
    enabled: bool,
    handle: Option<tokio::task::JoinHandle<()>>,
}

impl Spinner {
    pub fn start(message: String, total: usize, enabled: bool) -> Self {
        let running = Arc::new(AtomicBool::new(enabled));
        let done = Arc::new(AtomicUsize::new(0));
        let lock = Arc::new(Mutex::new(()));

        let handle = enabled.then(|| {
            let running = Arc::clone(&running);
            let done = Arc::clone(&done);
            let lock = Arc::clone(&lock);

            tokio::spawn(async move {
                let term = Term::stderr();
                let mut idx = 0usize;
                while running.load(Ordering::Relaxed) {
                    if let Ok(_guard) = lock.lock() {
                        let frame = SPINNER_FRAMES[idx % SPINNER_FRAMES.len()];
                        let _ = term.clear_line();
                        let _ = term.write_str(&format!(
                            "{} {} ({}/{})",
                            style(frame).cyan(),
                            message,
                            done.load(Ordering::Relaxed),
                            total
                        ));
                    }
                    idx += 1;
                    tokio::time::sleep(Duration::from_millis(80)).await;
                }
                let _ = term.clear_line();
            })
        });

        Self {
            running,
            done,
            lock,
            enabled,
            handle,
        }
    }

    /// Print `text` to stdout and count one finished item.
    pub fn print(&self, text: &str) {
        let _guard = self.lock.lock();
        if self.enabled {
            let _ = Term::stderr().clear_line();
        }
        print!("{}", text);
        self.done.fetch_add(1, Ordering::Relaxed);
    }

    pub async fn stop(mut self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(h) = self.handle.take() {
            let _ = h.await;
        }
    }
}
