use std::fmt;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Sender};
use std::sync::Mutex;
use std::thread::{self, JoinHandle};

use deck_core::BackgroundExecutor;
use log::{debug, error, warn};

type Job = Box<dyn FnOnce() + Send + 'static>;

/// One background thread running jobs in submission order.
///
/// Repository reads and writes go here so the UI thread never blocks on
/// files. Jobs submitted after [`shutdown`](Self::shutdown) run on the
/// submitting thread.
pub struct IoWorker {
    name: String,
    sender: Mutex<Option<Sender<Job>>>,
    thread: Mutex<Option<JoinHandle<()>>>,
}

impl IoWorker {
    pub fn spawn(name: impl Into<String>) -> io::Result<Self> {
        let name = name.into();
        let (sender, receiver) = mpsc::channel::<Job>();
        let thread = thread::Builder::new().name(name.clone()).spawn(move || {
            for job in receiver {
                if panic::catch_unwind(AssertUnwindSafe(job)).is_err() {
                    error!("background job panicked");
                }
            }
        })?;
        debug!("started io worker `{name}`");
        Ok(Self {
            name,
            sender: Mutex::new(Some(sender)),
            thread: Mutex::new(Some(thread)),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Finishes the queued jobs and stops the thread.
    pub fn shutdown(&self) {
        drop(self.sender.lock().unwrap().take());
        let thread = self.thread.lock().unwrap().take();
        if let Some(thread) = thread {
            if thread.join().is_err() {
                error!("io worker `{}` terminated abnormally", self.name);
            }
            debug!("stopped io worker `{}`", self.name);
        }
    }
}

impl BackgroundExecutor for IoWorker {
    fn execute(&self, job: Job) {
        let rejected = match self.sender.lock().unwrap().as_ref() {
            Some(sender) => sender.send(job).err().map(|err| err.0),
            None => Some(job),
        };
        if let Some(job) = rejected {
            warn!("io worker `{}` is stopped; running job inline", self.name);
            job();
        }
    }
}

impl Drop for IoWorker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl fmt::Debug for IoWorker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IoWorker")
            .field("name", &self.name)
            .field("running", &self.sender.lock().unwrap().is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;

    #[test]
    fn jobs_run_in_order_on_the_worker_thread() {
        let worker = IoWorker::spawn("deck-io-test").unwrap();
        let log = Arc::new(Mutex::new(Vec::new()));
        for index in 0..20 {
            let log = Arc::clone(&log);
            worker.execute(Box::new(move || {
                let thread = thread::current().name().map(str::to_owned);
                log.lock().unwrap().push((index, thread));
            }));
        }
        worker.shutdown();
        let log = log.lock().unwrap();
        assert_eq!(log.iter().map(|(index, _)| *index).collect::<Vec<_>>(), (0..20).collect::<Vec<_>>());
        assert!(log
            .iter()
            .all(|(_, thread)| thread.as_deref() == Some("deck-io-test")));
    }

    #[test]
    fn panicking_job_does_not_stop_the_worker() {
        let worker = IoWorker::spawn("deck-io-panic").unwrap();
        let ran = Arc::new(Mutex::new(false));
        worker.execute(Box::new(|| panic!("boom")));
        worker.execute(Box::new({
            let ran = Arc::clone(&ran);
            move || *ran.lock().unwrap() = true
        }));
        worker.shutdown();
        assert!(*ran.lock().unwrap());
    }

    #[test]
    fn stopped_worker_runs_jobs_inline() {
        let worker = IoWorker::spawn("deck-io-stopped").unwrap();
        worker.shutdown();
        let caller = thread::current().id();
        let ran_on = Arc::new(Mutex::new(None));
        worker.execute(Box::new({
            let ran_on = Arc::clone(&ran_on);
            move || *ran_on.lock().unwrap() = Some(thread::current().id())
        }));
        assert_eq!(*ran_on.lock().unwrap(), Some(caller));
    }
}
