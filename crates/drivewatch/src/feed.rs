//! Live alert feed: tails a JSONL file and turns each new line into
//! [`Msg::AlertReceived`].

use std::collections::hash_map::DefaultHasher;
use std::fs::File;
use std::hash::{Hash, Hasher};
use std::io::{BufRead, BufReader, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::Duration;

use dw_runtime::{StopSignal, SubId, Subscription};
use tracing::{debug, info, warn};

use crate::domain::SafetyAlert;
use crate::msg::Msg;

const FEED_TAG: u64 = 0x4645_4544_0000_0000; // "FEED"

pub fn parse_line(line: &str) -> Result<SafetyAlert, serde_json::Error> {
    serde_json::from_str(line)
}

pub struct AlertFeed {
    path: PathBuf,
    poll_interval: Duration,
    from_start: bool,
}

impl AlertFeed {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            poll_interval: Duration::from_millis(500),
            from_start: false,
        }
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Replay lines already in the file instead of starting at its end.
    pub fn from_start(mut self) -> Self {
        self.from_start = true;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Waits for the file to exist. `None` means a stop was requested.
    fn open(&self, stop: &StopSignal) -> Option<(BufReader<File>, bool)> {
        let mut existed = true;
        loop {
            match File::open(&self.path) {
                Ok(file) => return Some((BufReader::new(file), existed)),
                Err(err) => {
                    if existed {
                        debug!(path = %self.path.display(), %err, "feed not available yet");
                    }
                    existed = false;
                    if stop.wait_timeout(self.poll_interval) {
                        return None;
                    }
                }
            }
        }
    }
}

impl Subscription<Msg> for AlertFeed {
    fn id(&self) -> SubId {
        let mut hasher = DefaultHasher::new();
        self.path.hash(&mut hasher);
        FEED_TAG ^ (hasher.finish() >> 16)
    }

    fn run(&self, sender: mpsc::Sender<Msg>, stop: StopSignal) {
        let Some((mut reader, existed)) = self.open(&stop) else {
            return;
        };
        // A file that appeared after startup is new in its entirety.
        if existed && !self.from_start && reader.seek(SeekFrom::End(0)).is_err() {
            warn!(path = %self.path.display(), "failed to seek feed to end");
        }
        info!(path = %self.path.display(), "tailing alert feed");

        let mut line = String::new();
        loop {
            match reader.read_line(&mut line) {
                Ok(0) => {
                    if stop.wait_timeout(self.poll_interval) {
                        break;
                    }
                    rewind_if_truncated(&mut reader, &self.path);
                }
                Ok(_) if !line.ends_with('\n') => {
                    // Partial write; the rest arrives on a later read.
                    if stop.wait_timeout(self.poll_interval) {
                        break;
                    }
                }
                Ok(_) => {
                    let trimmed = line.trim();
                    if !trimmed.is_empty() {
                        match parse_line(trimmed) {
                            Ok(alert) => {
                                if sender.send(Msg::AlertReceived(alert)).is_err() {
                                    break;
                                }
                            }
                            Err(err) => warn!(%err, line = trimmed, "skipping malformed feed line"),
                        }
                    }
                    line.clear();
                }
                Err(err) => {
                    warn!(path = %self.path.display(), %err, "feed read failed");
                    line.clear();
                    if stop.wait_timeout(self.poll_interval * 2) {
                        break;
                    }
                }
            }
        }
    }
}

fn rewind_if_truncated(reader: &mut BufReader<File>, path: &Path) {
    let Ok(pos) = reader.stream_position() else {
        return;
    };
    let Ok(meta) = std::fs::metadata(path) else {
        return;
    };
    if meta.len() < pos {
        info!(path = %path.display(), "feed truncated, rewinding");
        let _ = reader.seek(SeekFrom::Start(0));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{EventKind, Severity};
    use std::io::Write;
    use std::time::Instant;

    fn recv_alert(rx: &mpsc::Receiver<Msg>) -> Option<SafetyAlert> {
        match rx.recv_timeout(Duration::from_secs(5)) {
            Ok(Msg::AlertReceived(alert)) => Some(alert),
            _ => None,
        }
    }

    #[test]
    fn parse_line_applies_defaults() {
        let alert = parse_line(r#"{"id":5,"driver_id":3,"kind":"drowsiness","location":"A1"}"#)
            .expect("valid line");
        assert_eq!(alert.kind, EventKind::Drowsiness);
        assert_eq!(alert.severity, Severity::Critical);
        assert_eq!(alert.location, "A1");
        assert!(parse_line("{not json").is_err());
        assert!(parse_line(r#"{"id":1}"#).is_err());
    }

    #[test]
    fn id_depends_on_path() {
        assert_eq!(AlertFeed::new("/a.jsonl").id(), AlertFeed::new("/a.jsonl").id());
        assert_ne!(AlertFeed::new("/a.jsonl").id(), AlertFeed::new("/b.jsonl").id());
    }

    #[test]
    fn tails_lines_and_skips_malformed() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("feed.jsonl");
        let mut file = File::create(&path).expect("create");
        writeln!(file, r#"{{"id":1,"driver_id":1,"kind":"smoking"}}"#).expect("write");
        writeln!(file, "garbage").expect("write");
        writeln!(file, r#"{{"id":2,"driver_id":1,"kind":"alcohol"}}"#).expect("write");
        file.flush().expect("flush");

        let feed = AlertFeed::new(&path)
            .poll_interval(Duration::from_millis(10))
            .from_start();
        let (tx, rx) = mpsc::channel();
        let stop = StopSignal::new();
        let thread_stop = stop.clone();
        let handle = std::thread::spawn(move || feed.run(tx, thread_stop));

        assert_eq!(recv_alert(&rx).map(|a| a.id), Some(1));
        assert_eq!(recv_alert(&rx).map(|a| a.id), Some(2));

        writeln!(file, r#"{{"id":3,"driver_id":2,"kind":"speeding"}}"#).expect("write");
        file.flush().expect("flush");
        assert_eq!(recv_alert(&rx).map(|a| a.kind), Some(EventKind::Speeding));

        stop.stop();
        handle.join().expect("join");
    }

    #[test]
    fn waits_for_missing_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("later.jsonl");
        let feed = AlertFeed::new(&path)
            .poll_interval(Duration::from_millis(10))
            .from_start();
        let (tx, rx) = mpsc::channel();
        let stop = StopSignal::new();
        let thread_stop = stop.clone();
        let handle = std::thread::spawn(move || feed.run(tx, thread_stop));

        std::thread::sleep(Duration::from_millis(30));
        let mut file = File::create(&path).expect("create");
        writeln!(file, r#"{{"id":9,"driver_id":1,"kind":"seatbelt"}}"#).expect("write");
        file.flush().expect("flush");
        assert_eq!(recv_alert(&rx).map(|a| a.id), Some(9));

        stop.stop();
        handle.join().expect("join");
    }

    #[test]
    fn stops_promptly_while_waiting() {
        let feed = AlertFeed::new("/nonexistent/drivewatch/feed.jsonl")
            .poll_interval(Duration::from_secs(30));
        let (tx, _rx) = mpsc::channel();
        let stop = StopSignal::new();
        let thread_stop = stop.clone();
        let started = Instant::now();
        let handle = std::thread::spawn(move || feed.run(tx, thread_stop));
        stop.stop();
        handle.join().expect("join");
        assert!(started.elapsed() < Duration::from_secs(5));
    }
}
