use crate::api::{AnalysisBackend, ApiError};
use crate::app::session::{AnalysisState, AnalysisTicket, Session};
use crate::config::LiniaConfig;
use crate::report::{AnalysisResult, ResultView};
use crate::upload::{mime_for_path, DataUrlEncoder, ImageFile, MAX_FILES, SUPPORTED_IMAGE_TYPES};
use std::path::{Path, PathBuf};
use std::sync::{mpsc, Arc};

/// Whether we're navigating or typing a path
#[derive(Debug, Clone, PartialEq)]
pub enum InputMode {
    Normal,
    PathInput,
}

/// Which pane receives navigation keys
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Files,
    Result,
}

// ── Overlay types ──

/// A directory entry for the image browser
#[derive(Debug, Clone, PartialEq)]
pub struct DirEntry {
    pub name: String,
    pub is_dir: bool,
    pub is_image: bool,
}

/// Active overlay popup state
#[derive(Debug, Clone)]
pub enum OverlayData {
    FileBrowser {
        current_path: PathBuf,
        entries: Vec<DirEntry>,
        selected: usize,
        /// Images picked so far, in pick order
        marked: Vec<PathBuf>,
    },
}

/// Outcome of a background request, tagged with its request id
type WorkerMessage = (u64, Result<AnalysisResult, ApiError>);

// ── Main App State ──

pub struct App {
    pub session: Session,

    /// Built once per successful analysis
    pub result_view: Option<ResultView>,

    pub input_mode: InputMode,

    /// Text typed in path input mode
    pub input_buffer: String,

    pub focus: Focus,

    /// Cursor in the selected-files list
    pub selected_file: usize,

    /// Should the app quit?
    pub should_quit: bool,

    /// Active overlay popup (None = no overlay)
    pub overlay: Option<OverlayData>,

    /// Last notification message
    pub notification: Option<String>,

    /// Ticks since last notification (for auto-clearing)
    pub notification_ticks: u8,

    /// Animation counter while a request is in flight
    pub spinner: usize,

    pub config: LiniaConfig,

    backend: Arc<dyn AnalysisBackend>,
    worker_tx: mpsc::Sender<WorkerMessage>,
    worker_rx: mpsc::Receiver<WorkerMessage>,
}

impl App {
    pub fn new(config: LiniaConfig, backend: Arc<dyn AnalysisBackend>) -> Self {
        let (worker_tx, worker_rx) = mpsc::channel();
        App {
            session: Session::new(),
            result_view: None,
            input_mode: InputMode::Normal,
            input_buffer: String::new(),
            focus: Focus::Files,
            selected_file: 0,
            should_quit: false,
            overlay: None,
            notification: None,
            notification_ticks: 0,
            spinner: 0,
            config,
            backend,
            worker_tx,
            worker_rx,
        }
    }

    // ── Selection ──

    /// Replace the selection with exactly these paths (CLI arguments).
    pub fn select_paths(&mut self, paths: &[PathBuf]) {
        let candidates = paths.iter().map(|p| describe(p)).collect();
        self.apply_selection(candidates);
    }

    /// Append to the current selection, keeping at most five files.
    pub fn add_files(&mut self, paths: &[PathBuf]) {
        if paths.is_empty() {
            return;
        }
        let mut candidates: Vec<ImageFile> = self.session.files().to_vec();
        candidates.extend(paths.iter().map(|p| describe(p)));
        if candidates.len() > MAX_FILES {
            self.notify(&format!("최대 {}개까지만 추가됩니다", MAX_FILES));
            candidates.truncate(MAX_FILES);
        }
        self.apply_selection(candidates);
    }

    fn apply_selection(&mut self, candidates: Vec<ImageFile>) {
        self.session.select_files(candidates, &DataUrlEncoder);
        self.selected_file = 0;
        self.sync_result_view();
    }

    pub fn remove_selected_file(&mut self) {
        self.session.remove_file(self.selected_file);
        let len = self.session.files().len();
        if self.selected_file >= len {
            self.selected_file = len.saturating_sub(1);
        }
    }

    pub fn reset(&mut self) {
        self.session.reset();
        self.selected_file = 0;
        self.focus = Focus::Files;
        self.sync_result_view();
        self.notify("초기화되었습니다");
    }

    pub fn next_file(&mut self) {
        if self.selected_file + 1 < self.session.files().len() {
            self.selected_file += 1;
        }
    }

    pub fn prev_file(&mut self) {
        self.selected_file = self.selected_file.saturating_sub(1);
    }

    // ── Analysis ──

    /// Kick off an analysis of the current files on a worker thread.
    pub fn start_analysis(&mut self) {
        match self.session.begin_analysis() {
            Some(ticket) => {
                self.sync_result_view();
                self.spawn_request(ticket, false);
            }
            None => self.sync_result_view(),
        }
    }

    /// Fetch the service's sample report on a worker thread.
    pub fn start_sample(&mut self) {
        let ticket = self.session.begin_sample();
        self.sync_result_view();
        self.spawn_request(ticket, true);
    }

    fn spawn_request(&mut self, ticket: AnalysisTicket, sample: bool) {
        let backend = Arc::clone(&self.backend);
        let tx = self.worker_tx.clone();
        self.spinner = 0;
        std::thread::spawn(move || {
            let outcome = if sample {
                backend.sample()
            } else {
                backend.analyze(&ticket.files)
            };
            let _ = tx.send((ticket.id, outcome));
        });
    }

    /// Drain finished requests (non-blocking). Returns true if the state changed.
    pub fn poll_worker(&mut self) -> bool {
        let mut changed = false;
        while let Ok((id, outcome)) = self.worker_rx.try_recv() {
            if !self.session.finish_analysis(id, outcome) {
                continue;
            }
            changed = true;
            self.result_view = None;
            self.sync_result_view();
            match self.session.analysis() {
                AnalysisState::Success(result) => {
                    let secs = result.processing_time();
                    self.focus = Focus::Result;
                    self.notify(&format!("✓ 분석 완료 ({:.1}초)", secs));
                }
                AnalysisState::Error(_) => self.notify("✗ 분석 실패"),
                _ => {}
            }
        }
        changed
    }

    /// Keep `result_view` in step with the session: built when a result
    /// appears, dropped when it goes away.
    fn sync_result_view(&mut self) {
        match self.session.analysis().data() {
            Some(result) => {
                if self.result_view.is_none() {
                    self.result_view = Some(ResultView::for_result(result));
                }
            }
            None => {
                self.result_view = None;
                self.focus = Focus::Files;
            }
        }
    }

    pub fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            Focus::Files if self.result_view.is_some() => Focus::Result,
            _ => Focus::Files,
        };
    }

    // ── Path input ──

    pub fn start_path_input(&mut self) {
        self.input_mode = InputMode::PathInput;
        self.input_buffer.clear();
    }

    pub fn cancel_path_input(&mut self) {
        self.input_mode = InputMode::Normal;
        self.input_buffer.clear();
    }

    /// Whitespace-separated paths or glob patterns are added to the selection.
    pub fn submit_path_input(&mut self) {
        let args: Vec<String> = self.input_buffer.split_whitespace().map(str::to_string).collect();
        self.cancel_path_input();
        self.add_files(&expand_paths(&args));
    }

    // ── Overlay: File browser ──

    /// Open the image browser in the current working directory
    pub fn open_file_browser(&mut self) {
        let start = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("/"));
        self.open_file_browser_at(start);
    }

    pub fn open_file_browser_at(&mut self, path: PathBuf) {
        let entries = read_directory(&path);
        self.overlay = Some(OverlayData::FileBrowser {
            current_path: path,
            entries,
            selected: 0,
            marked: Vec::new(),
        });
    }

    /// Directory shown by the browser, if open (the watcher follows it)
    pub fn browser_dir(&self) -> Option<&Path> {
        match &self.overlay {
            Some(OverlayData::FileBrowser { current_path, .. }) => Some(current_path.as_path()),
            None => None,
        }
    }

    /// Re-read the browser's directory, keeping the cursor in range
    pub fn refresh_browser(&mut self) {
        if let Some(OverlayData::FileBrowser { current_path, entries, selected, .. }) = &mut self.overlay {
            *entries = read_directory(current_path);
            if *selected >= entries.len() {
                *selected = entries.len().saturating_sub(1);
            }
        }
    }

    pub fn overlay_next(&mut self) {
        if let Some(OverlayData::FileBrowser { entries, selected, .. }) = &mut self.overlay {
            if *selected + 1 < entries.len() {
                *selected += 1;
            }
        }
    }

    pub fn overlay_prev(&mut self) {
        if let Some(OverlayData::FileBrowser { selected, .. }) = &mut self.overlay {
            *selected = selected.saturating_sub(1);
        }
    }

    /// Enter: descend into a directory, or mark/unmark an image
    pub fn overlay_select(&mut self) {
        let Some(OverlayData::FileBrowser { current_path, entries, selected, marked }) = &mut self.overlay
        else {
            return;
        };
        let Some(entry) = entries.get(*selected) else { return };
        let full_path = current_path.join(&entry.name);
        if entry.is_dir {
            *entries = read_directory(&full_path);
            *current_path = full_path;
            *selected = 0;
        } else if entry.is_image {
            if let Some(pos) = marked.iter().position(|p| *p == full_path) {
                marked.remove(pos);
            } else {
                marked.push(full_path);
            }
        }
    }

    /// Go up one directory in the browser
    pub fn overlay_go_up(&mut self) {
        if let Some(OverlayData::FileBrowser { current_path, entries, selected, .. }) = &mut self.overlay {
            if let Some(parent) = current_path.parent().map(Path::to_path_buf) {
                *entries = read_directory(&parent);
                *current_path = parent;
                *selected = 0;
            }
        }
    }

    /// Add the marked images (or the image under the cursor) and close.
    pub fn overlay_confirm(&mut self) {
        let Some(OverlayData::FileBrowser { current_path, entries, selected, marked }) = self.overlay.take()
        else {
            return;
        };
        let picks = if marked.is_empty() {
            entries
                .get(selected)
                .filter(|e| e.is_image)
                .map(|e| vec![current_path.join(&e.name)])
                .unwrap_or_default()
        } else {
            marked
        };
        self.add_files(&picks);
    }

    pub fn overlay_close(&mut self) {
        self.overlay = None;
    }

    // ── Notifications ──

    pub fn notify(&mut self, msg: &str) {
        self.notification = Some(msg.to_string());
        self.notification_ticks = 0;
    }

    /// Called every event-loop iteration (~100ms)
    pub fn tick(&mut self) {
        if self.session.is_loading() {
            self.spinner = self.spinner.wrapping_add(1);
        }
        if self.notification.is_some() {
            self.notification_ticks += 1;
            if self.notification_ticks > 20 {
                self.notification = None;
                self.notification_ticks = 0;
            }
        }
    }
}

/// Describe a path for selection. Unreadable paths still become candidates
/// so that validation reports them by position.
fn describe(path: &Path) -> ImageFile {
    ImageFile::open(path).unwrap_or_else(|e| {
        log::warn!("{:#}", e);
        ImageFile::new(path, 0)
    })
}

/// Expand glob patterns. Patterns matching nothing are kept as literal paths.
pub fn expand_paths(args: &[String]) -> Vec<PathBuf> {
    let mut paths = Vec::new();
    for arg in args {
        let matches: Vec<PathBuf> = glob::glob(arg)
            .map(|found| found.flatten().collect())
            .unwrap_or_default();
        if matches.is_empty() {
            paths.push(PathBuf::from(arg));
        } else {
            paths.extend(matches);
        }
    }
    paths
}

/// Read directory entries, sorted: directories first, then files. Images are flagged.
fn read_directory(path: &Path) -> Vec<DirEntry> {
    let mut entries = Vec::new();
    if let Ok(read_dir) = std::fs::read_dir(path) {
        for entry in read_dir.flatten() {
            let name = entry.file_name().to_string_lossy().to_string();
            if name.starts_with('.') {
                continue;
            }
            if let Ok(metadata) = entry.metadata() {
                let is_dir = metadata.is_dir();
                let is_image = !is_dir && SUPPORTED_IMAGE_TYPES.contains(&mime_for_path(&entry.path()));
                entries.push(DirEntry { name, is_dir, is_image });
            }
        }
    }
    entries.sort_by(|a, b| match (a.is_dir, b.is_dir) {
        (true, false) => std::cmp::Ordering::Less,
        (false, true) => std::cmp::Ordering::Greater,
        _ => a.name.cmp(&b.name),
    });
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::session::Status;
    use crate::report::model::fixtures::structured_json;
    use std::time::{Duration, Instant};

    struct FixedBackend(Result<AnalysisResult, ApiError>);

    impl AnalysisBackend for FixedBackend {
        fn analyze(&self, _files: &[ImageFile]) -> Result<AnalysisResult, ApiError> {
            self.0.clone()
        }

        fn sample(&self) -> Result<AnalysisResult, ApiError> {
            self.0.clone()
        }
    }

    fn app_with(outcome: Result<AnalysisResult, ApiError>) -> App {
        App::new(LiniaConfig::default(), Arc::new(FixedBackend(outcome)))
    }

    fn structured() -> AnalysisResult {
        AnalysisResult::from_value(structured_json()).unwrap()
    }

    fn write_pngs(dir: &Path, count: usize) -> Vec<PathBuf> {
        (0..count)
            .map(|i| {
                let path = dir.join(format!("shot{}.png", i));
                std::fs::write(&path, b"png").unwrap();
                path
            })
            .collect()
    }

    /// Poll until the worker reports or the deadline passes
    fn wait_for_worker(app: &mut App) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !app.poll_worker() && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(10));
        }
    }

    #[test]
    fn add_files_merges_and_truncates_to_five() {
        let dir = tempfile::tempdir().unwrap();
        let paths = write_pngs(dir.path(), 7);
        let mut app = app_with(Ok(structured()));

        app.add_files(&paths[..3]);
        assert_eq!(app.session.files().len(), 3);

        // 3 existing + 4 new = 7, truncated to the first 5
        app.add_files(&paths[3..]);
        let names: Vec<&str> = app.session.files().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["shot0.png", "shot1.png", "shot2.png", "shot3.png", "shot4.png"]);
        assert_eq!(app.session.upload().status, Status::Success);
    }

    #[test]
    fn select_paths_does_not_truncate() {
        let dir = tempfile::tempdir().unwrap();
        let paths = write_pngs(dir.path(), 6);
        let mut app = app_with(Ok(structured()));
        app.select_paths(&paths);
        assert_eq!(app.session.upload().status, Status::Error);
        assert_eq!(app.session.upload().error.as_deref(), Some("최대 5개의 파일만 업로드 가능합니다."));
    }

    #[test]
    fn missing_path_surfaces_as_indexed_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut paths = write_pngs(dir.path(), 1);
        paths.push(dir.path().join("missing.png"));
        let mut app = app_with(Ok(structured()));
        app.select_paths(&paths);
        let error = app.session.upload().error.clone().unwrap();
        assert!(error.starts_with("파일 2: "), "got {}", error);
    }

    #[test]
    fn analysis_runs_on_worker_and_builds_tabbed_view() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_with(Ok(structured()));
        app.add_files(&write_pngs(dir.path(), 2));

        app.start_analysis();
        assert!(app.session.is_loading());
        assert!(app.result_view.is_none());

        wait_for_worker(&mut app);
        assert!(app.result_view.as_ref().is_some_and(ResultView::is_tabbed));
        assert_eq!(app.focus, Focus::Result);
    }

    #[test]
    fn failed_analysis_keeps_files_and_shows_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_with(Err(ApiError::Timeout));
        app.add_files(&write_pngs(dir.path(), 1));
        app.start_analysis();
        wait_for_worker(&mut app);

        assert_eq!(
            app.session.analysis().error(),
            Some("요청 시간이 초과되었습니다. 다시 시도해 주세요.")
        );
        assert!(app.result_view.is_none());
        assert!(app.session.can_analyze());
    }

    #[test]
    fn reset_during_flight_drops_late_result() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_with(Ok(structured()));
        app.add_files(&write_pngs(dir.path(), 1));
        app.start_analysis();
        app.reset();

        std::thread::sleep(Duration::from_millis(100));
        assert!(!app.poll_worker());
        assert!(app.result_view.is_none());
        assert_eq!(*app.session.analysis(), AnalysisState::Idle);
    }

    #[test]
    fn sample_request_needs_no_files() {
        let mut app = app_with(Ok(structured()));
        app.start_sample();
        wait_for_worker(&mut app);
        assert!(app.result_view.is_some());
    }

    #[test]
    fn remove_selected_file_clamps_cursor() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_with(Ok(structured()));
        app.add_files(&write_pngs(dir.path(), 2));
        app.next_file();
        app.remove_selected_file();
        assert_eq!(app.selected_file, 0);
        assert_eq!(app.session.files().len(), 1);
    }

    #[test]
    fn browser_marks_images_and_confirms() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("a.png"), b"a").unwrap();
        std::fs::write(dir.path().join("b.jpg"), b"b").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"n").unwrap();

        let mut app = app_with(Ok(structured()));
        app.open_file_browser_at(dir.path().to_path_buf());
        match &app.overlay {
            Some(OverlayData::FileBrowser { entries, .. }) => {
                let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
                assert_eq!(names, vec!["sub", "a.png", "b.jpg", "notes.txt"]);
                assert!(entries[1].is_image);
                assert!(!entries[3].is_image);
            }
            None => panic!("browser should be open"),
        }

        // entries: [sub, a.png, b.jpg, notes.txt]; mark a.png and b.jpg
        app.overlay_next();
        app.overlay_select();
        app.overlay_next();
        app.overlay_select();
        app.overlay_next();
        app.overlay_select(); // notes.txt is not an image: ignored
        app.overlay_confirm();

        assert!(app.overlay.is_none());
        let names: Vec<&str> = app.session.files().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["a.png", "b.jpg"]);
    }

    #[test]
    fn browser_descends_and_goes_up() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("sub/c.png"), b"c").unwrap();

        let mut app = app_with(Ok(structured()));
        app.open_file_browser_at(dir.path().to_path_buf());
        app.overlay_select();
        assert_eq!(app.browser_dir(), Some(dir.path().join("sub").as_path()));
        app.overlay_go_up();
        assert_eq!(app.browser_dir(), Some(dir.path()));
    }

    #[test]
    fn refresh_browser_picks_up_new_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_with(Ok(structured()));
        app.open_file_browser_at(dir.path().to_path_buf());
        std::fs::write(dir.path().join("new.png"), b"n").unwrap();
        app.refresh_browser();
        match &app.overlay {
            Some(OverlayData::FileBrowser { entries, .. }) => assert_eq!(entries.len(), 1),
            None => panic!("browser should be open"),
        }
    }

    #[test]
    fn expand_paths_keeps_unmatched_patterns_literal() {
        let dir = tempfile::tempdir().unwrap();
        write_pngs(dir.path(), 2);
        let pattern = format!("{}/*.png", dir.path().display());
        let literal = format!("{}/nothing-*.jpg", dir.path().display());
        let paths = expand_paths(&[pattern, literal.clone()]);
        assert_eq!(paths.len(), 3);
        assert_eq!(paths[2], PathBuf::from(literal));
    }

    #[test]
    fn path_input_adds_files() {
        let dir = tempfile::tempdir().unwrap();
        let paths = write_pngs(dir.path(), 2);
        let mut app = app_with(Ok(structured()));
        app.start_path_input();
        app.input_buffer = format!("{} {}", paths[0].display(), paths[1].display());
        app.submit_path_input();
        assert_eq!(app.input_mode, InputMode::Normal);
        assert_eq!(app.session.files().len(), 2);
    }

    #[test]
    fn notification_clears_after_twenty_ticks() {
        let mut app = app_with(Ok(structured()));
        app.notify("hello");
        for _ in 0..20 {
            app.tick();
        }
        assert!(app.notification.is_some());
        app.tick();
        assert!(app.notification.is_none());
    }
}
