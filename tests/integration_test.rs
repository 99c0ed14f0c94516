use image::{ImageFormat, RgbImage};
use raw_backfill::error::ConversionError;
use raw_backfill::utils::logging;
use raw_backfill::{App, Config, Converter, ConverterExit, RawFile, RunStats};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// 假转换程序：目录名在 `broken` 中的批次启动失败
#[derive(Default)]
struct FakeConverter {
    broken: Vec<&'static str>,
    calls: Mutex<Vec<Vec<PathBuf>>>,
}

impl FakeConverter {
    fn failing_in(broken: Vec<&'static str>) -> Self {
        Self {
            broken,
            ..Self::default()
        }
    }

    fn calls(&self) -> Vec<Vec<PathBuf>> {
        self.calls.lock().unwrap().clone()
    }
}

impl Converter for FakeConverter {
    fn convert(
        &self,
        files: &[RawFile],
    ) -> impl Future<Output = Result<ConverterExit, ConversionError>> + Send {
        self.calls
            .lock()
            .unwrap()
            .push(files.iter().map(|f| f.path().to_path_buf()).collect());

        let dir_name = files
            .first()
            .and_then(|f| f.path().parent())
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let result = if self.broken.iter().any(|b| *b == dir_name) {
            Err(ConversionError::Launch {
                program: PathBuf::from("ufraw-batch"),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
            })
        } else {
            Ok(ConverterExit::ok())
        };
        std::future::ready(result)
    }
}

/// 慢转换程序：记录同时进行中的调用数峰值
struct SlowConverter {
    delay: Duration,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl SlowConverter {
    fn new(delay: Duration) -> Self {
        Self {
            delay,
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }
}

impl Converter for SlowConverter {
    fn convert(
        &self,
        _files: &[RawFile],
    ) -> impl Future<Output = Result<ConverterExit, ConversionError>> + Send {
        async move {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(ConverterExit::ok())
        }
    }
}

struct Tree {
    _photos: tempfile::TempDir,
    _journal: tempfile::TempDir,
    root: PathBuf,
    config: Config,
}

impl Tree {
    /// root/
    ///   trip/   a.cr2 + a.jpg（高分辨率）
    ///   trip2/  b.nef
    ///   broken/ c.cr2
    fn build() -> Self {
        let photos = tempfile::tempdir().unwrap();
        let journal = tempfile::tempdir().unwrap();
        let root = std::fs::canonicalize(photos.path()).unwrap();

        let trip = root.join("trip");
        std::fs::create_dir_all(&trip).unwrap();
        std::fs::write(trip.join("a.cr2"), b"raw").unwrap();
        RgbImage::new(30, 20)
            .save_with_format(trip.join("a.jpg"), ImageFormat::Jpeg)
            .unwrap();

        let trip2 = root.join("trip2");
        std::fs::create_dir_all(&trip2).unwrap();
        std::fs::write(trip2.join("b.nef"), b"raw").unwrap();

        let broken = root.join("broken");
        std::fs::create_dir_all(&broken).unwrap();
        std::fs::write(broken.join("c.cr2"), b"raw").unwrap();

        let config = Config {
            photo_root_dir: root.clone(),
            journal_dir: journal.path().to_path_buf(),
            low_res_threshold: 20,
            ..Config::default()
        };

        Self {
            _photos: photos,
            _journal: journal,
            root,
            config,
        }
    }

    fn key(&self, name: &str) -> String {
        self.root.join(name).display().to_string()
    }

    fn lines(&self, file: &str) -> Vec<String> {
        read_lines(&self.config.journal_dir.join(file))
    }
}

fn read_lines(path: &Path) -> Vec<String> {
    std::fs::read_to_string(path)
        .map(|s| s.lines().map(str::to_string).collect())
        .unwrap_or_default()
}

#[tokio::test]
async fn test_full_run_then_resume() {
    logging::init();
    let tree = Tree::build();

    // 第一次运行：broken 转换失败
    let converter = FakeConverter::failing_in(vec!["broken"]);
    let app = App::with_converter(tree.config.clone(), converter).await.unwrap();
    let stats = app.run().await.unwrap();

    assert_eq!(
        stats,
        RunStats {
            directories: 4,
            pending_files: 2,
            converted: 1,
            failed: 1,
            already_complete: 2,
        }
    );

    let succeeded = tree.lines("success.list");
    assert!(succeeded.contains(&tree.key("trip")));
    assert!(succeeded.contains(&tree.key("trip2")));
    assert!(succeeded.contains(&tree.root.display().to_string()));
    assert!(!succeeded.contains(&tree.key("broken")));
    assert_eq!(tree.lines("failed.list"), vec![tree.key("broken")]);

    let log = std::fs::read_to_string(app.ledger().activity_log_path()).unwrap();
    assert!(log.contains("Starting..."));
    assert!(log.contains(&format!("SUCCESS: {} [files: 1]", tree.key("trip2"))));
    assert!(log.contains(&format!("ERROR: {}", tree.key("broken"))));
    assert!(log.contains("Done!"));
    assert!(log.contains(&format!("SUCCESS: {} [no files converted]", tree.key("trip"))));
    assert!(log.contains(&format!(
        "SUCCESS: {} [no files converted]",
        tree.root.display()
    )));

    // 第二次运行：只重试 broken
    let app = App::with_converter(tree.config.clone(), FakeConverter::default())
        .await
        .unwrap();
    let stats = app.run().await.unwrap();

    assert_eq!(stats.pending_files, 1);
    assert_eq!(stats.converted, 1);
    assert_eq!(stats.failed, 0);

    let converter_calls = app_calls(&app);
    assert_eq!(converter_calls, vec![vec![tree.root.join("broken").join("c.cr2")]]);

    let succeeded = tree.lines("success.list");
    assert!(succeeded.contains(&tree.key("broken")));
    let trip2_hits = succeeded.iter().filter(|l| **l == tree.key("trip2")).count();
    assert_eq!(trip2_hits, 2);
}

#[tokio::test]
async fn test_dry_run_touches_nothing() {
    let tree = Tree::build();
    let config = Config {
        dry_run: true,
        delete_raw_after_convert: true,
        delete_raw_on_high_res_jpg: true,
        ..tree.config.clone()
    };

    let app = App::with_converter(config, FakeConverter::default()).await.unwrap();
    let stats = app.run().await.unwrap();

    assert_eq!(stats.failed, 0);
    assert!(app_calls(&app).is_empty());
    assert!(tree.root.join("trip/a.cr2").exists());
    assert!(tree.root.join("trip2/b.nef").exists());
    assert!(tree.root.join("broken/c.cr2").exists());
}

#[tokio::test]
async fn test_missing_root_completes_without_work() {
    let journal = tempfile::tempdir().unwrap();
    let config = Config {
        photo_root_dir: journal.path().join("no-such-photos"),
        journal_dir: journal.path().join("journal"),
        ..Config::default()
    };

    let app = App::with_converter(config, FakeConverter::default()).await.unwrap();
    let stats = app.run().await.unwrap();

    assert_eq!(stats, RunStats::default());
    assert!(journal.path().join("journal/conversion.log").exists());
    assert!(read_lines(&journal.path().join("journal/success.list")).is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_directory_conversions_respect_pool_size() {
    let photos = tempfile::tempdir().unwrap();
    let journal = tempfile::tempdir().unwrap();
    let root = std::fs::canonicalize(photos.path()).unwrap();
    for i in 0..6 {
        let dir = root.join(format!("album{i}"));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("a.cr2"), b"raw").unwrap();
    }

    let config = Config {
        photo_root_dir: root,
        journal_dir: journal.path().to_path_buf(),
        ..Config::default()
    };
    let pool_size = config.convert_pool_size;

    let converter = SlowConverter::new(Duration::from_millis(100));
    let app = App::with_converter(config, converter).await.unwrap();
    let stats = app.run().await.unwrap();

    assert_eq!(stats.converted, 6);
    assert_eq!(stats.failed, 0);
    assert_eq!(app.converter().peak.load(Ordering::SeqCst), pool_size);
    assert_eq!(app.converter().in_flight.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_invalid_config_is_rejected() {
    let config = Config {
        convert_pool_size: 0,
        ..Config::default()
    };
    assert!(App::with_converter(config, FakeConverter::default()).await.is_err());
}

fn app_calls(app: &App<FakeConverter>) -> Vec<Vec<PathBuf>> {
    app.converter().calls()
}
