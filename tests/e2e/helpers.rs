use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

pub const DATA_HEADER: &str =
    "Hotel code,Code,Name,Country,Vat type current,Sub account current,Is subject to city tax current";

pub const STANDARD_CSV: &str = "\
Hotel code,Standard subaccount,Standard VAT,Standard City tax
AMS,108000,Reduced,Yes
RTM,108000,Reduced,Yes
LON,208000,Normal,No
";

pub struct TestProject {
    pub dir: TempDir,
    pub binary_path: String,
}

impl TestProject {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let binary_path = env!("CARGO_BIN_EXE_crpm-check").to_string();

        Self { dir, binary_path }
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.dir.path().join(relative)
    }

    pub fn write_file(&self, relative: &str, content: &str) {
        let path = self.path(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create fixture directory");
        }
        fs::write(path, content).expect("Failed to write fixture");
    }

    /// Copy a committed file from `tests/fixtures/` into the project.
    pub fn copy_fixture(&self, fixture: &str, relative: &str) {
        let source = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(fixture);
        let target = self.path(relative);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).expect("Failed to create fixture directory");
        }
        fs::copy(source, target).expect("Failed to copy fixture");
    }

    /// `data/rates.csv` with the given rows plus `data/standard.csv`.
    pub fn write_rates(&self, rows: &[&str]) {
        let mut data = String::from(DATA_HEADER);
        data.push('\n');
        for row in rows {
            data.push_str(row);
            data.push('\n');
        }
        self.write_file("data/rates.csv", &data);
        self.write_file("data/standard.csv", STANDARD_CSV);
    }

    pub fn run(&self, args: &[&str]) -> Output {
        Command::new(&self.binary_path)
            .args(args)
            .current_dir(self.dir.path())
            .env_remove("RUST_LOG")
            .output()
            .expect("Failed to run crpm-check")
    }

    /// Run `check` against `data/rates.csv` without opening a browser.
    pub fn run_check(&self, extra: &[&str]) -> Output {
        let mut args = vec!["check", "--input", "data/rates.csv", "--no-open"];
        args.extend_from_slice(extra);
        self.run(&args)
    }

    /// Files of the single timestamped run folder under `output/`.
    pub fn report_files(&self) -> Vec<String> {
        let runs: Vec<PathBuf> = read_dir(&self.path("output"));
        assert_eq!(runs.len(), 1, "expected exactly one run folder");

        let mut names: Vec<String> = read_dir(&runs[0])
            .iter()
            .map(|path| path.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        names.sort();
        names
    }

    /// Contents of the CSV report whose name starts with `prefix`.
    pub fn read_report(&self, prefix: &str) -> String {
        let runs = read_dir(&self.path("output"));
        let file = read_dir(&runs[0])
            .into_iter()
            .find(|path| {
                let name = path.file_name().unwrap().to_string_lossy();
                name.starts_with(prefix) && name.ends_with(".csv")
            })
            .unwrap_or_else(|| panic!("no report starting with {}", prefix));
        fs::read_to_string(file).unwrap()
    }
}

fn read_dir(path: &Path) -> Vec<PathBuf> {
    fs::read_dir(path)
        .unwrap_or_else(|_| panic!("missing directory {}", path.display()))
        .map(|entry| entry.unwrap().path())
        .collect()
}

pub fn dump(output: &Output) {
    eprintln!("STDOUT: {}", String::from_utf8_lossy(&output.stdout));
    eprintln!("STDERR: {}", String::from_utf8_lossy(&output.stderr));
}
