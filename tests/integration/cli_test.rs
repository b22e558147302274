use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

fn get_binary_path() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_smti"))
}

fn run(args: &[&str]) -> Output {
    Command::new(get_binary_path())
        .args(args)
        .output()
        .expect("Failed to execute smti")
}

fn run_ok(args: &[&str]) -> String {
    let output = run(args);
    if !output.status.success() {
        panic!(
            "Command {:?} failed with status: {:?}\nstderr: {}\nstdout: {}",
            args,
            output.status,
            String::from_utf8_lossy(&output.stderr),
            String::from_utf8_lossy(&output.stdout)
        );
    }
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn write_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).expect("Failed to write test file");
    path
}

fn arg(path: &Path) -> &str {
    path.to_str().expect("temp path is not UTF-8")
}

/// Four agents per side with ties; every maximum stable matching is perfect
/// and pairs left 3 with right 4.
const TIES: &str = "\
4
4
1: 3 [1 2] 4
2: [1 3] 2
3: 2 1 [3 4]
4: [1 2 3]
1: [2 3] [1 4]
2: 1 [3 4] 2
3: [1 2 3 4]
4: 3 1
";

/// Both sides rank 1 before 2 in opposite order, so only 1-1 and 2-2 survive
/// preprocessing.
const CROSSED: &str = "\
2
2
1: 1 2
2: 2 1
1: 1 2
2: 2 1
";

const MASTER: &str = "\
3
3
1: 1 2 3
2: 1 2 3
3: 1 2 3
1: 1 2 3
2: 1 2 3
3: 1 2 3
";

#[test]
fn test_help_lists_subcommands() {
    let stdout = run_ok(&["--help"]);
    for command in ["generate", "preprocess", "solve", "encode"] {
        assert!(stdout.contains(command), "help should mention {}", command);
    }
}

#[test]
fn test_generate_is_reproducible() {
    let args = ["generate", "--size", "6", "--pref-length", "3", "--seed", "11"];
    let first = run_ok(&args);
    let second = run_ok(&args);
    assert_eq!(first, second);

    let lines: Vec<&str> = first.lines().collect();
    assert_eq!(lines[0], "6");
    assert_eq!(lines[1], "6");
    assert_eq!(lines.len(), 14);
}

#[test]
fn test_generate_then_solve() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("random.txt");
    let stdout = run_ok(&[
        "generate", "--size", "8", "--pref-length", "4", "--seed", "2", "--output", arg(&path),
    ]);
    assert!(stdout.is_empty());
    assert!(path.exists());

    let stdout = run_ok(&["solve", arg(&path)]);
    assert!(
        stdout.contains("Maximum stable matching size:"),
        "unexpected output: {}",
        stdout
    );
}

#[test]
fn test_generate_rejects_long_lists() {
    let output = run(&["generate", "--size", "3", "--pref-length", "4"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("exceeds instance size"));
}

#[test]
fn test_solve_ties_both_formulations() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "ties.txt", TIES);
    for formulation in ["single", "merged"] {
        let stdout = run_ok(&["solve", arg(&path), "--formulation", formulation]);
        assert!(stdout.contains("Maximum stable matching size: 4"), "{}", stdout);
        assert!(stdout.contains("(3, 4)"));
    }
}

#[test]
fn test_solve_with_preprocessing() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "ties.txt", TIES);
    for mode in ["quick", "complete"] {
        let stdout = run_ok(&["solve", arg(&path), "--preprocess", mode]);
        assert!(stdout.contains("Maximum stable matching size: 4"), "{}", stdout);
    }
}

#[test]
fn test_solve_force_and_avoid() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "ties.txt", TIES);

    let stdout = run_ok(&["solve", arg(&path), "--force", "1:2", "--force", "3:4"]);
    assert!(stdout.contains("(1, 2)"));
    assert!(stdout.contains("(3, 4)"));

    let stdout = run_ok(&["solve", arg(&path), "--avoid", "3:4"]);
    assert!(!stdout.contains("(3, 4)"));
    assert!(!stdout.contains("size: 4"));
}

#[test]
fn test_solve_rejects_unknown_pair() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "crossed.txt", CROSSED);
    let output = run(&["solve", arg(&path), "--force", "1:9"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("not a compatible pair"));

    let output = run(&["solve", arg(&path), "--force", "1-2"]);
    assert!(!output.status.success());
}

#[test]
fn test_solve_all_enumerates() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "master.txt", MASTER);
    let stdout = run_ok(&["solve", arg(&path), "--all"]);
    assert!(stdout.contains("Matching 1 (size 3): (1, 1) (2, 2) (3, 3)"));
    assert!(stdout.contains("Found 1 stable matchings"));
}

#[test]
fn test_solve_hides_dummies() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "master.txt", MASTER);
    let stdout = run_ok(&["solve", arg(&path), "--dummies", "2"]);
    assert!(!stdout.contains("(4,"));
    assert!(!stdout.contains(", 5)"));
}

#[test]
fn test_solve_score_matrix() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "scores.grp", "3\n3\n5 3 1\n1 5 3\n3 1 5\n");
    let stdout = run_ok(&["solve", arg(&path), "--grp"]);
    assert!(stdout.contains("Maximum stable matching size: 3"), "{}", stdout);
    assert!(stdout.contains("(0, 0) (1, 1) (2, 2)"));

    let stdout = run_ok(&["solve", arg(&path), "--grp", "--threshold", "5"]);
    assert!(stdout.contains("Maximum stable matching size: 3"));
}

#[test]
fn test_preprocess_output() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "crossed.txt", CROSSED);

    let stdout = run_ok(&["preprocess", arg(&path), "--style", "plain"]);
    assert_eq!(stdout, "2\n2\n1 1\n2 2\n1 1\n2 2\n");

    let out = dir.path().join("reduced.txt");
    let stdout = run_ok(&["preprocess", arg(&path), "--output", arg(&out)]);
    assert!(stdout.contains("Removed 2 pairs"), "{}", stdout);
    assert_eq!(fs::read_to_string(&out).unwrap(), "2\n2\n1: 1\n2: 2\n1: 1\n2: 2\n");
}

#[test]
fn test_encode_formats() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "crossed.txt", CROSSED);

    let stdout = run_ok(&["encode", arg(&path), "--format", "sat"]);
    assert!(stdout.starts_with("p cnf 12 36\n"));
    let stdout = run_ok(&["encode", arg(&path), "--format", "wpmaxsat"]);
    assert!(stdout.starts_with("p wcnf 12 36 5\n"));
    let stdout = run_ok(&["encode", arg(&path), "--format", "pbo-merged"]);
    assert!(stdout.starts_with("* #variable= 16 #constraint= 17\n"));
    let stdout = run_ok(&["encode", arg(&path), "--format", "minizinc-opt"]);
    assert!(stdout.contains("solve maximize"));

    let out = dir.path().join("crossed.opb");
    run_ok(&["encode", arg(&path), "--format", "pbo", "--output", arg(&out)]);
    let written = fs::read_to_string(&out).unwrap();
    assert!(written.starts_with("* #variable= 8 #constraint= 9\n"));
}

#[test]
fn test_parse_error_is_reported() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "broken.txt", "1\n1\n1: [1\n1: 1\n");
    let output = run(&["solve", arg(&path)]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("broken.txt:3:4: unclosed tie group"), "{}", stderr);
}

#[test]
fn test_missing_file() {
    let output = run(&["encode", "/nonexistent/instance.txt", "--format", "sat"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("failed to read file"));
}
