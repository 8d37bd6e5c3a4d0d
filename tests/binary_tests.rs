use std::fs;
use std::path::PathBuf;
use std::process::Command;

/// A scratch directory unique to one test.
fn scratch_directory(name: &str) -> PathBuf {
    let directory = std::env::temp_dir().join(format!("rpncalc_bin_{}_{}", name, std::process::id()));

    fs::create_dir_all(&directory).unwrap();
    directory
}

// Run the calculator binary on a batch file with the data path pointed at `directory`.
fn run_batch(directory: &PathBuf, batch: &str) -> String {
    fs::write(directory.join("batch.txt"), batch).unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_rpncalc"))
        .arg("batch.txt")
        .env("RPNCALC_DATA_PATH", directory)
        .output()
        .expect("Failed to run calculator");

    assert!(output.status.success(), "calculator failed: {:?}", output);
    String::from_utf8_lossy(&output.stdout).to_string()
}

#[test]
fn batch_runs_save_the_config_in_the_data_directory() {
    let directory = scratch_directory("save");
    let _ = fs::remove_file(directory.join("config.txt"));

    let output = run_batch(&directory, "3 4 +\n");

    assert!(output.contains("Running batch: batch.txt"));
    assert!(directory.join("config.txt").is_file());
}

#[test]
fn config_is_written_back_to_the_file_it_came_from() {
    let directory = scratch_directory("origin");
    let elsewhere = scratch_directory("elsewhere");
    let _ = fs::remove_file(elsewhere.join("config.txt"));

    fs::write(
        directory.join("config.txt"),
        format!(
            "recursion_limit = 7\npath_to_data_and_programs = {}\n",
            elsewhere.to_string_lossy()
        ),
    )
    .unwrap();

    run_batch(&directory, "1 2 +\n");

    let saved = fs::read_to_string(directory.join("config.txt")).unwrap();

    assert!(saved.contains("recursion_limit = 7"));
    assert!(!elsewhere.join("config.txt").exists());
}
