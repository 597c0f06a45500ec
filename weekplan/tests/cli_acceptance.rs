use std::ffi::OsString;
use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};
use tempfile::TempDir;
use weekplan_core::{extract_plan, Planner, SqliteStore, Weekday, WeeklySchedule};

struct CliTestEnv {
    _temp_dir: TempDir,
    home: PathBuf,
    xdg_data: PathBuf,
    xdg_config: PathBuf,
    xdg_state: PathBuf,
    xdg_runtime: PathBuf,
}

impl CliTestEnv {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let base = temp_dir.path().to_path_buf();
        let home = base.join("home");
        let xdg_data = base.join("xdg-data");
        let xdg_config = base.join("xdg-config");
        let xdg_state = base.join("xdg-state");
        let xdg_runtime = base.join("xdg-runtime");

        fs::create_dir_all(&home).expect("failed to create HOME");
        fs::create_dir_all(&xdg_data).expect("failed to create XDG_DATA_HOME");
        fs::create_dir_all(&xdg_config).expect("failed to create XDG_CONFIG_HOME");
        fs::create_dir_all(&xdg_state).expect("failed to create XDG_STATE_HOME");
        fs::create_dir_all(&xdg_runtime).expect("failed to create XDG_RUNTIME_DIR");

        Self {
            _temp_dir: temp_dir,
            home,
            xdg_data,
            xdg_config,
            xdg_state,
            xdg_runtime,
        }
    }

    fn store_path(&self) -> PathBuf {
        self.xdg_data.join("weekplan/store.db")
    }

    /// Store the recorded model reply as the current plan.
    fn seed_recorded_plan(&self) {
        let raw = fs::read_to_string(
            PathBuf::from(env!("CARGO_MANIFEST_DIR"))
                .join("../weekplan-core/tests/fixtures/model-response.txt"),
        )
        .expect("failed to read model response fixture");

        let store = SqliteStore::open(&self.store_path()).expect("failed to open store");
        let mut planner = Planner::load(store).expect("failed to load planner");
        let applied = planner
            .apply_generated_plan(extract_plan(&raw), None)
            .expect("failed to apply plan");
        assert!(applied, "recorded plan should apply");
    }

    fn planner(&self) -> Planner<SqliteStore> {
        let store = SqliteStore::open(&self.store_path()).expect("failed to open store");
        Planner::load(store).expect("failed to load planner")
    }
}

fn run_bin(env: &CliTestEnv, args: &[&str]) -> Output {
    let bin_path = PathBuf::from(assert_cmd::cargo::cargo_bin!("weekplan"));

    Command::new(bin_path)
        .args(args)
        .env("HOME", &env.home)
        .env("XDG_DATA_HOME", &env.xdg_data)
        .env("XDG_CONFIG_HOME", &env.xdg_config)
        .env("XDG_STATE_HOME", &env.xdg_state)
        .env("XDG_RUNTIME_DIR", &env.xdg_runtime)
        .env("TZ", "UTC")
        .env_remove("WEEKPLAN_CALENDAR_TOKEN")
        .env_remove("RUST_LOG")
        .output()
        .unwrap_or_else(|e| panic!("failed to execute weekplan: {e}"))
}

fn render(args: &[&str]) -> String {
    args.iter()
        .map(|arg| OsString::from(arg).to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join(" ")
}

fn assert_success(args: &[&str], output: &Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    if output.status.success() {
        return stdout;
    }

    let stderr = String::from_utf8_lossy(&output.stderr);
    panic!(
        "weekplan {} failed\nstatus: {}\nstdout:\n{}\nstderr:\n{}",
        render(args),
        output.status,
        stdout,
        stderr
    );
}

fn assert_failure(args: &[&str], output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
    assert!(
        !output.status.success(),
        "weekplan {} should have failed\nstdout:\n{}",
        render(args),
        String::from_utf8_lossy(&output.stdout)
    );
    stderr
}

fn run_ok(env: &CliTestEnv, args: &[&str]) -> String {
    let output = run_bin(env, args);
    assert_success(args, &output)
}

#[test]
fn goal_and_preferences_are_persisted() {
    let env = CliTestEnv::new();

    let stdout = run_ok(&env, &["goal", "Finish", "my", "novel"]);
    assert!(stdout.contains("Goal set: Finish my novel"));

    run_ok(&env, &["prefs", "set", "chronotype=early_bird", "sleep=8h"]);
    let stdout = run_ok(&env, &["prefs", "show"]);
    assert!(stdout.contains("goal = Finish my novel"), "got:\n{stdout}");
    assert!(stdout.contains("chronotype = early_bird"));
    assert!(stdout.contains("sleep = 8h"));

    run_ok(&env, &["prefs", "unset", "sleep"]);

    let planner = env.planner();
    assert_eq!(planner.goal(), "Finish my novel");
    assert_eq!(planner.preferences().len(), 1);

    let args = ["prefs", "set", "no-equals-sign"];
    let stderr = assert_failure(&args, &run_bin(&env, &args));
    assert!(stderr.contains("expected key=value"), "got:\n{stderr}");

    assert!(
        env.xdg_state.join("weekplan").exists(),
        "log directory should be created under XDG_STATE_HOME"
    );
}

#[test]
fn commitments_are_filed_under_each_day() {
    let env = CliTestEnv::new();

    let stdout = run_ok(
        &env,
        &[
            "commit", "add", "Cafe shift", "--start", "9:00 AM", "--end", "5:00 PM", "--on",
            "Monday,Thursday",
        ],
    );
    assert!(stdout.contains("Added commitment"));

    run_ok(
        &env,
        &[
            "commit", "add", "Dentist", "--day", "friday", "--start", "3:00 PM", "--end",
            "4:00 PM", "--type", "personal", "--recurrence", "once",
        ],
    );

    let listing = run_ok(&env, &["commit", "list"]);
    assert!(listing.contains("Monday"));
    assert!(listing.contains("Thursday"));
    assert!(listing.contains("Dentist"));
    assert!(listing.contains("(personal, once)"));
    assert!(!listing.contains("Tuesday"));

    let planner = env.planner();
    let commitments = planner.commitments();
    assert_eq!(commitments.day(Weekday::Monday).len(), 1);
    assert_eq!(commitments.day(Weekday::Thursday).len(), 1);
    assert_eq!(
        commitments.day(Weekday::Monday)[0].id,
        commitments.day(Weekday::Thursday)[0].id
    );
    let shift_id = commitments.day(Weekday::Monday)[0].id.clone();
    drop(planner);

    run_ok(&env, &["commit", "rm", "Monday", &shift_id]);
    let planner = env.planner();
    assert!(planner.commitments().day(Weekday::Monday).is_empty());
    assert_eq!(planner.commitments().day(Weekday::Thursday).len(), 1);
    drop(planner);

    let args = ["commit", "add", "Gym", "--day", "Monday", "--start", "25:00", "--end", "9:00 PM"];
    let stderr = assert_failure(&args, &run_bin(&env, &args));
    assert!(stderr.contains("invalid time"), "got:\n{stderr}");

    run_ok(&env, &["commit", "clear"]);
    let listing = run_ok(&env, &["commit", "list"]);
    assert!(listing.contains("No commitments"));
}

#[test]
fn task_edits_update_the_stored_plan() {
    let env = CliTestEnv::new();
    env.seed_recorded_plan();

    let monday = run_ok(&env, &["show", "--day", "Monday"]);
    assert!(monday.contains("[0] 09:00 AM - 10:00 AM"), "got:\n{monday}");
    assert!(monday.contains("Read craft book"));

    let stdout = run_ok(
        &env,
        &["task", "add", "Monday", "Stretch", "--time", "06:00 AM - 06:30 AM"],
    );
    // Days are ordered by the start time's text, so 07:00 PM sorts before 09:00 AM
    assert!(stdout.contains("[0] 06:00 AM - 06:30 AM"), "got:\n{stdout}");
    assert!(stdout.contains("[1] 07:00 PM - 07:30 PM"));
    assert!(stdout.contains("[2] 09:00 AM - 10:00 AM"));

    let stdout = run_ok(
        &env,
        &["task", "edit", "Monday", "2", "--task", "Outline chapter 4"],
    );
    assert!(stdout.contains("Outline chapter 4"));

    let stdout = run_ok(&env, &["task", "rm", "Monday", "1"]);
    assert!(!stdout.contains("Read craft book"));

    let args = ["task", "rm", "Monday", "2"];
    let stderr = assert_failure(&args, &run_bin(&env, &args));
    assert!(stderr.contains("no task at index 2 on Monday"), "got:\n{stderr}");

    let json = run_ok(&env, &["show", "--json"]);
    let week: WeeklySchedule = serde_json::from_str(&json).expect("show --json should be JSON");
    let monday = week.day(Weekday::Monday);
    assert_eq!(monday.len(), 2);
    assert_eq!(monday[1].task, "Outline chapter 4");
    assert_eq!(monday[1].description, "Beat sheet for chapter 3");

    let planner = env.planner();
    assert_eq!(planner.schedule(), &week);
}

#[test]
fn today_shows_buckets_challenge_and_upcoming() {
    let env = CliTestEnv::new();
    env.seed_recorded_plan();

    let monday = run_ok(&env, &["today", "--day", "Monday"]);
    assert!(monday.contains("Here is your Monday"), "got:\n{monday}");
    assert!(monday.contains("Morning"));
    assert!(monday.contains("Evening"));
    assert!(monday.contains("Today's challenge: Write before checking email"));
    assert!(monday.contains("Finish chapter 3 outline"));
    assert!(monday.contains("\"Stop mid-sentence so tomorrow starts easily\""));
    assert!(monday.contains("Learning resources"));
    assert!(monday.contains("On Writing"));
    assert!(monday.contains("Peak hours: 7-10 AM"));
    assert!(monday.contains("Focus areas"));
    assert!(monday.contains("Weekly word count"));

    let sunday = run_ok(&env, &["today", "--day", "sunday"]);
    assert!(sunday.contains("Coming up tomorrow"));
    assert!(sunday.contains("Outline chapter"));

    let friday = run_ok(&env, &["today", "--day", "Friday"]);
    assert!(friday.contains("Unscheduled"), "got:\n{friday}");
    assert!(friday.contains("Flexible catch-up"));
}

#[test]
fn generate_and_export_need_configuration() {
    let env = CliTestEnv::new();

    let args = ["generate"];
    let stderr = assert_failure(&args, &run_bin(&env, &args));
    assert!(stderr.contains("no goal set"), "got:\n{stderr}");

    run_ok(&env, &["goal", "Run a 10k"]);
    let stderr = assert_failure(&args, &run_bin(&env, &args));
    assert!(stderr.contains("no [llm] section"), "got:\n{stderr}");

    let args = ["export"];
    let stderr = assert_failure(&args, &run_bin(&env, &args));
    assert!(stderr.contains("access_token"), "got:\n{stderr}");

    fs::create_dir_all(env.xdg_config.join("weekplan")).unwrap();
    fs::write(
        env.xdg_config.join("weekplan/config.toml"),
        "[calendar]\ntime_zone = \"Mars/Olympus_Mons\"\n",
    )
    .unwrap();
    let args = ["show"];
    let stderr = assert_failure(&args, &run_bin(&env, &args));
    assert!(stderr.contains("failed to load configuration"), "got:\n{stderr}");
}
